//! Column width aggregates for the row layout.

use serde::Serialize;
use std::collections::BTreeMap;

pub const MIN_PID_DIGITS: usize = 5;
pub const MAX_PID_DIGITS: usize = 19;
pub const MIN_UID_DIGITS: usize = 5;
pub const MAX_UID_DIGITS: usize = 20;

/// Widths wider than this are clamped
pub const MAX_FIELD_WIDTH: usize = u8::MAX as usize;

/// Columns whose width follows their content
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Field {
    Command,
    User,
    MountPoint,
}

impl Field {
    pub const AUTO_WIDTH: [Field; 3] = [Field::Command, Field::User, Field::MountPoint];

    pub fn title(self) -> &'static str {
        match self {
            Field::Command => "Command",
            Field::User => "USER",
            Field::MountPoint => "MOUNT",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldWidths {
    pid_digits: usize,
    uid_digits: usize,
    widths: BTreeMap<Field, usize>,
}

impl FieldWidths {
    pub fn new() -> Self {
        let mut widths = Self {
            pid_digits: MIN_PID_DIGITS,
            uid_digits: MIN_UID_DIGITS,
            widths: BTreeMap::new(),
        };
        widths.reset();
        widths
    }

    /// Return every auto-width field to the width of its title.
    pub fn reset(&mut self) {
        for field in Field::AUTO_WIDTH {
            self.widths.insert(field, field.title().len());
        }
    }

    pub fn set_pid_column_width(&mut self, max_pid: u64) {
        self.pid_digits = digits_for(max_pid, MIN_PID_DIGITS, MAX_PID_DIGITS);
    }

    pub fn set_uid_column_width(&mut self, max_uid: u64) {
        self.uid_digits = digits_for(max_uid, MIN_UID_DIGITS, MAX_UID_DIGITS);
    }

    /// Grow `field` to at least `width`.
    pub fn update_field_width(&mut self, field: Field, width: usize) {
        let width = width.min(MAX_FIELD_WIDTH);
        let entry = self.widths.entry(field).or_insert(0);
        if width > *entry {
            *entry = width;
        }
    }

    pub fn pid_digits(&self) -> usize {
        self.pid_digits
    }

    pub fn uid_digits(&self) -> usize {
        self.uid_digits
    }

    pub fn width(&self, field: Field) -> usize {
        self.widths
            .get(&field)
            .copied()
            .unwrap_or_else(|| field.title().len())
    }
}

impl Default for FieldWidths {
    fn default() -> Self {
        Self::new()
    }
}

fn digits_for(max: u64, min_digits: usize, max_digits: usize) -> usize {
    let digits = max.checked_ilog10().map_or(1, |log| log as usize + 1);
    digits.clamp(min_digits, max_digits)
}
