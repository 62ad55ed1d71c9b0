//! Secondary table of mounted filesystems.

use log::warn;
use serde::Serialize;
use std::any::Any;

use super::field_widths::Field;
use super::table::{PanelHandle, ScanContext, Table};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiskRow {
    pub name: String,
    /// Row identity
    pub mount_point: String,
    pub fs_type: String,
    pub total_bytes: u64,
    pub available_bytes: u64,
    #[serde(skip)]
    updated: bool,
}

impl DiskRow {
    pub fn new<S: Into<String>>(mount_point: S, total_bytes: u64, available_bytes: u64) -> Self {
        Self {
            name: String::new(),
            mount_point: mount_point.into(),
            fs_type: String::new(),
            total_bytes,
            available_bytes,
            updated: false,
        }
    }

    pub fn used_bytes(&self) -> u64 {
        self.total_bytes.saturating_sub(self.available_bytes)
    }

    pub fn usage_percent(&self) -> f32 {
        if self.total_bytes > 0 {
            (self.used_bytes() as f64 * 100.0 / self.total_bytes as f64) as f32
        } else {
            0.0
        }
    }
}

/// Collection layer feeding the disk table
pub trait DiskSource {
    fn sample(&mut self) -> Result<Vec<DiskRow>>;
}

pub struct DiskTable {
    rows: Vec<DiskRow>,
    source: Box<dyn DiskSource>,
    panel: Option<PanelHandle>,
}

impl DiskTable {
    pub fn new(source: Box<dyn DiskSource>) -> Self {
        Self {
            rows: Vec::new(),
            source,
            panel: None,
        }
    }

    pub fn rows(&self) -> &[DiskRow] {
        &self.rows
    }
}

impl Table for DiskTable {
    fn name(&self) -> &str {
        "disks"
    }

    fn prepare(&mut self) {
        for row in &mut self.rows {
            row.updated = false;
        }
    }

    fn iterate(&mut self, ctx: &mut ScanContext<'_>) {
        let samples = match self.source.sample() {
            Ok(samples) => samples,
            Err(e) => {
                warn!("Disk collection failed, keeping previous rows: {}", e);
                for row in &mut self.rows {
                    row.updated = true;
                }
                return;
            }
        };

        for mut sample in samples {
            ctx.update_field_width(Field::MountPoint, sample.mount_point.chars().count());
            sample.updated = true;
            match self
                .rows
                .iter_mut()
                .find(|row| row.mount_point == sample.mount_point)
            {
                Some(row) => *row = sample,
                None => self.rows.push(sample),
            }
        }
    }

    fn cleanup(&mut self) {
        self.rows.retain(|row| row.updated);
    }

    fn set_panel(&mut self, panel: PanelHandle) {
        self.panel = Some(panel);
    }

    fn panel(&self) -> Option<&PanelHandle> {
        self.panel.as_ref()
    }

    fn len(&self) -> usize {
        self.rows.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
