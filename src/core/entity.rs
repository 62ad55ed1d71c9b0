//! Process-like rows tracked by the primary table.

use serde::Serialize;

/// Parent id used by rows without a parent
pub const NO_PARENT: u32 = 0;

/// One monitored process
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entity {
    pub id: u32,
    /// Looked up by value each cycle; may name an id that no longer exists
    pub parent: u32,
    pub user_id: u32,
    pub name: String,
    /// Resident memory in bytes as reported by the collection layer
    pub resident: u64,
    /// Resident memory of this row and all its descendants, `None` until
    /// the accumulation pass of the current cycle resolved it
    pub(crate) acc_resident: Option<u64>,
    #[serde(skip)]
    pub(crate) updated: bool,
}

impl Entity {
    pub fn new(id: u32, parent: u32, resident: u64) -> Self {
        Self {
            id,
            parent,
            user_id: 0,
            name: String::new(),
            resident,
            acc_resident: None,
            updated: false,
        }
    }

    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_user_id(mut self, user_id: u32) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn accumulated_resident(&self) -> Option<u64> {
        self.acc_resident
    }

    /// Accumulated value when resolved, raw value otherwise
    pub fn accumulated_or_raw(&self) -> u64 {
        self.acc_resident.unwrap_or(self.resident)
    }

    pub fn is_updated(&self) -> bool {
        self.updated
    }

    /// Copy the collected values of `sample` into this row.
    pub(crate) fn refresh_from(&mut self, sample: ProcessSample) {
        self.parent = sample.parent;
        self.user_id = sample.user_id;
        self.name = sample.name;
        self.resident = sample.resident;
        self.updated = true;
    }
}

/// Raw values delivered by a collection pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSample {
    pub id: u32,
    pub parent: u32,
    pub user_id: u32,
    pub name: String,
    pub resident: u64,
}

impl From<ProcessSample> for Entity {
    fn from(sample: ProcessSample) -> Self {
        let mut entity = Entity::new(sample.id, NO_PARENT, 0);
        entity.refresh_from(sample);
        entity
    }
}
