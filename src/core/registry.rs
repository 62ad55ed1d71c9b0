//! Registry of the distinct tables behind the configured views.

use super::table::TableRef;

/// Ordered, duplicate-free list of tables plus the active one
#[derive(Debug, Default)]
pub struct TableRegistry {
    tables: Vec<TableRef>,
    active: Option<usize>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `table` unless it is already registered.
    ///
    /// Returns `true` when the table was new. The check is linear; the
    /// registry only ever holds one entry per configured view.
    pub fn add(&mut self, table: TableRef) -> bool {
        if self.position(&table).is_some() {
            return false;
        }
        self.tables.push(table);
        true
    }

    pub fn position(&self, table: &TableRef) -> Option<usize> {
        self.tables.iter().position(|t| t.same_table(table))
    }

    /// Mark `table` as active, registering it first if needed.
    pub fn set_active(&mut self, table: TableRef) {
        self.add(table.clone());
        self.active = self.position(&table);
    }

    pub fn active(&self) -> Option<&TableRef> {
        self.active.and_then(|idx| self.tables.get(idx))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TableRef> {
        self.tables.iter()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Drop every entry. Shared tables live on in their owners.
    pub fn clear(&mut self) {
        self.tables.clear();
        self.active = None;
    }
}
