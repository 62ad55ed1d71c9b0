//! Tables and the three-phase scan protocol.
//!
//! Every table kind is refreshed with `prepare`, `iterate` and `cleanup`,
//! in that order, once per cycle. The primary [`ProcessTable`] is owned by
//! the machine; other tables are shared through a [`TableHandle`].

use log::{debug, warn};
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::accumulate::{accumulate_resident, AccumulationReport};
use super::clock::{Realtime, ScanClock};
use super::entity::{Entity, ProcessSample};
use super::field_widths::{Field, FieldWidths};
use super::users::UsersTable;
use crate::error::Result;

/// Opaque handle to the UI panel displaying a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelHandle(u64);

impl PanelHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Shared, non-owning reference to a table kept alive by the settings
pub type TableHandle = Rc<RefCell<dyn Table>>;

/// Which table a view or registry slot points at
#[derive(Clone)]
pub enum TableRef {
    /// The process table owned by the machine
    Primary,
    /// A table owned by the settings
    Shared(TableHandle),
}

impl TableRef {
    pub fn shared<T: Table + 'static>(table: T) -> Self {
        TableRef::Shared(Rc::new(RefCell::new(table)))
    }

    /// Identity comparison, never structural
    pub fn same_table(&self, other: &TableRef) -> bool {
        match (self, other) {
            (TableRef::Primary, TableRef::Primary) => true,
            (TableRef::Shared(a), TableRef::Shared(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn is_primary(&self) -> bool {
        matches!(self, TableRef::Primary)
    }
}

impl std::fmt::Debug for TableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableRef::Primary => f.write_str("Primary"),
            TableRef::Shared(handle) => match handle.try_borrow() {
                Ok(table) => write!(f, "Shared({})", table.name()),
                Err(_) => f.write_str("Shared(<in use>)"),
            },
        }
    }
}

/// Cycle state handed to every table while it iterates
pub struct ScanContext<'a> {
    clock: &'a ScanClock,
    users: &'a UsersTable,
    max_user_id: &'a mut u32,
    field_widths: &'a mut FieldWidths,
}

impl<'a> ScanContext<'a> {
    pub fn new(
        clock: &'a ScanClock,
        users: &'a UsersTable,
        max_user_id: &'a mut u32,
        field_widths: &'a mut FieldWidths,
    ) -> Self {
        Self {
            clock,
            users,
            max_user_id,
            field_widths,
        }
    }

    pub fn monotonic_ms(&self) -> u64 {
        self.clock.monotonic_ms()
    }

    pub fn prev_monotonic_ms(&self) -> u64 {
        self.clock.prev_monotonic_ms()
    }

    pub fn realtime(&self) -> Realtime {
        self.clock.realtime()
    }

    pub fn user_name(&self, uid: u32) -> Option<&str> {
        self.users.get(uid)
    }

    /// Raise the cycle's largest user id to at least `uid`.
    pub fn observe_user_id(&mut self, uid: u32) {
        if uid > *self.max_user_id {
            *self.max_user_id = uid;
        }
    }

    pub fn max_user_id(&self) -> u32 {
        *self.max_user_id
    }

    pub fn update_field_width(&mut self, field: Field, width: usize) {
        self.field_widths.update_field_width(field, width);
    }
}

/// A scannable collection of rows
pub trait Table {
    fn name(&self) -> &str;

    /// Pre-scan setup, e.g. marking rows as possibly gone
    fn prepare(&mut self);

    /// Collect fresh values for every row
    fn iterate(&mut self, ctx: &mut ScanContext<'_>);

    /// Post-scan finalization, e.g. dropping rows that disappeared
    fn cleanup(&mut self);

    fn set_panel(&mut self, panel: PanelHandle);

    fn panel(&self) -> Option<&PanelHandle>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Concrete table access for consumers that know the kind
    fn as_any(&self) -> &dyn Any;
}

/// Run one table through the full protocol.
pub fn scan_table(table: &mut dyn Table, ctx: &mut ScanContext<'_>) {
    table.prepare();
    table.iterate(ctx);
    table.cleanup();
    debug!("table {} scanned, {} row(s)", table.name(), table.len());
}

/// Collection layer feeding the process table
pub trait ProcessSource {
    fn sample(&mut self) -> Result<Vec<ProcessSample>>;
}

/// Source replaying a snapshot that can be swapped between cycles
#[derive(Debug, Clone, Default)]
pub struct SnapshotSource {
    samples: Rc<RefCell<Vec<ProcessSample>>>,
}

impl SnapshotSource {
    pub fn new(samples: Vec<ProcessSample>) -> Self {
        Self {
            samples: Rc::new(RefCell::new(samples)),
        }
    }

    /// Replace the samples returned by the next cycles.
    pub fn replace(&self, samples: Vec<ProcessSample>) {
        *self.samples.borrow_mut() = samples;
    }
}

impl ProcessSource for SnapshotSource {
    fn sample(&mut self) -> Result<Vec<ProcessSample>> {
        Ok(self.samples.borrow().clone())
    }
}

/// The primary table of process rows
pub struct ProcessTable {
    rows: Vec<Entity>,
    by_id: HashMap<u32, usize>,
    source: Box<dyn ProcessSource>,
    panel: Option<PanelHandle>,
}

impl ProcessTable {
    pub fn new(source: Box<dyn ProcessSource>) -> Self {
        Self {
            rows: Vec::new(),
            by_id: HashMap::new(),
            source,
            panel: None,
        }
    }

    pub fn rows(&self) -> &[Entity] {
        &self.rows
    }

    pub fn find(&self, id: u32) -> Option<&Entity> {
        self.rows.iter().find(|row| row.id == id)
    }

    /// Recompute every row's accumulated resident value.
    pub fn accumulate(&mut self) -> AccumulationReport {
        accumulate_resident(&mut self.rows)
    }

    fn reindex(&mut self) {
        self.by_id.clear();
        for (idx, row) in self.rows.iter().enumerate() {
            self.by_id.insert(row.id, idx);
        }
    }
}

/// Feed one row's user and command into the cycle aggregates.
fn observe_row(ctx: &mut ScanContext<'_>, user_id: u32, name: &str) {
    ctx.observe_user_id(user_id);
    ctx.update_field_width(Field::Command, name.chars().count());
    if let Some(width) = ctx.user_name(user_id).map(|user| user.chars().count()) {
        ctx.update_field_width(Field::User, width);
    }
}

impl Table for ProcessTable {
    fn name(&self) -> &str {
        "processes"
    }

    fn prepare(&mut self) {
        for row in &mut self.rows {
            row.updated = false;
        }
        self.reindex();
    }

    fn iterate(&mut self, ctx: &mut ScanContext<'_>) {
        let samples = match self.source.sample() {
            Ok(samples) => samples,
            Err(e) => {
                warn!("Process collection failed, keeping previous rows: {}", e);
                for row in &mut self.rows {
                    observe_row(ctx, row.user_id, &row.name);
                    row.updated = true;
                }
                return;
            }
        };

        for sample in samples {
            observe_row(ctx, sample.user_id, &sample.name);

            match self.by_id.get(&sample.id) {
                Some(&idx) => self.rows[idx].refresh_from(sample),
                None => {
                    self.by_id.insert(sample.id, self.rows.len());
                    self.rows.push(Entity::from(sample));
                }
            }
        }
    }

    fn cleanup(&mut self) {
        let before = self.rows.len();
        self.rows.retain(|row| row.updated);
        if self.rows.len() != before {
            debug!("dropped {} exited process(es)", before - self.rows.len());
            self.reindex();
        }
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
