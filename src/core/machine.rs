//! Top-level scan coordinator.
//!
//! A [`Machine`] owns the scan clock, the optional topology, the primary
//! process table and the registry of tables behind the configured screens.
//! Each call to [`Machine::scan_tables`] runs one full refresh cycle.

use log::{debug, error, info, warn};

use super::accumulate::AccumulationReport;
use super::clock::{ClockSource, Realtime, ScanClock, SystemClock};
use super::field_widths::FieldWidths;
use super::registry::TableRegistry;
use super::settings::SharedSettings;
use super::table::{scan_table, PanelHandle, ProcessTable, ScanContext, Table, TableRef};
use super::topology::{SysfsTopologyProbe, Topology, TopologyProbe};
use super::users::SharedUsersTable;
use crate::error::{Result, ScanError};
use crate::platform;

/// Host collaborators queried while the machine is created
pub struct MachineEnvironment {
    pub clock: Box<dyn ClockSource>,
    pub topology: Box<dyn TopologyProbe>,
    pub max_pid: u32,
    pub own_user_id: u32,
}

impl MachineEnvironment {
    /// Collaborators reading the current host
    pub fn host() -> Self {
        Self {
            clock: Box::new(SystemClock),
            topology: Box::new(SysfsTopologyProbe::new()),
            max_pid: platform::max_pid(),
            own_user_id: platform::effective_user_id(),
        }
    }
}

pub struct Machine {
    users_table: SharedUsersTable,
    /// User the caller filters on, if any
    user_id: Option<u32>,
    /// Effective user running the monitor
    own_user_id: u32,
    clock: ScanClock,
    clock_source: Box<dyn ClockSource>,
    max_user_id: u32,
    settings: Option<SharedSettings>,
    process_table: Option<ProcessTable>,
    tables: TableRegistry,
    topology: Option<Topology>,
    field_widths: FieldWidths,
    last_accumulation: AccumulationReport,
    halted: bool,
}

impl Machine {
    /// Create a machine for the current host.
    ///
    /// Blocks while the hardware topology is discovered.
    pub fn new(users_table: SharedUsersTable, user_id: Option<u32>) -> Self {
        Self::with_environment(users_table, user_id, MachineEnvironment::host())
    }

    pub fn with_environment(
        users_table: SharedUsersTable,
        user_id: Option<u32>,
        env: MachineEnvironment,
    ) -> Self {
        let MachineEnvironment {
            clock: clock_source,
            topology: probe,
            max_pid,
            own_user_id,
        } = env;

        // Fixed column width limits
        let mut field_widths = FieldWidths::new();
        field_widths.set_pid_column_width(u64::from(max_pid));

        // Valid realtime stamp before the first cycle
        let clock = ScanClock::new(clock_source.as_ref());

        let topology = probe.probe();
        match &topology {
            Some(t) => debug!(
                "Topology available: {} package(s), {} core(s)",
                t.package_count(),
                t.core_count()
            ),
            None => debug!("Topology unavailable"),
        }

        info!(
            "Machine initialized (euid {}, max pid {}, {} user(s))",
            own_user_id,
            max_pid,
            users_table.borrow().len()
        );

        Self {
            users_table,
            user_id,
            own_user_id,
            clock,
            clock_source,
            max_user_id: 0,
            settings: None,
            process_table: None,
            tables: TableRegistry::new(),
            topology,
            field_widths,
            last_accumulation: AccumulationReport::default(),
            halted: false,
        }
    }

    /// Register the tables of every configured screen.
    ///
    /// Screens without a dedicated table are bound to `process_table`,
    /// which the machine takes ownership of. The first screen's table
    /// becomes the active one.
    pub fn populate_tables_from_settings(
        &mut self,
        settings: SharedSettings,
        process_table: ProcessTable,
    ) {
        self.process_table = Some(process_table);

        {
            let mut borrowed = settings.borrow_mut();
            for (i, screen) in borrowed.screens.iter_mut().enumerate() {
                let table = screen.table.get_or_insert(TableRef::Primary).clone();
                if i == 0 {
                    self.tables.set_active(table.clone());
                }
                if self.tables.add(table) {
                    debug!("registered table for screen {:?}", screen.name);
                }
            }
        }

        info!(
            "{} table(s) registered from {} screen(s)",
            self.tables.len(),
            settings.borrow().screens.len()
        );
        self.settings = Some(settings);
    }

    /// Hand `panel` to every registered table.
    pub fn set_tables_panel(&mut self, panel: PanelHandle) {
        for table in self.tables.iter() {
            match table {
                TableRef::Primary => {
                    if let Some(primary) = self.process_table.as_mut() {
                        primary.set_panel(panel.clone());
                    }
                }
                TableRef::Shared(handle) => match handle.try_borrow_mut() {
                    Ok(mut shared) => shared.set_panel(panel.clone()),
                    Err(_) => warn!("table busy, panel not bound"),
                },
            }
        }
    }

    /// Run one refresh cycle over every registered table.
    ///
    /// A monotonic clock that fails to advance is fatal: the error is
    /// returned and every later call fails with [`ScanError::Halted`].
    pub fn scan_tables(&mut self) -> Result<()> {
        if self.halted {
            return Err(ScanError::Halted);
        }

        if let Err(e) = self.clock.advance(self.clock_source.as_ref()) {
            error!("Scan aborted: {}", e);
            self.halted = true;
            return Err(e);
        }

        self.max_user_id = 0;
        self.field_widths.reset();

        {
            let users = self.users_table.borrow();
            let mut ctx = ScanContext::new(
                &self.clock,
                &users,
                &mut self.max_user_id,
                &mut self.field_widths,
            );

            for table in self.tables.iter() {
                match table {
                    TableRef::Primary => {
                        if let Some(primary) = self.process_table.as_mut() {
                            scan_table(primary, &mut ctx);
                        }
                    }
                    TableRef::Shared(handle) => match handle.try_borrow_mut() {
                        Ok(mut shared) => scan_table(&mut *shared, &mut ctx),
                        Err(_) => warn!("table busy, skipped this cycle"),
                    },
                }
            }
        }

        self.populate_accumulated_fields();

        self.field_widths.set_uid_column_width(u64::from(self.max_user_id));
        Ok(())
    }

    fn populate_accumulated_fields(&mut self) {
        let Some(primary) = self.process_table.as_mut() else {
            self.last_accumulation = AccumulationReport::default();
            return;
        };
        let report = primary.accumulate();
        if report.has_cycles() {
            warn!(
                "{} parent loop(s) broken while accumulating: {:?}",
                report.cycles.len(),
                report.cycles
            );
        }
        self.last_accumulation = report;
    }

    /// Tear the machine down.
    ///
    /// Releases the topology and the primary table. Shared tables stay
    /// with the settings that own them.
    pub fn done(mut self) {
        if self.topology.take().is_some() {
            debug!("Topology released");
        }
        self.process_table = None;
        self.tables.clear();
        info!("Machine shut down");
    }

    pub fn users_table(&self) -> &SharedUsersTable {
        &self.users_table
    }

    /// Name of `uid` from the shared users table.
    pub fn user_name(&self, uid: u32) -> Option<String> {
        self.users_table.borrow().get(uid).map(str::to_string)
    }

    pub fn user_id(&self) -> Option<u32> {
        self.user_id
    }

    pub fn own_user_id(&self) -> u32 {
        self.own_user_id
    }

    pub fn settings(&self) -> Option<&SharedSettings> {
        self.settings.as_ref()
    }

    pub fn process_table(&self) -> Option<&ProcessTable> {
        self.process_table.as_ref()
    }

    pub fn tables(&self) -> &TableRegistry {
        &self.tables
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn active_table(&self) -> Option<&TableRef> {
        self.tables.active()
    }

    pub fn topology(&self) -> Option<&Topology> {
        self.topology.as_ref()
    }

    pub fn realtime(&self) -> Realtime {
        self.clock.realtime()
    }

    pub fn monotonic_ms(&self) -> u64 {
        self.clock.monotonic_ms()
    }

    pub fn prev_monotonic_ms(&self) -> u64 {
        self.clock.prev_monotonic_ms()
    }

    pub fn max_user_id(&self) -> u32 {
        self.max_user_id
    }

    pub fn field_widths(&self) -> &FieldWidths {
        &self.field_widths
    }

    pub fn last_accumulation(&self) -> &AccumulationReport {
        &self.last_accumulation
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }
}
