use scanmon::core::clock::{ClockSource, Realtime};
use scanmon::core::disk_table::{DiskRow, DiskSource, DiskTable};
use scanmon::core::entity::ProcessSample;
use scanmon::core::machine::{Machine, MachineEnvironment};
use scanmon::core::settings::{ScreenSettings, Settings};
use scanmon::core::table::{PanelHandle, ProcessTable, SnapshotSource, Table, TableRef};
use scanmon::core::topology::NoTopology;
use scanmon::core::users::UsersTable;
use scanmon::ScanError;
use std::cell::Cell;
use std::rc::Rc;

/// Monotonic source stepping by a fixed amount per reading
struct SteppingClock {
    now: Cell<u64>,
    step: u64,
}

impl ClockSource for SteppingClock {
    fn now_realtime(&self) -> Realtime {
        Realtime {
            secs: 1_750_000_000,
            ms: 1_750_000_000_000,
        }
    }

    fn now_monotonic(&self) -> u64 {
        self.now.set(self.now.get() + self.step);
        self.now.get()
    }
}

struct FixedDisks;

impl DiskSource for FixedDisks {
    fn sample(&mut self) -> scanmon::Result<Vec<DiskRow>> {
        Ok(vec![DiskRow::new("/", 1000, 250)])
    }
}

fn environment(step: u64) -> MachineEnvironment {
    MachineEnvironment {
        clock: Box::new(SteppingClock {
            now: Cell::new(1000),
            step,
        }),
        topology: Box::new(NoTopology),
        max_pid: 32_768,
        own_user_id: 0,
    }
}

fn sample(id: u32, parent: u32, user_id: u32, resident: u64) -> ProcessSample {
    ProcessSample {
        id,
        parent,
        user_id,
        name: format!("cmd{}", id),
        resident,
    }
}

#[test]
fn test_full_cycle_over_primary_and_shared_tables() {
    let disks = TableRef::shared(DiskTable::new(Box::new(FixedDisks)));
    let settings = Settings::new(vec![
        ScreenSettings::new("Main"),
        ScreenSettings::new("IO").with_table(disks.clone()),
        ScreenSettings::new("Tree"),
    ])
    .shared();

    let source = SnapshotSource::new(vec![
        sample(1, 0, 0, 400),
        sample(20, 1, 1000, 100),
        sample(21, 20, 1000, 50),
        sample(30, 1, 65_534, 10),
    ]);

    let mut users = UsersTable::new();
    users.insert(1000, "alice");
    let mut machine = Machine::with_environment(users.shared(), None, environment(250));
    machine.populate_tables_from_settings(settings.clone(), ProcessTable::new(Box::new(source)));
    machine.set_tables_panel(PanelHandle::new(3));

    assert_eq!(machine.table_count(), 2);
    assert!(machine.active_table().is_some_and(TableRef::is_primary));

    machine.scan_tables().unwrap();
    machine.scan_tables().unwrap();
    assert_eq!(machine.prev_monotonic_ms(), 1);
    assert_eq!(machine.monotonic_ms(), 1250);

    let table = machine.process_table().unwrap();
    assert_eq!(table.panel(), Some(&PanelHandle::new(3)));
    assert_eq!(table.find(1).unwrap().accumulated_resident(), Some(560));
    assert_eq!(table.find(20).unwrap().accumulated_resident(), Some(150));
    assert_eq!(table.find(30).unwrap().accumulated_resident(), Some(10));
    assert_eq!(machine.max_user_id(), 65_534);
    assert_eq!(machine.field_widths().pid_digits(), 5);
    assert_eq!(machine.user_name(1000).as_deref(), Some("alice"));

    if let TableRef::Shared(handle) = &disks {
        let shared = handle.borrow();
        assert_eq!(shared.len(), 1);
        assert_eq!(shared.panel(), Some(&PanelHandle::new(3)));
    }
}

#[test]
fn test_rows_follow_the_source_between_cycles() {
    let source = SnapshotSource::new(vec![sample(1, 0, 0, 100), sample(2, 1, 0, 40)]);
    let settings = Settings::new(vec![ScreenSettings::new("Main")]).shared();
    let mut machine =
        Machine::with_environment(UsersTable::new().shared(), None, environment(100));
    machine.populate_tables_from_settings(settings, ProcessTable::new(Box::new(source.clone())));

    machine.scan_tables().unwrap();
    assert_eq!(
        machine.process_table().unwrap().find(1).unwrap().accumulated_resident(),
        Some(140)
    );

    // Process 2 exits and leaves process 3 orphaned
    source.replace(vec![sample(1, 0, 0, 100), sample(3, 2, 0, 5)]);
    machine.scan_tables().unwrap();

    let table = machine.process_table().unwrap();
    assert!(table.find(2).is_none());
    assert_eq!(table.find(1).unwrap().accumulated_resident(), Some(100));
    assert_eq!(table.find(3).unwrap().accumulated_resident(), Some(5));
}

#[test]
fn test_parent_loop_is_reported_and_cycle_completes() {
    let source = SnapshotSource::new(vec![
        sample(1, 0, 0, 10),
        sample(5, 6, 0, 20),
        sample(6, 5, 0, 30),
    ]);
    let settings = Settings::new(vec![ScreenSettings::new("Main")]).shared();
    let mut machine =
        Machine::with_environment(UsersTable::new().shared(), None, environment(10));
    machine.populate_tables_from_settings(settings, ProcessTable::new(Box::new(source)));

    machine.scan_tables().unwrap();

    let report = machine.last_accumulation();
    assert!(report.has_cycles());
    assert_eq!(report.rows, 3);

    assert_eq!(report.cycles, vec![5]);

    // pid 5 is resolved first, its edge to pid 6 is dropped
    let table = machine.process_table().unwrap();
    assert_eq!(table.find(5).unwrap().accumulated_resident(), Some(50));
    assert_eq!(table.find(6).unwrap().accumulated_resident(), Some(30));
    assert_eq!(table.find(1).unwrap().accumulated_resident(), Some(10));
}

#[test]
fn test_stalled_clock_halts_the_machine() {
    let mut machine = Machine::with_environment(UsersTable::new().shared(), None, environment(0));
    machine.populate_tables_from_settings(
        Settings::new(vec![ScreenSettings::new("Main")]).shared(),
        ProcessTable::new(Box::new(SnapshotSource::default())),
    );

    // Bootstrap cycle, then a reading of 1000 after the bootstrap value 1
    machine.scan_tables().unwrap();
    machine.scan_tables().unwrap();

    let err = machine.scan_tables().unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(machine.scan_tables(), Err(ScanError::Halted)));
}

#[test]
fn test_done_leaves_shared_tables_with_settings() {
    let handle = match TableRef::shared(DiskTable::new(Box::new(FixedDisks))) {
        TableRef::Shared(handle) => handle,
        TableRef::Primary => unreachable!(),
    };
    let settings = Settings::new(vec![
        ScreenSettings::new("IO").with_table(TableRef::Shared(handle.clone())),
    ])
    .shared();

    let mut machine =
        Machine::with_environment(UsersTable::new().shared(), None, environment(5));
    machine.populate_tables_from_settings(
        settings.clone(),
        ProcessTable::new(Box::new(SnapshotSource::default())),
    );
    machine.scan_tables().unwrap();
    machine.done();

    // Held by the settings and this test only
    assert_eq!(Rc::strong_count(&handle), 2);
    assert_eq!(handle.borrow().len(), 1);
    assert_eq!(settings.borrow().screens.len(), 1);
}
