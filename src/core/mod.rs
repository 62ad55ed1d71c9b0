// Core business logic module

pub mod accumulate;
pub mod clock;
pub mod collector;
pub mod config;
pub mod disk_table;
pub mod entity;
pub mod field_widths;
pub mod machine;
pub mod registry;
pub mod settings;
pub mod table;
pub mod topology;
pub mod users;

// Re-export commonly used items
pub use accumulate::{accumulate_resident, AccumulationReport, Accumulator};
pub use clock::{ClockSource, Realtime, ScanClock, SystemClock};
pub use collector::{SysinfoDiskSource, SysinfoProcessSource};
pub use config::{Config, TableKind, ViewConfig};
pub use disk_table::{DiskRow, DiskSource, DiskTable};
pub use entity::{Entity, ProcessSample, NO_PARENT};
pub use field_widths::{Field, FieldWidths};
pub use machine::{Machine, MachineEnvironment};
pub use registry::TableRegistry;
pub use settings::{ScreenSettings, Settings, SharedSettings};
pub use table::{
    scan_table, PanelHandle, ProcessSource, ProcessTable, ScanContext, SnapshotSource, Table,
    TableHandle, TableRef,
};
pub use topology::{
    NoTopology, SysfsTopologyProbe, Topology, TopologyBuilder, TopologyProbe, TypeFilter,
};
pub use users::{SharedUsersTable, UsersTable};
