//! Host collection layer backed by `sysinfo`.

use sysinfo::{Disks, ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind};

use super::disk_table::{DiskRow, DiskSource};
use super::entity::{ProcessSample, NO_PARENT};
use super::table::ProcessSource;
use crate::error::Result;

/// Collects processes from the host
pub struct SysinfoProcessSource {
    system: System,
    refresh_kind: ProcessRefreshKind,
}

impl SysinfoProcessSource {
    pub fn new() -> Self {
        Self {
            system: System::new(),
            refresh_kind: ProcessRefreshKind::nothing()
                .with_memory()
                .with_user(UpdateKind::OnlyIfNotSet),
        }
    }
}

impl Default for SysinfoProcessSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessSource for SysinfoProcessSource {
    fn sample(&mut self) -> Result<Vec<ProcessSample>> {
        self.system
            .refresh_processes_specifics(ProcessesToUpdate::All, true, self.refresh_kind);

        let samples = self
            .system
            .processes()
            .values()
            // Threads show up as processes on Linux
            .filter(|proc| proc.thread_kind().is_none())
            .map(|proc| ProcessSample {
                id: proc.pid().as_u32(),
                parent: proc.parent().map(|p| p.as_u32()).unwrap_or(NO_PARENT),
                user_id: user_id_of(proc),
                name: proc.name().to_string_lossy().to_string(),
                resident: proc.memory(),
            })
            .collect();

        Ok(samples)
    }
}

#[cfg(unix)]
fn user_id_of(proc: &sysinfo::Process) -> u32 {
    proc.user_id().map(|uid| **uid).unwrap_or(0)
}

#[cfg(not(unix))]
fn user_id_of(_proc: &sysinfo::Process) -> u32 {
    0
}

/// Collects mounted filesystems from the host
pub struct SysinfoDiskSource {
    disks: Disks,
}

impl SysinfoDiskSource {
    pub fn new() -> Self {
        Self {
            disks: Disks::new_with_refreshed_list(),
        }
    }
}

impl Default for SysinfoDiskSource {
    fn default() -> Self {
        Self::new()
    }
}

impl DiskSource for SysinfoDiskSource {
    fn sample(&mut self) -> Result<Vec<DiskRow>> {
        self.disks.refresh(true);

        let rows = self
            .disks
            .iter()
            .map(|disk| {
                let mut row = DiskRow::new(
                    disk.mount_point().to_string_lossy().to_string(),
                    disk.total_space(),
                    disk.available_space(),
                );
                row.name = disk.name().to_string_lossy().to_string();
                row.fs_type = disk.file_system().to_string_lossy().to_string();
                row
            })
            .collect();

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_source_sees_current_process() {
        let mut source = SysinfoProcessSource::new();
        let samples = source.sample().unwrap();
        let current = std::process::id();
        assert!(samples.iter().any(|s| s.id == current));
    }
}
