//! Hardware topology discovery.
//!
//! Discovery is best effort: a probe either returns a complete
//! [`Topology`] or nothing at all. The [`TopologyBuilder`] is consumed by
//! every step, so a failed attempt leaves no partially loaded state behind.

use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, ScanError};

/// Default sysfs directory with one `cpu<N>` entry per processing unit
pub const SYSFS_CPU_ROOT: &str = "/sys/devices/system/cpu";

/// Which object types survive loading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeFilter {
    /// Keep every level, caches included
    KeepAll,
    /// Keep the structural levels (package, core, PU), drop caches
    #[default]
    KeepStructure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Topology {
    pub packages: Vec<Package>,
    pub caches: Vec<Cache>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Package {
    pub id: u32,
    pub cores: Vec<Core>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Core {
    pub id: u32,
    pub processing_units: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cache {
    pub level: u8,
    pub kind: String,
    pub size_kb: Option<u64>,
    pub shared_cpus: String,
}

impl Topology {
    pub fn package_count(&self) -> usize {
        self.packages.len()
    }

    pub fn core_count(&self) -> usize {
        self.packages.iter().map(|p| p.cores.len()).sum()
    }

    pub fn processing_unit_count(&self) -> usize {
        self.packages
            .iter()
            .flat_map(|p| &p.cores)
            .map(|c| c.processing_units.len())
            .sum()
    }
}

/// Something able to discover the host topology
pub trait TopologyProbe {
    /// Returns `None` when the topology is unavailable
    fn probe(&self) -> Option<Topology>;
}

/// Staged loader: `init` → `set_type_filter` → `load`
#[derive(Debug)]
pub struct TopologyBuilder {
    root: PathBuf,
    filter: TypeFilter,
}

impl TopologyBuilder {
    pub fn init<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(ScanError::topology(format!(
                "{} is not a directory",
                root.display()
            )));
        }
        Ok(Self {
            root,
            filter: TypeFilter::default(),
        })
    }

    pub fn set_type_filter(mut self, filter: TypeFilter) -> Result<Self> {
        self.filter = filter;
        Ok(self)
    }

    pub fn load(self) -> Result<Topology> {
        let mut packages: BTreeMap<u32, BTreeMap<u32, Vec<u32>>> = BTreeMap::new();
        let mut caches = Vec::new();

        for cpu in self.cpu_ids()? {
            let cpu_dir = self.root.join(format!("cpu{}", cpu));
            let topo_dir = cpu_dir.join("topology");
            let (Some(package_id), Some(core_id)) = (
                read_u32(&topo_dir.join("physical_package_id")),
                read_u32(&topo_dir.join("core_id")),
            ) else {
                // Offline CPUs have no topology directory
                continue;
            };

            packages
                .entry(package_id)
                .or_default()
                .entry(core_id)
                .or_default()
                .push(cpu);

            if self.filter == TypeFilter::KeepAll {
                collect_caches(&cpu_dir.join("cache"), &mut caches);
            }
        }

        if packages.is_empty() {
            return Err(ScanError::topology(format!(
                "no CPU topology found under {}",
                self.root.display()
            )));
        }

        let packages = packages
            .into_iter()
            .map(|(id, cores)| Package {
                id,
                cores: cores
                    .into_iter()
                    .map(|(id, mut processing_units)| {
                        processing_units.sort_unstable();
                        Core {
                            id,
                            processing_units,
                        }
                    })
                    .collect(),
            })
            .collect();

        Ok(Topology { packages, caches })
    }

    fn cpu_ids(&self) -> Result<Vec<u32>> {
        let mut ids: Vec<u32> = fs::read_dir(&self.root)?
            .flatten()
            .filter_map(|entry| {
                let name = entry.file_name();
                name.to_str()?.strip_prefix("cpu")?.parse::<u32>().ok()
            })
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }
}

fn read_u32(path: &Path) -> Option<u32> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

/// Read `index*` cache descriptors, skipping ones already seen through a
/// sibling CPU.
fn collect_caches(cache_dir: &Path, caches: &mut Vec<Cache>) {
    let Ok(entries) = fs::read_dir(cache_dir) else {
        return;
    };
    let mut dirs: Vec<_> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("index"))
        })
        .collect();
    dirs.sort();

    for dir in dirs {
        let read = |name: &str| {
            fs::read_to_string(dir.join(name))
                .map(|s| s.trim().to_string())
                .unwrap_or_default()
        };
        let Ok(level) = read("level").parse::<u8>() else {
            continue;
        };
        let size_kb = read("size")
            .strip_suffix('K')
            .and_then(|s| s.parse::<u64>().ok());
        let cache = Cache {
            level,
            kind: read("type"),
            size_kb,
            shared_cpus: read("shared_cpu_list"),
        };
        if !caches.contains(&cache) {
            caches.push(cache);
        }
    }
}

/// Probe reading the Linux sysfs CPU tree
#[derive(Debug, Clone)]
pub struct SysfsTopologyProbe {
    root: PathBuf,
    filter: TypeFilter,
}

impl SysfsTopologyProbe {
    pub fn new() -> Self {
        Self::with_root(SYSFS_CPU_ROOT)
    }

    pub fn with_root<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            filter: TypeFilter::KeepStructure,
        }
    }

    pub fn with_filter(mut self, filter: TypeFilter) -> Self {
        self.filter = filter;
        self
    }
}

impl Default for SysfsTopologyProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl TopologyProbe for SysfsTopologyProbe {
    fn probe(&self) -> Option<Topology> {
        let result = TopologyBuilder::init(&self.root)
            .and_then(|b| b.set_type_filter(self.filter))
            .and_then(TopologyBuilder::load);

        match result {
            Ok(topology) => {
                debug!(
                    "Topology: {} package(s), {} core(s), {} PU(s)",
                    topology.package_count(),
                    topology.core_count(),
                    topology.processing_unit_count()
                );
                Some(topology)
            }
            Err(e) => {
                debug!("Topology unavailable: {}", e);
                None
            }
        }
    }
}

/// Probe that never finds a topology
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTopology;

impl TopologyProbe for NoTopology {
    fn probe(&self) -> Option<Topology> {
        None
    }
}
