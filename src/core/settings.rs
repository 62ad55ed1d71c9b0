//! Screen settings consumed by the machine.
//!
//! Settings own the dedicated tables of their screens. Screens without a
//! dedicated table are bound to the primary process table when the
//! machine is populated.

use std::cell::RefCell;
use std::rc::Rc;

use super::collector::SysinfoDiskSource;
use super::config::{Config, TableKind};
use super::disk_table::{DiskSource, DiskTable};
use super::table::TableRef;

pub type SharedSettings = Rc<RefCell<Settings>>;

#[derive(Debug, Clone)]
pub struct ScreenSettings {
    pub name: String,
    pub table: Option<TableRef>,
}

impl ScreenSettings {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            table: None,
        }
    }

    pub fn with_table(mut self, table: TableRef) -> Self {
        self.table = Some(table);
        self
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub screens: Vec<ScreenSettings>,
    pub refresh_interval_ms: u64,
}

impl Settings {
    pub fn new(screens: Vec<ScreenSettings>) -> Self {
        Self {
            screens,
            refresh_interval_ms: crate::core::config::DEFAULT_REFRESH_INTERVAL_MS,
        }
    }

    /// Build screens from the configured views, using the host disks.
    pub fn from_config(config: &Config) -> Self {
        Self::from_config_with(config, || Box::new(SysinfoDiskSource::new()))
    }

    /// Build screens from the configured views. All disk views share one
    /// table, created through `disk_source` on first use.
    pub fn from_config_with<F>(config: &Config, disk_source: F) -> Self
    where
        F: FnOnce() -> Box<dyn DiskSource>,
    {
        let mut disk_source = Some(disk_source);
        let mut disks: Option<TableRef> = None;

        let screens = config
            .views
            .iter()
            .map(|view| {
                let table = match view.table {
                    None | Some(TableKind::Processes) => None,
                    Some(TableKind::Disks) => {
                        if disks.is_none() {
                            if let Some(make) = disk_source.take() {
                                disks = Some(TableRef::shared(DiskTable::new(make())));
                            }
                        }
                        disks.clone()
                    }
                };
                ScreenSettings {
                    name: view.name.clone(),
                    table,
                }
            })
            .collect();

        Self {
            screens,
            refresh_interval_ms: config.refresh_interval_ms,
        }
    }

    pub fn shared(self) -> SharedSettings {
        Rc::new(RefCell::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ViewConfig;
    use crate::core::disk_table::DiskRow;
    use crate::error::Result;

    struct NoDisks;

    impl DiskSource for NoDisks {
        fn sample(&mut self) -> Result<Vec<DiskRow>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_disk_views_share_one_table() {
        let config = Config {
            refresh_interval_ms: 500,
            views: vec![
                ViewConfig::new("Main"),
                ViewConfig::new("IO").with_table(TableKind::Disks),
                ViewConfig::new("Tree").with_table(TableKind::Processes),
                ViewConfig::new("Mounts").with_table(TableKind::Disks),
            ],
        };
        let settings = Settings::from_config_with(&config, || Box::new(NoDisks));

        assert_eq!(settings.screens.len(), 4);
        assert_eq!(settings.refresh_interval_ms, 500);
        assert!(settings.screens[0].table.is_none());
        assert!(settings.screens[2].table.is_none());

        let io = settings.screens[1].table.as_ref().unwrap();
        let mounts = settings.screens[3].table.as_ref().unwrap();
        assert!(io.same_table(mounts));
    }
}
