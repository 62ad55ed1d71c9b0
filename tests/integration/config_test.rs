use scanmon::core::config::{Config, TableKind, ViewConfig};
use scanmon::core::disk_table::{DiskRow, DiskSource};
use scanmon::core::settings::Settings;
use scanmon::ScanError;
use std::fs;
use tempfile::TempDir;

struct NoDisks;

impl DiskSource for NoDisks {
    fn sample(&mut self) -> scanmon::Result<Vec<DiskRow>> {
        Ok(Vec::new())
    }
}

#[test]
fn test_config_save_and_reload() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("config.json");

    let config = Config {
        refresh_interval_ms: 750,
        views: vec![
            ViewConfig::new("Main"),
            ViewConfig::new("Mounts").with_table(TableKind::Disks),
        ],
    };
    config.save_to(&path).unwrap();

    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_missing_config_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let loaded = Config::load_from(&temp_dir.path().join("absent.json")).unwrap();

    assert_eq!(loaded.refresh_interval_ms, 1500);
    assert_eq!(loaded.views, vec![ViewConfig::new("Main")]);
}

#[test]
fn test_partial_config_fills_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    fs::write(&path, r#"{ "views": [{ "name": "IO", "table": "disks" }] }"#).unwrap();

    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded.refresh_interval_ms, 1500);
    assert_eq!(loaded.views[0].table, Some(TableKind::Disks));
}

#[test]
fn test_invalid_config_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");

    fs::write(&path, r#"{ "refresh_interval_ms": 0 }"#).unwrap();
    assert!(matches!(Config::load_from(&path), Err(ScanError::Config(_))));

    fs::write(&path, "{ not json").unwrap();
    assert!(matches!(Config::load_from(&path), Err(ScanError::Json(_))));
}

#[test]
fn test_settings_follow_configured_views() {
    let config = Config {
        refresh_interval_ms: 1000,
        views: vec![
            ViewConfig::new("Main"),
            ViewConfig::new("IO").with_table(TableKind::Disks),
        ],
    };
    let settings = Settings::from_config_with(&config, || Box::new(NoDisks));

    let names: Vec<&str> = settings.screens.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Main", "IO"]);
    assert!(settings.screens[0].table.is_none());
    assert!(settings.screens[1].table.is_some());
}
