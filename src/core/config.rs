use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, ScanError};

pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 1500;

/// Kinds of tables a view can show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    Processes,
    Disks,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewConfig {
    pub name: String,
    /// Dedicated table; unset means the primary process table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<TableKind>,
}

impl ViewConfig {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            table: None,
        }
    }

    pub fn with_table(mut self, table: TableKind) -> Self {
        self.table = Some(table);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_ms: u64,
    #[serde(default = "default_views")]
    pub views: Vec<ViewConfig>,
}

fn default_refresh_interval() -> u64 {
    DEFAULT_REFRESH_INTERVAL_MS
}

fn default_views() -> Vec<ViewConfig> {
    vec![ViewConfig::new("Main")]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_interval_ms: default_refresh_interval(),
            views: default_views(),
        }
    }
}

impl Config {
    /// Load from the default location, falling back to defaults when the
    /// file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let data = fs::read_to_string(path).map_err(|e| {
            ScanError::config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        // An empty file is treated like a missing one
        if data.trim().is_empty() {
            return Ok(Config::default());
        }

        let config: Config = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ScanError::config(format!(
                    "Failed to create config directory {:?}: {}",
                    parent, e
                ))
            })?;
        }

        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data)?;
        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ScanError::config("Could not determine config directory"))?;

        Ok(config_dir.join("scanmon").join("config.json"))
    }

    fn validate(&self) -> Result<()> {
        if self.refresh_interval_ms == 0 {
            return Err(ScanError::config("refresh_interval_ms must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_one_process_view() {
        let config = Config::default();
        assert_eq!(config.views.len(), 1);
        assert_eq!(config.views[0].table, None);
        assert_eq!(config.refresh_interval_ms, 1500);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());

        let config: Config =
            serde_json::from_str(r#"{"views":[{"name":"IO","table":"disks"}]}"#).unwrap();
        assert_eq!(config.views[0].table, Some(TableKind::Disks));
    }
}
