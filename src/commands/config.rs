//! Configuration command handler.

use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::*;
use std::path::PathBuf;

use crate::core::config::Config;

/// Config file from `--config`, or the default location
pub fn resolve_path(matches: &ArgMatches) -> Result<PathBuf> {
    match matches.get_one::<String>("config") {
        Some(path) => Ok(PathBuf::from(path)),
        None => Config::get_config_path().context("Could not resolve config path"),
    }
}

pub fn execute(matches: &ArgMatches) -> Result<()> {
    let path = resolve_path(matches)?;

    match matches.subcommand() {
        Some(("show", _)) => {
            let config = Config::load_from(&path)
                .with_context(|| format!("Failed to load config from {:?}", path))?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Some(("init", sub)) => {
            if path.exists() && !sub.get_flag("force") {
                println!("{} {}", "Config already exists:".yellow(), path.display());
                return Ok(());
            }
            Config::default()
                .save_to(&path)
                .with_context(|| format!("Failed to write config to {:?}", path))?;
            println!("{} {}", "Config written to".green(), path.display());
        }
        Some(("path", _)) => println!("{}", path.display()),
        _ => println!("Use 'scanmon config --help' for more information."),
    }
    Ok(())
}
