//! Hardware topology command handler.

use anyhow::Result;
use clap::ArgMatches;
use colored::*;

use crate::core::topology::{SysfsTopologyProbe, TopologyProbe, TypeFilter};
use crate::ui::format_topology;

pub fn execute(matches: &ArgMatches) -> Result<()> {
    let filter = if matches.get_flag("caches") {
        TypeFilter::KeepAll
    } else {
        TypeFilter::KeepStructure
    };

    let probe = match matches.get_one::<String>("root") {
        Some(root) => SysfsTopologyProbe::with_root(root.as_str()),
        None => SysfsTopologyProbe::new(),
    }
    .with_filter(filter);

    let Some(topology) = probe.probe() else {
        println!("{}", "Topology information is not available on this host".yellow());
        return Ok(());
    };

    if matches.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&topology)?);
    } else {
        for line in format_topology(&topology) {
            println!("{}", line);
        }
    }
    Ok(())
}
