//! Scan command handler.
//!
//! Runs refresh cycles over the configured tables and prints the process
//! table with raw and accumulated resident memory.

use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::*;
use log::info;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::config::resolve_path;
use crate::core::clock::Realtime;
use crate::core::collector::SysinfoProcessSource;
use crate::core::config::Config;
use crate::core::disk_table::{DiskRow, DiskTable};
use crate::core::entity::Entity;
use crate::core::machine::Machine;
use crate::core::settings::Settings;
use crate::core::table::{PanelHandle, ProcessTable, TableRef};
use crate::core::users::UsersTable;
use crate::ui::{
    flatten_rows, format_disk_row, format_process_row, format_realtime, process_header,
};

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub count: Option<u64>,
    pub interval_ms: u64,
    pub json: bool,
    pub tree: bool,
    pub user: Option<u32>,
    pub limit: Option<usize>,
}

/// One cycle, as printed in JSON mode
#[derive(Serialize)]
struct CycleReport<'a> {
    realtime: Realtime,
    monotonic_ms: u64,
    elapsed_ms: u64,
    max_user_id: u32,
    parent_loops: &'a [u32],
    processes: Vec<&'a Entity>,
    disks: Vec<DiskRow>,
}

pub fn execute(matches: &ArgMatches) -> Result<()> {
    let path = resolve_path(matches)?;
    let config = Config::load_from(&path)
        .with_context(|| format!("Failed to load config from {:?}", path))?;

    let options = ScanOptions {
        count: matches.get_one::<u64>("count").copied(),
        interval_ms: matches
            .get_one::<u64>("interval")
            .copied()
            .unwrap_or(config.refresh_interval_ms),
        json: matches.get_flag("json"),
        tree: matches.get_flag("tree"),
        user: matches.get_one::<u32>("user").copied(),
        limit: matches.get_one::<usize>("limit").copied(),
    };

    run(&config, &options)
}

pub fn run(config: &Config, options: &ScanOptions) -> Result<()> {
    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))
            .context("Failed to install Ctrl-C handler")?;
    }

    let settings = Settings::from_config(config).shared();
    let users = UsersTable::load().shared();

    let mut machine = Machine::new(users, options.user);
    machine.populate_tables_from_settings(
        settings,
        ProcessTable::new(Box::new(SysinfoProcessSource::new())),
    );
    machine.set_tables_panel(PanelHandle::new(0));

    let mut cycle = 0u64;
    while running.load(Ordering::SeqCst) {
        machine.scan_tables().context("Scan cycle failed")?;
        cycle += 1;

        print_cycle(&machine, options)?;

        if options.count.is_some_and(|count| cycle >= count) {
            break;
        }
        std::thread::sleep(Duration::from_millis(options.interval_ms));
    }

    info!("{} cycle(s) completed", cycle);
    machine.done();
    Ok(())
}

fn visible_rows<'a>(machine: &'a Machine, options: &ScanOptions) -> Vec<&'a Entity> {
    let Some(table) = machine.process_table() else {
        return Vec::new();
    };
    let mut rows: Vec<&Entity> = table
        .rows()
        .iter()
        .filter(|row| options.user.is_none_or(|uid| row.user_id == uid))
        .collect();
    rows.sort_by(|a, b| b.accumulated_or_raw().cmp(&a.accumulated_or_raw()));
    if let Some(limit) = options.limit {
        rows.truncate(limit);
    }
    rows
}

fn disk_rows(machine: &Machine) -> Vec<DiskRow> {
    machine
        .tables()
        .iter()
        .filter_map(|table| match table {
            TableRef::Shared(handle) => {
                let table = handle.borrow();
                let rows = table
                    .as_any()
                    .downcast_ref::<DiskTable>()
                    .map(|disks| disks.rows().to_vec());
                rows
            }
            TableRef::Primary => None,
        })
        .flatten()
        .collect()
}

fn print_cycle(machine: &Machine, options: &ScanOptions) -> Result<()> {
    if options.json {
        let report = CycleReport {
            realtime: machine.realtime(),
            monotonic_ms: machine.monotonic_ms(),
            elapsed_ms: machine.monotonic_ms().saturating_sub(machine.prev_monotonic_ms()),
            max_user_id: machine.max_user_id(),
            parent_loops: &machine.last_accumulation().cycles,
            processes: visible_rows(machine, options),
            disks: disk_rows(machine),
        };
        println!("{}", serde_json::to_string(&report)?);
        return Ok(());
    }

    let widths = machine.field_widths();
    println!(
        "{} {}  {} process(es)",
        "Scan at".bold(),
        format_realtime(machine.realtime()),
        machine.process_table().map_or(0, |t| t.rows().len())
    );
    println!("{}", process_header(widths).reversed());

    if options.tree && options.user.is_none() {
        if let Some(table) = machine.process_table() {
            let rows = table.rows();
            let flat = flatten_rows(rows);
            let shown = options.limit.unwrap_or(flat.len());
            for entry in flat.iter().take(shown) {
                let row = &rows[entry.index];
                let user = machine.user_name(row.user_id);
                let indent = entry.indent();
                println!(
                    "{}",
                    format_process_row(row, widths, user.as_deref(), &indent)
                );
            }
        }
    } else {
        for row in visible_rows(machine, options) {
            let user = machine.user_name(row.user_id);
            println!("{}", format_process_row(row, widths, user.as_deref(), ""));
        }
    }

    let disks = disk_rows(machine);
    if !disks.is_empty() {
        println!();
        for disk in &disks {
            println!("{}", format_disk_row(disk, widths));
        }
    }

    if machine.last_accumulation().has_cycles() {
        println!(
            "{} {:?}",
            "Parent loops ignored for:".yellow(),
            machine.last_accumulation().cycles
        );
    }
    println!();
    Ok(())
}
