// Output formatting helpers

use chrono::{DateTime, Local, Utc};
use colored::*;
use humansize::{format_size as humansize_format, BINARY};

use crate::core::clock::Realtime;
use crate::core::disk_table::DiskRow;
use crate::core::entity::Entity;
use crate::core::field_widths::{Field, FieldWidths};
use crate::core::topology::Topology;

/// Format byte count in human-readable format
pub fn format_size(size: u64) -> String {
    humansize_format(size, BINARY)
}

/// Format a scan timestamp as local time (YYYY-MM-DD HH:MM:SS)
pub fn format_realtime(realtime: Realtime) -> String {
    match DateTime::<Utc>::from_timestamp(realtime.secs, 0) {
        Some(utc) => utc
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        None => "-".to_string(),
    }
}

pub fn process_header(widths: &FieldWidths) -> String {
    format!(
        "{:>pid$} {:>pid$} {:<user$} {:>10} {:>10} {}",
        "PID",
        "PPID",
        Field::User.title(),
        "RES",
        "ACC RES",
        Field::Command.title(),
        pid = widths.pid_digits(),
        user = widths.width(Field::User).max(widths.uid_digits()),
    )
}

/// One process line; `user` falls back to the numeric id.
pub fn format_process_row(
    row: &Entity,
    widths: &FieldWidths,
    user: Option<&str>,
    indent: &str,
) -> String {
    let user = user
        .map(str::to_string)
        .unwrap_or_else(|| row.user_id.to_string());
    let accumulated = row
        .accumulated_resident()
        .map(format_size)
        .unwrap_or_else(|| "-".to_string());

    format!(
        "{:>pid$} {:>pid$} {:<user_w$} {:>10} {:>10} {}{}",
        row.id,
        row.parent,
        user,
        format_size(row.resident),
        accumulated.bold(),
        indent.dimmed(),
        row.name,
        pid = widths.pid_digits(),
        user_w = widths.width(Field::User).max(widths.uid_digits()),
    )
}

pub fn format_disk_row(row: &DiskRow, widths: &FieldWidths) -> String {
    let usage = format!("{:5.1}%", row.usage_percent());
    let usage = if row.usage_percent() >= 90.0 {
        usage.red().to_string()
    } else {
        usage
    };
    format!(
        "{:<mount$} {:>10} {:>10} {} {}",
        row.mount_point,
        format_size(row.used_bytes()),
        format_size(row.total_bytes),
        usage,
        row.fs_type.dimmed(),
        mount = widths.width(Field::MountPoint),
    )
}

pub fn format_topology(topology: &Topology) -> Vec<String> {
    let mut lines = vec![format!(
        "{} package(s), {} core(s), {} processing unit(s)",
        topology.package_count(),
        topology.core_count(),
        topology.processing_unit_count()
    )
    .bold()
    .to_string()];

    for package in &topology.packages {
        lines.push(format!("Package {}", package.id));
        for core in &package.cores {
            let pus: Vec<String> = core.processing_units.iter().map(u32::to_string).collect();
            lines.push(format!("  Core {:<3} PU {}", core.id, pus.join(",")));
        }
    }
    for cache in &topology.caches {
        let size = cache
            .size_kb
            .map(|kb| format_size(kb * 1024))
            .unwrap_or_else(|| "?".to_string());
        lines.push(format!(
            "L{} {:<12} {:>10}  cpus {}",
            cache.level, cache.kind, size, cache.shared_cpus
        ));
    }
    lines
}
