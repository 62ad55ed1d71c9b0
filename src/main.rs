use anyhow::Result;
use clap::{value_parser, Arg, ArgAction, Command};
use log::LevelFilter;

use scanmon::commands;

fn main() -> Result<()> {
    let matches = Command::new("scanmon")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Process scan monitor with accumulated memory per process tree")
        .disable_version_flag(true)
        .arg(
            Arg::new("version")
                .short('V')
                .long("version")
                .help("Print version information")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Use FILE instead of the default config location")
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increase log verbosity (-v debug, -vv trace)")
                .action(ArgAction::Count)
                .global(true),
        )
        .subcommand(
            Command::new("scan")
                .about("Run scan cycles and print the process table")
                .arg(
                    Arg::new("count")
                        .short('n')
                        .long("count")
                        .value_name("N")
                        .help("Stop after N cycles (default: run until Ctrl-C)")
                        .value_parser(value_parser!(u64).range(1..)),
                )
                .arg(
                    Arg::new("interval")
                        .short('i')
                        .long("interval")
                        .value_name("MS")
                        .help("Delay between cycles in milliseconds")
                        .value_parser(value_parser!(u64)),
                )
                .arg(
                    Arg::new("user")
                        .short('u')
                        .long("user")
                        .value_name("UID")
                        .help("Only show processes owned by UID")
                        .value_parser(value_parser!(u32)),
                )
                .arg(
                    Arg::new("limit")
                        .short('l')
                        .long("limit")
                        .value_name("ROWS")
                        .help("Print at most ROWS processes per cycle")
                        .value_parser(value_parser!(usize)),
                )
                .arg(
                    Arg::new("tree")
                        .short('t')
                        .long("tree")
                        .help("Show the process tree")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print one JSON document per cycle")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("topology")
                .about("Show the CPU topology of this host")
                .arg(
                    Arg::new("caches")
                        .long("caches")
                        .help("Include cache levels")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("root")
                        .long("root")
                        .value_name("DIR")
                        .help("Read topology from DIR instead of /sys/devices/system/cpu"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print as JSON")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Manage configuration (use 'scanmon config --help' for subcommands)")
                .subcommand_required(true)
                .arg_required_else_help(true)
                .subcommand(Command::new("show").about("Print the effective configuration"))
                .subcommand(
                    Command::new("init")
                        .about("Write the default configuration")
                        .arg(
                            Arg::new("force")
                                .short('f')
                                .long("force")
                                .help("Overwrite an existing file")
                                .action(ArgAction::SetTrue),
                        ),
                )
                .subcommand(Command::new("path").about("Print the config file location")),
        )
        .get_matches();

    if matches.get_flag("version") {
        println!("scanmon version {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let level = match matches.get_count("verbose") {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    scanmon::init_logging_with(level);

    match matches.subcommand() {
        Some(("scan", sub_matches)) => commands::scan(sub_matches)?,
        Some(("topology", sub_matches)) => commands::topology(sub_matches)?,
        Some(("config", sub_matches)) => commands::config(sub_matches)?,
        _ => {
            println!("Welcome to scanmon!");
            println!("Use 'scanmon --help' for more information.");
        }
    }

    Ok(())
}
