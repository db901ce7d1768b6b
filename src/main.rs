use anyhow::Result;
use clap::{value_parser, Arg, ArgAction, Command};

use hostpulse::commands;

fn config_arg() -> Arg {
    Arg::new("config")
        .long("config")
        .value_name("PATH")
        .help("Read settings from this JSON file instead of the default location")
}

fn main() -> Result<()> {
    hostpulse::init_logging();

    let matches = Command::new("hostpulse")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Live host metrics over HTTP")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("serve")
                .about("Stream live metrics over HTTP (SSE) and serve the process endpoints")
                .arg(
                    Arg::new("bind")
                        .short('b')
                        .long("bind")
                        .value_name("ADDR")
                        .help("Address to listen on (default 127.0.0.1:3000)"),
                )
                .arg(
                    Arg::new("interval")
                        .short('i')
                        .long("interval")
                        .value_name("MS")
                        .value_parser(value_parser!(u64).range(1..))
                        .help("Tick interval in milliseconds (default 1000)"),
                )
                .arg(config_arg()),
        )
        .subcommand(
            Command::new("snapshot")
                .about("Print a single metrics snapshot as JSON")
                .arg(
                    Arg::new("pretty")
                        .short('p')
                        .long("pretty")
                        .help("Pretty-print the JSON")
                        .action(ArgAction::SetTrue),
                )
                .arg(config_arg()),
        )
        .subcommand(
            Command::new("ps")
                .about("List processes sorted by CPU or memory")
                .arg(
                    Arg::new("sort")
                        .short('s')
                        .long("sort")
                        .value_name("KEY")
                        .help("Sort key: cpu or mem")
                        .default_value("cpu"),
                )
                .arg(
                    Arg::new("filter")
                        .short('f')
                        .long("filter")
                        .value_name("TEXT")
                        .help("Only show processes whose command, user or PID contains TEXT"),
                )
                .arg(
                    Arg::new("limit")
                        .short('n')
                        .long("limit")
                        .value_name("N")
                        .help("Maximum number of processes to show")
                        .default_value("25"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Output JSON instead of a table")
                        .action(ArgAction::SetTrue),
                )
                .arg(config_arg()),
        )
        .subcommand(
            Command::new("kill")
                .about("Send TERM or KILL to a process")
                .arg(
                    Arg::new("pid")
                        .help("Process ID")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("signal")
                        .short('s')
                        .long("signal")
                        .value_name("SIGNAL")
                        .help("TERM (graceful) or KILL (forceful)")
                        .default_value("TERM"),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("serve", sub_matches)) => commands::serve(sub_matches)?,
        Some(("snapshot", sub_matches)) => commands::snapshot(sub_matches)?,
        Some(("ps", sub_matches)) => commands::ps(sub_matches)?,
        Some(("kill", sub_matches)) => commands::kill(sub_matches)?,
        _ => {
            println!("Use 'hostpulse --help' for more information.");
        }
    }

    Ok(())
}
