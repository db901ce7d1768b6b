use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;

use crate::core::system_monitor::{ProcessTerminator, SignalKind};

pub fn execute(matches: &ArgMatches) -> Result<()> {
    let raw_pid = matches
        .get_one::<String>("pid")
        .context("PID argument is required")?;
    let raw_signal = matches
        .get_one::<String>("signal")
        .map(String::as_str)
        .unwrap_or("TERM");

    let kind: SignalKind = raw_signal.parse()?;
    let pid = ProcessTerminator::parse_pid(raw_pid)?;

    match ProcessTerminator::default().terminate(pid, kind) {
        Ok(()) => {
            println!("{} sent SIG{} to {}", "✓".green().bold(), kind.name(), pid);
            Ok(())
        }
        Err(failure) => {
            eprintln!("{} {}", "✗".red().bold(), failure);
            Err(failure.into())
        }
    }
}
