use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;

use crate::server::run_server;

pub fn execute(matches: &ArgMatches) -> Result<()> {
    let mut config = super::load_config(matches)?;

    if let Some(bind) = matches.get_one::<String>("bind") {
        config.bind = bind.clone();
    }
    if let Some(interval) = matches.get_one::<u64>("interval") {
        config.interval_ms = *interval;
    }
    config.validate().context("Invalid configuration")?;

    println!(
        "{} {} {}",
        "hostpulse".bold(),
        "streaming on".dimmed(),
        format!("http://{}/api/metrics/stream", config.bind).cyan()
    );

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime
        .block_on(run_server(&config))
        .context("Server failed")?;

    Ok(())
}
