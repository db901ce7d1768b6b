use anyhow::{Context, Result};
use clap::ArgMatches;
use std::sync::Arc;

use crate::core::system_monitor::{ProcessLister, ProcessQuery, Sources};
use crate::ui::print_process_table;

pub fn execute(matches: &ArgMatches) -> Result<()> {
    let config = super::load_config(matches)?;

    let query = ProcessQuery::parse(
        matches.get_one::<String>("sort").map(String::as_str),
        matches.get_one::<String>("filter").map(String::as_str),
        matches.get_one::<String>("limit").map(String::as_str),
    )?;

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let summary = runtime.block_on(async {
        let sources = Sources::system(&config)?;
        let lister = ProcessLister::new(Arc::clone(&sources.processes));
        anyhow::Ok(lister.list(&query).await)
    })?;

    if matches.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_process_table(&summary);
    }

    Ok(())
}
