use anyhow::{Context, Result};
use clap::ArgMatches;

use crate::core::system_monitor::{AssemblerSettings, SnapshotAssembler, Sources};

/// Print one snapshot as JSON.
///
/// Two ticks are assembled one interval apart so that rates and CPU
/// percentages have a baseline.
pub fn execute(matches: &ArgMatches) -> Result<()> {
    let config = super::load_config(matches)?;
    config.validate().context("Invalid configuration")?;
    let pretty = matches.get_flag("pretty");

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let snapshot = runtime.block_on(async {
        let sources = Sources::system(&config)?;
        sources
            .preflight()
            .await
            .context("System counters are not readable")?;

        let mut assembler = SnapshotAssembler::new(sources, AssemblerSettings::from(&config));
        assembler.assemble().await;
        tokio::time::sleep(config.interval()).await;
        anyhow::Ok(assembler.assemble().await)
    })?;

    let json = if pretty {
        serde_json::to_string_pretty(&snapshot)?
    } else {
        serde_json::to_string(&snapshot)?
    };
    println!("{}", json);

    Ok(())
}
