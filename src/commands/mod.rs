// Command handlers module
pub mod kill;
pub mod ps;
pub mod serve;
pub mod snapshot;

// Re-exports for cleaner imports
pub use kill::execute as kill;
pub use ps::execute as ps;
pub use serve::execute as serve;
pub use snapshot::execute as snapshot;

use anyhow::{Context, Result};
use clap::ArgMatches;
use std::path::Path;

use crate::core::Config;

/// Load the config from `--config` or the default location
pub(crate) fn load_config(matches: &ArgMatches) -> Result<Config> {
    let config = match matches.try_get_one::<String>("config").ok().flatten() {
        Some(path) => Config::load_from(Path::new(path))
            .with_context(|| format!("Failed to load config from {}", path))?,
        None => Config::load()?,
    };
    Ok(config)
}
