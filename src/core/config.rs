use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::PulseError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the HTTP server listens on
    pub bind: String,
    /// Nominal tick cadence of the broadcaster
    pub interval_ms: u64,
    /// CPU deltas computed over a longer window are reported as stale
    pub cpu_freshness_ms: u64,
    /// Network deltas computed over a longer window are reported as stale
    pub network_freshness_ms: u64,
    pub probes: ProbeIntervals,
    pub timeouts: Timeouts,
    /// host:port used for the reachability check
    pub connectivity_target: String,
    pub public_ip_url: String,
    /// Snapshots buffered per subscriber before ticks are skipped for it
    pub stream_buffer: usize,
    /// Number of processes embedded in every snapshot
    pub snapshot_process_limit: usize,
}

/// Refresh cadence of each slow probe. Zero means "every tick".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeIntervals {
    pub frequency_ms: u64,
    pub thermal_ms: u64,
    pub connectivity_ms: u64,
    pub public_ip_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub command_ms: u64,
    pub process_table_ms: u64,
    pub connectivity_ms: u64,
    pub public_ip_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            interval_ms: 1000,
            cpu_freshness_ms: 2000,
            network_freshness_ms: 5000,
            probes: ProbeIntervals::default(),
            timeouts: Timeouts::default(),
            connectivity_target: "1.1.1.1:443".to_string(),
            public_ip_url: "https://api.ipify.org".to_string(),
            stream_buffer: 8,
            snapshot_process_limit: 200,
        }
    }
}

impl Default for ProbeIntervals {
    fn default() -> Self {
        Self {
            frequency_ms: 0,
            thermal_ms: 0,
            connectivity_ms: 30_000,
            public_ip_ms: 300_000,
        }
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            command_ms: 1000,
            process_table_ms: 3000,
            connectivity_ms: 2000,
            public_ip_ms: 3000,
        }
    }
}

impl Config {
    /// Load the config from the user's config directory, falling back to defaults
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let data = fs::read(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        if data.is_empty() {
            return Ok(Config::default());
        }

        // A corrupt file must not keep the collector from starting
        let config = serde_json::from_slice(&data).unwrap_or_else(|e| {
            log::warn!(
                "Ignoring unparseable config file {:?}: {}",
                config_path,
                e
            );
            Config::default()
        });

        Ok(config)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let data =
            serde_json::to_vec_pretty(self).with_context(|| "Failed to serialize config")?;

        fs::write(config_path, data)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().with_context(|| "Could not determine config directory")?;

        Ok(config_dir.join("hostpulse").join("config.json"))
    }

    pub fn validate(&self) -> std::result::Result<(), PulseError> {
        if self.interval_ms == 0 {
            return Err(PulseError::config("interval_ms must be greater than zero"));
        }
        if self.stream_buffer == 0 {
            return Err(PulseError::config("stream_buffer must be greater than zero"));
        }
        if self.bind.trim().is_empty() {
            return Err(PulseError::config("bind address must not be empty"));
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn cpu_freshness(&self) -> Duration {
        Duration::from_millis(self.cpu_freshness_ms)
    }

    pub fn network_freshness(&self) -> Duration {
        Duration::from_millis(self.network_freshness_ms)
    }
}
