//! Narrow interfaces to the operating system.
//!
//! The sampling core only depends on these traits and on the failure modes of
//! their results; how a value is obtained (procfs, sysfs, a subprocess, a
//! network round-trip) is an implementation detail of `crate::platform`.

use async_trait::async_trait;
use std::sync::Arc;

use super::counters::CpuTimes;
use super::metrics::{DiskMetrics, MemoryMetrics, ProcessRecord, SwapMetrics};
use crate::core::config::Config;
use crate::error::Result;

/// Host identity without the formatted uptime
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostIdentity {
    pub hostname: String,
    pub kernel: String,
    pub uptime_secs: u64,
}

#[async_trait]
pub trait HostSource: Send + Sync {
    async fn identity(&self) -> Result<HostIdentity>;

    /// Aggregate entry `cpu` first, then one entry per core (`cpu0`, `cpu1`, ...)
    async fn cpu_times(&self) -> Result<Vec<(String, CpuTimes)>>;

    async fn load_average(&self) -> Result<[f64; 3]>;

    async fn memory(&self) -> Result<(MemoryMetrics, SwapMetrics)>;

    /// Mounted filesystems, unfiltered
    async fn disks(&self) -> Result<Vec<DiskMetrics>>;

    /// Current frequency of each of the first `cores` cores in MHz, 0 when unknown
    async fn core_frequencies(&self, cores: usize) -> Result<Vec<u32>>;

    /// Thermal zone readings in °C
    async fn temperatures(&self) -> Result<Vec<f64>>;
}

#[async_trait]
pub trait RoutingInfoSource: Send + Sync {
    /// Interface carrying the default route, `None` when there is none
    async fn default_interface(&self) -> Result<Option<String>>;

    /// Cumulative `(rx_bytes, tx_bytes)` of an interface
    async fn interface_counters(&self, interface: &str) -> Result<(u64, u64)>;

    /// First IPv4 address of an interface, empty when it has none
    async fn local_ip(&self, interface: &str) -> Result<String>;
}

#[async_trait]
pub trait ConnectivitySource: Send + Sync {
    async fn has_internet(&self) -> Result<bool>;

    async fn public_ip(&self) -> Result<String>;
}

#[async_trait]
pub trait ProcessTableSource: Send + Sync {
    /// Every process currently known to the OS, in no particular order
    async fn processes(&self) -> Result<Vec<ProcessRecord>>;
}

/// The full set of OS collaborators used by the sampling core
#[derive(Clone)]
pub struct Sources {
    pub host: Arc<dyn HostSource>,
    pub routing: Arc<dyn RoutingInfoSource>,
    pub connectivity: Arc<dyn ConnectivitySource>,
    pub processes: Arc<dyn ProcessTableSource>,
}

impl Sources {
    /// Sources backed by the running Linux host
    pub fn system(config: &Config) -> Result<Self> {
        use crate::platform::system::linux::{
            InternetProbe, LinuxHost, LinuxRouting, PsProcessTable,
        };

        Ok(Self {
            host: Arc::new(LinuxHost::new()),
            routing: Arc::new(LinuxRouting::new(&config.timeouts)),
            connectivity: Arc::new(InternetProbe::new(config)?),
            processes: Arc::new(PsProcessTable::new(&config.timeouts)),
        })
    }

    /// Verify the sources needed for every tick are readable
    pub async fn preflight(&self) -> Result<()> {
        let times = self.host.cpu_times().await?;
        if times.is_empty() {
            return Err(crate::error::PulseError::startup(
                "no CPU counters available",
            ));
        }
        Ok(())
    }
}
