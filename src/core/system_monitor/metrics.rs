use serde::{Deserialize, Serialize};

/// Sentinel reported as the active interface when there is no default route
pub const NO_INTERFACE: &str = "none";

/// Complete metrics snapshot pushed to every subscriber once per tick.
///
/// Every field is always present; families whose probe failed carry their
/// default value and are listed in `degraded`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Milliseconds since the Unix epoch
    pub ts: i64,
    /// Tick number within the current broadcaster run (1-based)
    pub seq: u64,
    pub host: HostInfo,
    pub cpu: CpuMetrics,
    pub mem: MemoryMetrics,
    pub swap: SwapMetrics,
    pub net: NetworkMetrics,
    pub disks: Vec<DiskMetrics>,
    pub processes: ProcessSummary,
    pub degraded: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostInfo {
    pub hostname: String,
    pub kernel: String,
    pub uptime_sec: u64,
    pub uptime_formatted: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuMetrics {
    pub cores: usize,
    pub total_pct: f64,
    pub per_core_pct: Vec<f64>,
    /// MHz per core, 0 when unknown
    #[serde(rename = "freqMHz")]
    pub freq_mhz: Vec<u32>,
    /// 1, 5 and 15 minute averages
    pub load_avg: [f64; 3],
    pub temps_c: Vec<f64>,
}

/// All values in bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryMetrics {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub available: u64,
    pub buffers: u64,
    pub cached: u64,
}

/// All values in bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SwapMetrics {
    pub total: u64,
    pub used: u64,
    pub free: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkMetrics {
    pub active_interface: String,
    /// Empty when unknown
    pub public_ip: String,
    pub local_ip: String,
    pub rx_bps: u64,
    pub tx_bps: u64,
    pub rx_total: u64,
    pub tx_total: u64,
    pub has_internet: bool,
}

impl Default for NetworkMetrics {
    fn default() -> Self {
        Self {
            active_interface: NO_INTERFACE.to_string(),
            public_ip: String::new(),
            local_ip: String::new(),
            rx_bps: 0,
            tx_bps: 0,
            rx_total: 0,
            tx_total: 0,
            has_internet: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiskMetrics {
    pub device: String,
    pub mount: String,
    pub fstype: String,
    pub size: u64,
    pub used: u64,
    pub avail: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessSummary {
    /// Number of processes matching the query before truncation
    pub total: usize,
    pub list: Vec<ProcessRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRecord {
    pub pid: u32,
    pub user: String,
    pub command: String,
    /// Percent of one CPU
    pub cpu: f64,
    /// Percent of physical memory
    pub mem: f64,
    #[serde(rename = "rssMB")]
    pub rss_mb: u64,
    pub elapsed_seconds: u64,
    /// Formatted `elapsed_seconds`
    pub etime: String,
    pub ni: i32,
    pub state: String,
}
