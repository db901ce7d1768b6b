//! Host-wide readings: identity, CPU jiffies, memory, disks and sensors.

use async_trait::async_trait;
use sysinfo::{Disks, System};

use super::procfs;
use crate::core::system_monitor::{
    CpuTimes, DiskMetrics, HostIdentity, HostSource, MemoryMetrics, SwapMetrics,
};
use crate::error::{PulseError, Result};

const PROC_STAT: &str = "/proc/stat";
const PROC_MEMINFO: &str = "/proc/meminfo";
const THERMAL_ZONES: usize = 10;

#[derive(Debug, Default)]
pub struct LinuxHost;

impl LinuxHost {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl HostSource for LinuxHost {
    async fn identity(&self) -> Result<HostIdentity> {
        Ok(HostIdentity {
            hostname: System::host_name().unwrap_or_else(|| "unknown".to_string()),
            kernel: System::kernel_version().unwrap_or_else(|| "unknown".to_string()),
            uptime_secs: System::uptime(),
        })
    }

    async fn cpu_times(&self) -> Result<Vec<(String, CpuTimes)>> {
        let content = tokio::fs::read_to_string(PROC_STAT).await?;
        procfs::parse_proc_stat(&content)
    }

    async fn load_average(&self) -> Result<[f64; 3]> {
        let load = System::load_average();
        Ok([load.one, load.five, load.fifteen])
    }

    async fn memory(&self) -> Result<(MemoryMetrics, SwapMetrics)> {
        let content = tokio::fs::read_to_string(PROC_MEMINFO).await?;
        procfs::parse_meminfo(&content)
    }

    async fn disks(&self) -> Result<Vec<DiskMetrics>> {
        tokio::task::spawn_blocking(|| {
            let disks = Disks::new_with_refreshed_list();
            disks
                .list()
                .iter()
                .map(|disk| {
                    let size = disk.total_space();
                    let avail = disk.available_space();
                    DiskMetrics {
                        device: disk.name().to_string_lossy().to_string(),
                        mount: disk.mount_point().to_string_lossy().to_string(),
                        fstype: disk.file_system().to_string_lossy().to_string(),
                        size,
                        used: size.saturating_sub(avail),
                        avail,
                    }
                })
                .collect()
        })
        .await
        .map_err(|e| PulseError::command(format!("disk enumeration task failed: {}", e)))
    }

    async fn core_frequencies(&self, cores: usize) -> Result<Vec<u32>> {
        let mut freqs = Vec::with_capacity(cores);
        for core in 0..cores {
            let path = format!("/sys/devices/system/cpu/cpu{}/cpufreq/scaling_cur_freq", core);
            let mhz = match tokio::fs::read_to_string(&path).await {
                Ok(content) => procfs::parse_frequency_khz(&content).unwrap_or(0),
                Err(_) => 0,
            };
            freqs.push(mhz);
        }
        Ok(freqs)
    }

    async fn temperatures(&self) -> Result<Vec<f64>> {
        let mut temps = Vec::new();
        for zone in 0..THERMAL_ZONES {
            let path = format!("/sys/class/thermal/thermal_zone{}/temp", zone);
            let Ok(content) = tokio::fs::read_to_string(&path).await else {
                break;
            };
            if let Some(celsius) = procfs::parse_thermal_millidegrees(&content) {
                temps.push(celsius);
            }
        }
        Ok(temps)
    }
}
