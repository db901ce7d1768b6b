// Scriptable fake host shared by the integration tests

use async_trait::async_trait;
use hostpulse::core::system_monitor::*;
use hostpulse::error::{PulseError, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub struct ScriptedHost {
    pub ticks: AtomicU64,
    pub interface: Mutex<Option<String>>,
    pub rx_per_read: u64,
    pub fail_disks: bool,
    pub processes: Vec<ProcessRecord>,
}

impl Default for ScriptedHost {
    fn default() -> Self {
        Self {
            ticks: AtomicU64::new(0),
            interface: Mutex::new(Some("eth0".to_string())),
            rx_per_read: 1000,
            fail_disks: false,
            processes: Vec::new(),
        }
    }
}

impl ScriptedHost {
    pub fn sources(self: &Arc<Self>) -> Sources {
        Sources {
            host: self.clone(),
            routing: self.clone(),
            connectivity: self.clone(),
            processes: self.clone(),
        }
    }
}

#[async_trait]
impl HostSource for ScriptedHost {
    async fn identity(&self) -> Result<HostIdentity> {
        Ok(HostIdentity {
            hostname: "scripted".to_string(),
            kernel: "6.8.0".to_string(),
            uptime_secs: 90_061,
        })
    }

    async fn cpu_times(&self) -> Result<Vec<(String, CpuTimes)>> {
        let n = self.ticks.fetch_add(1, Ordering::SeqCst) + 1;
        let core = CpuTimes {
            user: 25 * n,
            system: 25 * n,
            idle: 50 * n,
            ..Default::default()
        };
        Ok(vec![("cpu".to_string(), core), ("cpu0".to_string(), core)])
    }

    async fn load_average(&self) -> Result<[f64; 3]> {
        Ok([1.0, 1.0, 1.0])
    }

    async fn memory(&self) -> Result<(MemoryMetrics, SwapMetrics)> {
        Ok(Default::default())
    }

    async fn disks(&self) -> Result<Vec<DiskMetrics>> {
        if self.fail_disks {
            return Err(PulseError::command("df hung"));
        }
        Ok(vec![
            DiskMetrics {
                device: "/dev/nvme0n1p2".to_string(),
                mount: "/home".to_string(),
                fstype: "ext4".to_string(),
                size: 500,
                used: 100,
                avail: 400,
            },
            DiskMetrics {
                device: "/dev/nvme0n1p1".to_string(),
                mount: "/".to_string(),
                fstype: "ext4".to_string(),
                size: 100,
                used: 50,
                avail: 50,
            },
        ])
    }

    async fn core_frequencies(&self, cores: usize) -> Result<Vec<u32>> {
        Ok(vec![3000; cores])
    }

    async fn temperatures(&self) -> Result<Vec<f64>> {
        Ok(vec![50.0])
    }
}

#[async_trait]
impl RoutingInfoSource for ScriptedHost {
    async fn default_interface(&self) -> Result<Option<String>> {
        Ok(self.interface.lock().clone())
    }

    async fn interface_counters(&self, _interface: &str) -> Result<(u64, u64)> {
        let n = self.ticks.load(Ordering::SeqCst);
        Ok((self.rx_per_read * n, 0))
    }

    async fn local_ip(&self, _interface: &str) -> Result<String> {
        Ok("10.0.0.5".to_string())
    }
}

#[async_trait]
impl ConnectivitySource for ScriptedHost {
    async fn has_internet(&self) -> Result<bool> {
        Ok(true)
    }

    async fn public_ip(&self) -> Result<String> {
        Ok("203.0.113.7".to_string())
    }
}

#[async_trait]
impl ProcessTableSource for ScriptedHost {
    async fn processes(&self) -> Result<Vec<ProcessRecord>> {
        Ok(self.processes.clone())
    }
}
