//! In-memory sources for unit tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

use super::counters::CpuTimes;
use super::metrics::*;
use super::sources::*;
use crate::error::{PulseError, Result};

/// A host with two cores at a steady 10% load, no network and a fixed process table.
///
/// `disk_delay` makes every assembly take that long, which holds a tick in
/// flight for as long as a test needs.
#[derive(Default)]
pub struct FakeSystem {
    pub(crate) reads: AtomicU64,
    pub(crate) disk_reads: AtomicU64,
    pub(crate) disk_read_started: Notify,
    pub broken_cpu: bool,
    pub disk_delay: Duration,
    pub processes: Mutex<Vec<ProcessRecord>>,
}

impl FakeSystem {
    pub fn with_processes(processes: Vec<ProcessRecord>) -> Self {
        Self {
            processes: Mutex::new(processes),
            ..Default::default()
        }
    }

    pub fn with_disk_delay(disk_delay: Duration) -> Self {
        Self {
            disk_delay,
            ..Default::default()
        }
    }

    pub fn into_sources(self) -> Sources {
        Arc::new(self).sources()
    }

    pub fn sources(self: &Arc<Self>) -> Sources {
        Sources {
            host: self.clone(),
            routing: self.clone(),
            connectivity: self.clone(),
            processes: self.clone(),
        }
    }

    /// Number of assemblies that have started reading disks
    pub fn disk_reads(&self) -> u64 {
        self.disk_reads.load(Ordering::SeqCst)
    }

    /// Resolve once assembly number `n` has started
    pub async fn assembly_started(&self, n: u64) {
        loop {
            let notified = self.disk_read_started.notified();
            if self.disk_reads() >= n {
                return;
            }
            notified.await;
        }
    }
}

#[async_trait]
impl HostSource for FakeSystem {
    async fn identity(&self) -> Result<HostIdentity> {
        Ok(HostIdentity {
            hostname: "fakehost".to_string(),
            kernel: "6.6.0-test".to_string(),
            uptime_secs: 120,
        })
    }

    async fn cpu_times(&self) -> Result<Vec<(String, CpuTimes)>> {
        if self.broken_cpu {
            return Err(PulseError::command("/proc is not mounted"));
        }
        let n = self.reads.fetch_add(1, Ordering::SeqCst) + 1;
        let times = CpuTimes {
            user: 10 * n,
            idle: 90 * n,
            ..Default::default()
        };
        Ok(vec![
            ("cpu".to_string(), times),
            ("cpu0".to_string(), times),
            ("cpu1".to_string(), times),
        ])
    }

    async fn load_average(&self) -> Result<[f64; 3]> {
        Ok([0.5, 0.25, 0.1])
    }

    async fn memory(&self) -> Result<(MemoryMetrics, SwapMetrics)> {
        Ok(Default::default())
    }

    async fn disks(&self) -> Result<Vec<DiskMetrics>> {
        self.disk_reads.fetch_add(1, Ordering::SeqCst);
        self.disk_read_started.notify_waiters();
        if !self.disk_delay.is_zero() {
            tokio::time::sleep(self.disk_delay).await;
        }
        Ok(Vec::new())
    }

    async fn core_frequencies(&self, cores: usize) -> Result<Vec<u32>> {
        Ok(vec![0; cores])
    }

    async fn temperatures(&self) -> Result<Vec<f64>> {
        Ok(Vec::new())
    }
}

#[async_trait]
impl RoutingInfoSource for FakeSystem {
    async fn default_interface(&self) -> Result<Option<String>> {
        Ok(None)
    }

    async fn interface_counters(&self, _interface: &str) -> Result<(u64, u64)> {
        Ok((0, 0))
    }

    async fn local_ip(&self, _interface: &str) -> Result<String> {
        Ok(String::new())
    }
}

#[async_trait]
impl ConnectivitySource for FakeSystem {
    async fn has_internet(&self) -> Result<bool> {
        Ok(false)
    }

    async fn public_ip(&self) -> Result<String> {
        Ok(String::new())
    }
}

#[async_trait]
impl ProcessTableSource for FakeSystem {
    async fn processes(&self) -> Result<Vec<ProcessRecord>> {
        Ok(self.processes.lock().clone())
    }
}
