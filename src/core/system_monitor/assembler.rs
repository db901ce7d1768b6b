//! Builds one immutable [`MetricsSnapshot`] per tick.
//!
//! All constituent reads run concurrently. A failed read degrades only its
//! own family to the documented default and is recorded in
//! `MetricsSnapshot::degraded`; it never aborts the snapshot.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use super::counters::{CounterStore, RawCounterSample};
use super::delta::{round1, DeltaResult};
use super::disks;
use super::metrics::*;
use super::probe_cache::SlowProbeCache;
use super::process_list::{select_processes, ProcessQuery, SortKey};
use super::sources::{ConnectivitySource, HostIdentity, RoutingInfoSource, Sources};
use crate::core::config::Config;
use crate::error::Result;
use crate::utils::format_uptime;

const AGGREGATE_CPU: &str = "cpu";
const INTERNET_KEY: &str = "internet";

/// Timing knobs of the assembler, derived from [`Config`]
#[derive(Debug, Clone)]
pub struct AssemblerSettings {
    pub cpu_freshness: Duration,
    pub network_freshness: Duration,
    pub frequency_interval: Duration,
    pub thermal_interval: Duration,
    pub connectivity_interval: Duration,
    pub public_ip_interval: Duration,
    pub process_limit: usize,
}

impl From<&Config> for AssemblerSettings {
    fn from(config: &Config) -> Self {
        Self {
            cpu_freshness: config.cpu_freshness(),
            network_freshness: config.network_freshness(),
            frequency_interval: Duration::from_millis(config.probes.frequency_ms),
            thermal_interval: Duration::from_millis(config.probes.thermal_ms),
            connectivity_interval: Duration::from_millis(config.probes.connectivity_ms),
            public_ip_interval: Duration::from_millis(config.probes.public_ip_ms),
            process_limit: config.snapshot_process_limit.max(1),
        }
    }
}

impl Default for AssemblerSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// Slow probes, each cached with its own cadence
#[derive(Default)]
struct SlowProbes {
    frequencies: SlowProbeCache<Vec<u32>>,
    temperatures: SlowProbeCache<Vec<f64>>,
    reachability: SlowProbeCache<bool>,
    public_ip: SlowProbeCache<String>,
}

/// Raw network reading taken during one tick
struct NetworkReading {
    interface: String,
    counters: Result<(u64, u64)>,
    local_ip: String,
    observed_at: Instant,
}

pub struct SnapshotAssembler {
    sources: Sources,
    settings: AssemblerSettings,
    store: CounterStore,
    probes: SlowProbes,
    seq: u64,
    last_ts: i64,
}

impl SnapshotAssembler {
    pub fn new(sources: Sources, settings: AssemblerSettings) -> Self {
        Self {
            sources,
            settings,
            store: CounterStore::new(),
            probes: SlowProbes::default(),
            seq: 0,
            last_ts: 0,
        }
    }

    /// Number of snapshots produced so far
    pub fn ticks(&self) -> u64 {
        self.seq
    }

    pub async fn assemble(&mut self) -> MetricsSnapshot {
        let sources = &self.sources;
        let probes = &self.probes;
        let settings = &self.settings;

        let host = &sources.host;
        let (identity, (cpu_times, cpu_observed_at, freq_mhz), load, memory, disk_list, processes, temps, network) = tokio::join!(
            host.identity(),
            async {
                let times = host.cpu_times().await;
                let observed_at = Instant::now();
                let cores = times.as_ref().map_or(0, |entries| {
                    entries.iter().filter(|(id, _)| id != AGGREGATE_CPU).count()
                });
                let host = Arc::clone(host);
                let freq = probes
                    .frequencies
                    .get("frequency", settings.frequency_interval, move || async move {
                        host.core_frequencies(cores).await
                    })
                    .await;
                (times, observed_at, freq)
            },
            host.load_average(),
            host.memory(),
            host.disks(),
            sources.processes.processes(),
            {
                let host = Arc::clone(host);
                probes
                    .temperatures
                    .get("thermal", settings.thermal_interval, move || async move {
                        host.temperatures().await
                    })
            },
            read_network(sources.routing.as_ref()),
        );

        let has_internet = probes.reachability.get_or_stale(
            INTERNET_KEY,
            settings.connectivity_interval,
            connectivity_probe(Arc::clone(&sources.connectivity)),
        );

        let mut degraded = Vec::new();

        let host_info = match identity {
            Ok(identity) => host_info(identity),
            Err(e) => {
                degrade(&mut degraded, "host", &e);
                HostInfo::unknown()
            }
        };

        let cpu_deltas = match cpu_times {
            Ok(times) => Some(self.store.update_cpu(
                RawCounterSample::new(times, cpu_observed_at),
                settings.cpu_freshness,
            )),
            Err(e) => {
                degrade(&mut degraded, "cpu", &e);
                None
            }
        };

        let load_avg = match load {
            Ok(load) => load.map(|l| (l * 100.0).round() / 100.0),
            Err(e) => {
                degrade(&mut degraded, "load", &e);
                [0.0; 3]
            }
        };

        let (per_core_pct, total_pct) = split_cpu_deltas(cpu_deltas.as_deref().unwrap_or(&[]));
        let cpu = CpuMetrics {
            cores: per_core_pct.len(),
            total_pct,
            per_core_pct,
            freq_mhz,
            load_avg,
            temps_c: temps,
        };

        let (mem, swap) = match memory {
            Ok(pair) => pair,
            Err(e) => {
                degrade(&mut degraded, "memory", &e);
                (MemoryMetrics::default(), SwapMetrics::default())
            }
        };

        let disks = match disk_list {
            Ok(list) => disks::filter_and_sort(list),
            Err(e) => {
                degrade(&mut degraded, "disks", &e);
                Vec::new()
            }
        };

        let processes = match processes {
            Ok(records) => select_processes(
                records,
                &ProcessQuery {
                    sort: SortKey::Cpu,
                    filter: String::new(),
                    limit: settings.process_limit,
                },
            ),
            Err(e) => {
                degrade(&mut degraded, "processes", &e);
                ProcessSummary::default()
            }
        };

        let net = match network {
            Ok(Some(reading)) => {
                let public_ip = if has_internet {
                    probes.public_ip.get_or_stale(
                        &reading.interface,
                        settings.public_ip_interval,
                        public_ip_probe(Arc::clone(&sources.connectivity)),
                    )
                } else {
                    String::new()
                };
                self.network_metrics(reading, has_internet, public_ip, &mut degraded)
            }
            Ok(None) => {
                self.store.clear_network();
                NetworkMetrics::default()
            }
            Err(e) => {
                degrade(&mut degraded, "network", &e);
                self.store.clear_network();
                NetworkMetrics::default()
            }
        };

        self.seq += 1;
        self.last_ts = self.last_ts.max(chrono::Utc::now().timestamp_millis());

        log::trace!("Assembled snapshot #{}", self.seq);

        MetricsSnapshot {
            ts: self.last_ts,
            seq: self.seq,
            host: host_info,
            cpu,
            mem,
            swap,
            net,
            disks,
            processes,
            degraded,
        }
    }

    fn network_metrics(
        &mut self,
        reading: NetworkReading,
        has_internet: bool,
        public_ip: String,
        degraded: &mut Vec<String>,
    ) -> NetworkMetrics {
        let (rx_total, tx_total) = match reading.counters {
            Ok(totals) => totals,
            Err(e) => {
                degrade(degraded, "network", &e);
                self.store.clear_network();
                return NetworkMetrics {
                    active_interface: reading.interface,
                    local_ip: reading.local_ip,
                    ..Default::default()
                };
            }
        };

        let deltas = self.store.update_network(
            RawCounterSample::single(&reading.interface, rx_total, reading.observed_at),
            RawCounterSample::single(&reading.interface, tx_total, reading.observed_at),
            self.settings.network_freshness,
        );

        NetworkMetrics {
            active_interface: reading.interface,
            public_ip,
            local_ip: reading.local_ip,
            rx_bps: whole_rate(deltas.rx.first()),
            tx_bps: whole_rate(deltas.tx.first()),
            rx_total,
            tx_total,
            has_internet,
        }
    }
}

impl HostInfo {
    fn unknown() -> Self {
        Self {
            hostname: String::new(),
            kernel: "unknown".to_string(),
            uptime_sec: 0,
            uptime_formatted: format_uptime(0),
        }
    }
}

fn host_info(identity: HostIdentity) -> HostInfo {
    HostInfo {
        hostname: identity.hostname,
        kernel: identity.kernel,
        uptime_sec: identity.uptime_secs,
        uptime_formatted: format_uptime(identity.uptime_secs),
    }
}

fn degrade(degraded: &mut Vec<String>, family: &str, error: &crate::error::PulseError) {
    log::warn!("Failed to read {} metrics, reporting defaults: {}", family, error);
    if !degraded.iter().any(|f| f == family) {
        degraded.push(family.to_string());
    }
}

/// Per-core percentages (every non-aggregate entity, in order) and the total
fn split_cpu_deltas(deltas: &[DeltaResult]) -> (Vec<f64>, f64) {
    let total = deltas
        .iter()
        .find(|d| d.entity_id == AGGREGATE_CPU)
        .map(|d| round1(d.value))
        .unwrap_or(0.0);
    let per_core = deltas
        .iter()
        .filter(|d| d.entity_id != AGGREGATE_CPU)
        .map(|d| round1(d.value))
        .collect();
    (per_core, total)
}

fn whole_rate(delta: Option<&DeltaResult>) -> u64 {
    delta
        .filter(|d| d.is_fresh())
        .map(|d| d.value.round() as u64)
        .unwrap_or(0)
}

async fn read_network(routing: &dyn RoutingInfoSource) -> Result<Option<NetworkReading>> {
    let Some(interface) = routing.default_interface().await? else {
        return Ok(None);
    };

    let (counters, local_ip) = tokio::join!(
        async {
            let counters = routing.interface_counters(&interface).await;
            (counters, Instant::now())
        },
        routing.local_ip(&interface),
    );
    let (counters, observed_at) = counters;

    let local_ip = local_ip.unwrap_or_else(|e| {
        log::warn!("Failed to read address of {}: {}", interface, e);
        String::new()
    });

    Ok(Some(NetworkReading {
        interface,
        counters,
        local_ip,
        observed_at,
    }))
}

fn connectivity_probe(
    connectivity: Arc<dyn ConnectivitySource>,
) -> impl FnOnce() -> futures_util::future::BoxFuture<'static, Result<bool>> {
    move || Box::pin(async move { connectivity.has_internet().await })
}

fn public_ip_probe(
    connectivity: Arc<dyn ConnectivitySource>,
) -> impl FnOnce() -> futures_util::future::BoxFuture<'static, Result<String>> {
    move || Box::pin(async move { connectivity.public_ip().await })
}
