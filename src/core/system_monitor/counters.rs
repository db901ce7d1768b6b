//! Last-observed raw counters, owned by the sampling loop.

use std::time::Duration;
use tokio::time::Instant;

use super::delta::{compute_rate, DeltaResult};

/// Cumulative CPU time of one core (or the aggregate), in jiffies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTimes {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

impl CpuTimes {
    fn fields(&self) -> [u64; 8] {
        [
            self.user,
            self.nice,
            self.system,
            self.idle,
            self.iowait,
            self.irq,
            self.softirq,
            self.steal,
        ]
    }

    pub fn total(&self) -> u64 {
        self.fields().iter().sum()
    }

    /// Time not spent doing work (idle + iowait)
    pub fn idle_total(&self) -> u64 {
        self.idle + self.iowait
    }

    /// True if any field went backwards relative to `earlier`
    pub fn any_field_below(&self, earlier: &CpuTimes) -> bool {
        self.fields()
            .iter()
            .zip(earlier.fields().iter())
            .any(|(now, before)| now < before)
    }
}

/// One reading of a counter family: an ordered list of `(entity, value)`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCounterSample<T> {
    pub entities: Vec<(String, T)>,
    pub observed_at: Instant,
}

impl<T> RawCounterSample<T> {
    pub fn new(entities: Vec<(String, T)>, observed_at: Instant) -> Self {
        Self {
            entities,
            observed_at,
        }
    }

    pub fn single(entity: &str, value: T, observed_at: Instant) -> Self {
        Self::new(vec![(entity.to_string(), value)], observed_at)
    }
}

/// Holds the previous reading of each counter family.
///
/// Every update replaces the stored baseline with the new reading, so a
/// reading that arrives after a long gap is reported stale once and then
/// becomes the baseline for the next tick.
#[derive(Debug, Default)]
pub struct CounterStore {
    cpu: Option<RawCounterSample<CpuTimes>>,
    net_rx: Option<RawCounterSample<u64>>,
    net_tx: Option<RawCounterSample<u64>>,
}

/// Per-interface byte rates computed from one network update
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkDeltas {
    pub rx: Vec<DeltaResult>,
    pub tx: Vec<DeltaResult>,
}

impl CounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_cpu(
        &mut self,
        curr: RawCounterSample<CpuTimes>,
        freshness_bound: Duration,
    ) -> Vec<DeltaResult> {
        let deltas = compute_rate(self.cpu.as_ref(), &curr, freshness_bound);
        self.cpu = Some(curr);
        deltas
    }

    pub fn update_network(
        &mut self,
        rx: RawCounterSample<u64>,
        tx: RawCounterSample<u64>,
        freshness_bound: Duration,
    ) -> NetworkDeltas {
        let deltas = NetworkDeltas {
            rx: compute_rate(self.net_rx.as_ref(), &rx, freshness_bound),
            tx: compute_rate(self.net_tx.as_ref(), &tx, freshness_bound),
        };
        self.net_rx = Some(rx);
        self.net_tx = Some(tx);
        deltas
    }

    /// Forget the network baseline (the default route went away)
    pub fn clear_network(&mut self) {
        self.net_rx = None;
        self.net_tx = None;
    }

    pub fn has_cpu_baseline(&self) -> bool {
        self.cpu.is_some()
    }
}
