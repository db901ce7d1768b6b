//! Live host metrics: counter deltas, cached slow probes, snapshot assembly
//! and fan-out to subscribers, plus the on-demand process tools.

mod assembler;
mod broadcaster;
mod counters;
mod delta;
pub mod disks;
#[cfg(test)]
pub(crate) mod fakes;
mod metrics;
mod probe_cache;
mod process_list;
pub mod sources;
mod terminator;

pub use assembler::{AssemblerSettings, SnapshotAssembler};
pub use broadcaster::{Broadcaster, BroadcasterState, Subscription, SubscriptionId};
pub use counters::{CounterStore, CpuTimes, NetworkDeltas, RawCounterSample};
pub use delta::{compute_rate, round1, Counter, DeltaResult, Validity};
pub use metrics::{
    CpuMetrics, DiskMetrics, HostInfo, MemoryMetrics, MetricsSnapshot, NetworkMetrics,
    ProcessRecord, ProcessSummary, SwapMetrics, NO_INTERFACE,
};
pub use probe_cache::SlowProbeCache;
pub use process_list::{select_processes, ProcessLister, ProcessQuery, SortKey, DEFAULT_LIMIT, MAX_LIMIT};
pub use sources::{
    ConnectivitySource, HostIdentity, HostSource, ProcessTableSource, RoutingInfoSource, Sources,
};
pub use terminator::{ProcessTerminator, SignalKind, SignalSender, TerminateFailure};
