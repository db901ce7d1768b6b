//! Fan-out of snapshots to any number of subscribers.
//!
//! One tick loop owns the assembler (and with it the counter store and the
//! probe caches). Each subscriber gets a bounded channel; delivery never
//! awaits a slow consumer.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::assembler::{AssemblerSettings, SnapshotAssembler};
use super::metrics::MetricsSnapshot;
use super::sources::Sources;
use crate::error::{PulseError, Result};

pub type SubscriptionId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcasterState {
    Idle,
    Running,
    Stopped,
}

/// Receiving end of one registration
pub struct Subscription {
    id: SubscriptionId,
    rx: mpsc::Receiver<Arc<MetricsSnapshot>>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Next snapshot, or `None` once unsubscribed or the broadcaster stopped
    pub async fn recv(&mut self) -> Option<Arc<MetricsSnapshot>> {
        self.rx.recv().await
    }

    pub fn into_stream(self) -> impl futures_util::Stream<Item = Arc<MetricsSnapshot>> {
        futures_util::stream::unfold(self, |mut sub| async move {
            let snapshot = sub.recv().await?;
            Some((snapshot, sub))
        })
    }
}

/// Subscriber table shared by the tick loop and callers.
///
/// `generation` identifies the run that owns the table; a loop left behind
/// by an abandoned `stop` can neither deliver into nor close a newer run.
#[derive(Default)]
struct Registry {
    open: bool,
    generation: u64,
    next_id: SubscriptionId,
    sinks: BTreeMap<SubscriptionId, mpsc::Sender<Arc<MetricsSnapshot>>>,
    latest: Option<Arc<MetricsSnapshot>>,
}

struct RunHandle {
    generation: u64,
    shutdown_tx: broadcast::Sender<()>,
    task: JoinHandle<()>,
}

struct Lifecycle {
    state: BroadcasterState,
    run: Option<RunHandle>,
}

struct Inner {
    sources: Sources,
    settings: AssemblerSettings,
    buffer: usize,
    registry: Mutex<Registry>,
    lifecycle: tokio::sync::Mutex<Lifecycle>,
}

#[derive(Clone)]
pub struct Broadcaster {
    inner: Arc<Inner>,
}

impl Broadcaster {
    pub fn new(sources: Sources, settings: AssemblerSettings, buffer: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                sources,
                settings,
                buffer: buffer.max(1),
                registry: Mutex::new(Registry::default()),
                lifecycle: tokio::sync::Mutex::new(Lifecycle {
                    state: BroadcasterState::Idle,
                    run: None,
                }),
            }),
        }
    }

    /// Start ticking every `interval`; the first tick fires immediately.
    ///
    /// Fails without side effects when already running, when the interval
    /// is zero, or when the per-tick sources cannot be read.
    pub async fn start(&self, interval: Duration) -> Result<()> {
        if interval.is_zero() {
            return Err(PulseError::broadcaster("tick interval must be greater than zero"));
        }

        let mut lifecycle = self.inner.lifecycle.lock().await;
        if lifecycle.state == BroadcasterState::Running {
            return Err(PulseError::broadcaster("already running"));
        }

        if let Err(e) = self.inner.sources.preflight().await {
            return Err(PulseError::startup(format!(
                "required system counters are unreadable: {}",
                e
            )));
        }

        let assembler = SnapshotAssembler::new(
            self.inner.sources.clone(),
            self.inner.settings.clone(),
        );
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let generation = {
            let mut registry = self.inner.registry.lock();
            registry.generation += 1;
            registry.open = true;
            registry.sinks.clear();
            registry.latest = None;
            registry.generation
        };

        let task = tokio::spawn(tick_loop(
            Arc::clone(&self.inner),
            assembler,
            generation,
            interval,
            shutdown_rx,
        ));

        lifecycle.run = Some(RunHandle {
            generation,
            shutdown_tx,
            task,
        });
        lifecycle.state = BroadcasterState::Running;
        log::info!("Broadcaster started, ticking every {:?}", interval);
        Ok(())
    }

    /// Stop ticking and drop every subscriber.
    ///
    /// A tick already in progress is delivered in full before the loop exits.
    /// Calling `stop` when not running does nothing. If the returned future
    /// is dropped early the broadcaster is still stopped: the loop finishes
    /// its tick and closes the registry on its own.
    pub async fn stop(&self) {
        let mut lifecycle = self.inner.lifecycle.lock().await;
        let Some(run) = lifecycle.run.take() else {
            return;
        };
        lifecycle.state = BroadcasterState::Stopped;

        self.inner.registry.lock().open = false;
        let _ = run.shutdown_tx.send(());
        if let Err(e) = run.task.await {
            log::warn!("Tick loop ended abnormally: {}", e);
        }

        // the loop already did this unless it panicked
        self.inner.close(run.generation);
        log::info!("Broadcaster stopped");
    }

    pub async fn state(&self) -> BroadcasterState {
        self.inner.lifecycle.lock().await.state
    }

    pub fn is_running(&self) -> bool {
        self.inner.registry.lock().open
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.registry.lock().sinks.len()
    }

    /// Register a subscriber for all future ticks
    pub fn subscribe(&self) -> Result<Subscription> {
        self.register().map(|(subscription, _)| subscription)
    }

    /// Register a subscriber and return the most recently delivered snapshot.
    ///
    /// Both happen under the registry lock, so the returned snapshot is
    /// strictly older than anything the subscription will receive.
    pub fn subscribe_with_latest(
        &self,
    ) -> Result<(Subscription, Option<Arc<MetricsSnapshot>>)> {
        self.register()
    }

    /// Safe to call at any time, any number of times
    pub fn unsubscribe(&self, id: SubscriptionId) {
        if self.inner.registry.lock().sinks.remove(&id).is_some() {
            log::debug!("Subscriber {} unsubscribed", id);
        }
    }

    fn register(&self) -> Result<(Subscription, Option<Arc<MetricsSnapshot>>)> {
        let mut registry = self.inner.registry.lock();
        if !registry.open {
            return Err(PulseError::broadcaster("not running"));
        }

        let id = registry.next_id;
        registry.next_id += 1;

        let (tx, rx) = mpsc::channel(self.inner.buffer);
        registry.sinks.insert(id, tx);
        log::debug!("Subscriber {} registered", id);

        Ok((Subscription { id, rx }, registry.latest.clone()))
    }
}

impl Inner {
    /// Push one snapshot to every sink in registration order
    fn deliver(&self, generation: u64, snapshot: Arc<MetricsSnapshot>) {
        let mut registry = self.registry.lock();
        if registry.generation != generation {
            log::debug!("Dropping tick {} from a finished run", snapshot.seq);
            return;
        }
        registry
            .sinks
            .retain(|id, sink| match sink.try_send(Arc::clone(&snapshot)) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    log::debug!("Subscriber {} is lagging, skipped tick {}", id, snapshot.seq);
                    true
                }
                Err(TrySendError::Closed(_)) => {
                    log::debug!("Subscriber {} went away, deregistered", id);
                    false
                }
            });
        registry.latest = Some(snapshot);
    }

    /// Deregister everyone, unless a newer run already owns the registry
    fn close(&self, generation: u64) {
        let mut registry = self.registry.lock();
        if registry.generation != generation {
            return;
        }
        registry.open = false;
        registry.sinks.clear();
        registry.latest = None;
    }
}

async fn tick_loop(
    inner: Arc<Inner>,
    mut assembler: SnapshotAssembler,
    generation: u64,
    period: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.recv() => break,
            _ = ticker.tick() => {
                let started = Instant::now();
                let snapshot = Arc::new(assembler.assemble().await);
                log::trace!("Tick {} ready", snapshot.seq);
                inner.deliver(generation, snapshot);

                // an overrun must not be followed by an immediate catch-up tick
                if started.elapsed() >= period {
                    log::debug!("Tick took {:?}, longer than {:?}", started.elapsed(), period);
                    ticker.reset();
                }
            }
        }
    }

    inner.close(generation);
    log::debug!("Tick loop exited after {} ticks", assembler.ticks());
}
