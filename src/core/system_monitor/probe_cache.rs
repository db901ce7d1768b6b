//! Cache for probes that are too slow or change too rarely to run every tick.
//!
//! Each key carries its own refresh interval. Refreshes run on a spawned task
//! so a caller that gives up waiting never leaves a key stuck "in flight",
//! and at most one refresh per key runs at any time.

use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::error::{PulseError, Result};

type InFlight<V> = Shared<BoxFuture<'static, V>>;

/// Cached state of one probe
struct SlowProbeEntry<V> {
    value: Option<V>,
    last_refreshed_at: Option<Instant>,
    refresh_interval: Duration,
    in_flight: Option<InFlight<V>>,
}

impl<V> SlowProbeEntry<V> {
    fn empty(refresh_interval: Duration) -> Self {
        Self {
            value: None,
            last_refreshed_at: None,
            refresh_interval,
            in_flight: None,
        }
    }

    fn is_fresh(&self) -> bool {
        self.last_refreshed_at
            .is_some_and(|at| at.elapsed() < self.refresh_interval)
    }
}

pub struct SlowProbeCache<V> {
    entries: Arc<Mutex<HashMap<String, SlowProbeEntry<V>>>>,
}

impl<V> Default for SlowProbeCache<V> {
    fn default() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<V> SlowProbeCache<V>
where
    V: Clone + Default + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `key`, refreshing it first when it is
    /// older than `refresh_interval`.
    ///
    /// A failed refresh keeps (and returns) the previous value, or
    /// `V::default()` when the key never refreshed successfully. The failed
    /// attempt still counts as a refresh, so a broken probe is retried once per
    /// interval rather than on every call. While a refresh is in flight, other
    /// callers get the previous value if there is one, otherwise they wait for
    /// the in-flight result.
    pub async fn get<F, Fut>(&self, key: &str, refresh_interval: Duration, refresh: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let pending = {
            let mut entries = self.entries.lock();
            let entry = entries
                .entry(key.to_string())
                .or_insert_with(|| SlowProbeEntry::empty(refresh_interval));
            entry.refresh_interval = refresh_interval;

            if entry.is_fresh() {
                return entry.value.clone().unwrap_or_default();
            }

            match &entry.in_flight {
                Some(in_flight) => match &entry.value {
                    Some(previous) => return previous.clone(),
                    None => in_flight.clone(),
                },
                None => {
                    let shared = self.spawn_refresh(key, refresh());
                    entry.in_flight = Some(shared.clone());
                    shared
                }
            }
        };

        pending.await
    }

    /// Like [`get`](Self::get) but never waits: a due refresh is started in
    /// the background and the previous value (or `V::default()`) is returned
    /// immediately. Used for probes whose latency must not hold up a tick.
    pub fn get_or_stale<F, Fut>(&self, key: &str, refresh_interval: Duration, refresh: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let mut entries = self.entries.lock();
        let entry = entries
            .entry(key.to_string())
            .or_insert_with(|| SlowProbeEntry::empty(refresh_interval));
        entry.refresh_interval = refresh_interval;

        if !entry.is_fresh() && entry.in_flight.is_none() {
            entry.in_flight = Some(self.spawn_refresh(key, refresh()));
        }

        entry.value.clone().unwrap_or_default()
    }

    fn spawn_refresh<Fut>(&self, key: &str, probe: Fut) -> InFlight<V>
    where
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let task = tokio::spawn(complete_refresh(
            Arc::clone(&self.entries),
            key.to_string(),
            probe,
        ));

        let key = key.to_string();
        async move {
            task.await.unwrap_or_else(|e| {
                log::warn!("Probe '{}' task ended early: {}", key, e);
                V::default()
            })
        }
        .boxed()
        .shared()
    }

    /// Current cached value without triggering a refresh
    pub fn peek(&self, key: &str) -> Option<V> {
        self.entries
            .lock()
            .get(key)
            .and_then(|entry| entry.value.clone())
    }
}

async fn complete_refresh<V, Fut>(
    entries: Arc<Mutex<HashMap<String, SlowProbeEntry<V>>>>,
    key: String,
    probe: Fut,
) -> V
where
    V: Clone + Default,
    Fut: Future<Output = Result<V>>,
{
    let outcome = match AssertUnwindSafe(probe).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(_) => Err(PulseError::command(format!("probe '{}' panicked", key))),
    };

    let mut entries = entries.lock();
    let entry = entries
        .entry(key.clone())
        .or_insert_with(|| SlowProbeEntry::empty(Duration::ZERO));
    entry.in_flight = None;
    entry.last_refreshed_at = Some(Instant::now());

    match outcome {
        Ok(value) => {
            entry.value = Some(value.clone());
            value
        }
        Err(e) => {
            log::warn!("Probe '{}' failed, keeping previous value: {}", key, e);
            entry.value.clone().unwrap_or_default()
        }
    }
}
