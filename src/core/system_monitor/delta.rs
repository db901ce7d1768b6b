//! Converts pairs of monotonic counter readings into rates and percentages.
//!
//! Every function here is pure: callers pass in the previous and current
//! readings and get one [`DeltaResult`] per entity of the current reading.

use std::collections::HashMap;
use std::time::Duration;

use super::counters::{CpuTimes, RawCounterSample};

/// How much a computed delta can be trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    Fresh,
    /// The readings are further apart than the freshness bound
    Stale,
    /// No usable baseline (first sample, new entity, zero elapsed time)
    Unavailable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeltaResult {
    pub entity_id: String,
    /// Rate or percentage; always 0 unless `validity` is `Fresh`
    pub value: f64,
    pub validity: Validity,
}

impl DeltaResult {
    fn fresh(entity_id: &str, value: f64) -> Self {
        Self {
            entity_id: entity_id.to_string(),
            value,
            validity: Validity::Fresh,
        }
    }

    fn without_value(entity_id: &str, validity: Validity) -> Self {
        Self {
            entity_id: entity_id.to_string(),
            value: 0.0,
            validity,
        }
    }

    pub fn is_fresh(&self) -> bool {
        self.validity == Validity::Fresh
    }
}

/// A counter value that can be differenced against an earlier reading.
pub trait Counter {
    /// Returns `None` when the two readings carry no usable information.
    fn delta(prev: &Self, curr: &Self, elapsed: Duration) -> Option<f64>;
}

impl Counter for CpuTimes {
    /// Busy percentage over the interval, in `[0, 100]`.
    fn delta(prev: &Self, curr: &Self, _elapsed: Duration) -> Option<f64> {
        if curr.any_field_below(prev) {
            // counter reset
            return Some(0.0);
        }

        let total = curr.total() - prev.total();
        if total == 0 {
            return None;
        }
        let idle = curr.idle_total() - prev.idle_total();
        let busy = total.saturating_sub(idle);

        Some((busy as f64 / total as f64 * 100.0).clamp(0.0, 100.0))
    }
}

impl Counter for u64 {
    /// Units per second; a decreasing counter yields 0.
    fn delta(prev: &Self, curr: &Self, elapsed: Duration) -> Option<f64> {
        let secs = elapsed.as_secs_f64();
        if secs <= 0.0 {
            return None;
        }
        Some(curr.saturating_sub(*prev) as f64 / secs)
    }
}

/// Compute one delta per entity of `curr`.
///
/// Entities are matched by id, so a reordered, grown or shrunk entity list
/// never produces a fabricated value: an id missing from `prev` is reported
/// as unavailable.
pub fn compute_rate<T: Counter>(
    prev: Option<&RawCounterSample<T>>,
    curr: &RawCounterSample<T>,
    freshness_bound: Duration,
) -> Vec<DeltaResult> {
    let all = |validity: Validity| -> Vec<DeltaResult> {
        curr.entities
            .iter()
            .map(|(id, _)| DeltaResult::without_value(id, validity))
            .collect()
    };

    let Some(prev) = prev else {
        return all(Validity::Unavailable);
    };

    let elapsed = curr.observed_at.saturating_duration_since(prev.observed_at);
    if elapsed.is_zero() {
        return all(Validity::Unavailable);
    }
    if elapsed > freshness_bound {
        return all(Validity::Stale);
    }

    let baseline: HashMap<&str, &T> = prev
        .entities
        .iter()
        .map(|(id, value)| (id.as_str(), value))
        .collect();

    curr.entities
        .iter()
        .map(|(id, value)| {
            match baseline
                .get(id.as_str())
                .and_then(|before| T::delta(before, value, elapsed))
            {
                Some(rate) => DeltaResult::fresh(id, rate),
                None => DeltaResult::without_value(id, Validity::Unavailable),
            }
        })
        .collect()
}

/// Round to one decimal place, as reported for percentages
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
