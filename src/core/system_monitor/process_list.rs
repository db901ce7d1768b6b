//! On-demand, sorted and filtered view of the process table.

use std::cmp::Ordering;
use std::str::FromStr;
use std::sync::Arc;

use super::metrics::{ProcessRecord, ProcessSummary};
use super::sources::ProcessTableSource;
use crate::error::{PulseError, Result};

pub const DEFAULT_LIMIT: usize = 200;
pub const MAX_LIMIT: usize = 10_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Cpu,
    Memory,
}

impl FromStr for SortKey {
    type Err = PulseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(SortKey::Cpu),
            "mem" | "memory" => Ok(SortKey::Memory),
            other => Err(PulseError::invalid_input(format!(
                "unknown sort key '{}', expected 'cpu' or 'mem'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessQuery {
    pub sort: SortKey,
    /// Case-insensitive substring matched against command, user and pid
    pub filter: String,
    pub limit: usize,
}

impl Default for ProcessQuery {
    fn default() -> Self {
        Self {
            sort: SortKey::Cpu,
            filter: String::new(),
            limit: DEFAULT_LIMIT,
        }
    }
}

impl ProcessQuery {
    /// Build a query from raw request parameters, rejecting anything malformed
    pub fn parse(sort: Option<&str>, filter: Option<&str>, limit: Option<&str>) -> Result<Self> {
        let sort = match sort {
            Some(s) if !s.is_empty() => s.parse()?,
            _ => SortKey::Cpu,
        };

        let limit = match limit {
            Some(raw) if !raw.is_empty() => {
                let limit: usize = raw.trim().parse().map_err(|_| {
                    PulseError::invalid_input(format!("limit '{}' is not a number", raw))
                })?;
                Self::check_limit(limit)?
            }
            _ => DEFAULT_LIMIT,
        };

        Ok(Self {
            sort,
            filter: filter.unwrap_or_default().to_string(),
            limit,
        })
    }

    pub fn check_limit(limit: usize) -> Result<usize> {
        if limit == 0 || limit > MAX_LIMIT {
            return Err(PulseError::invalid_input(format!(
                "limit must be between 1 and {}",
                MAX_LIMIT
            )));
        }
        Ok(limit)
    }

    fn matches(&self, record: &ProcessRecord, needle: &str) -> bool {
        needle.is_empty()
            || record.command.to_lowercase().contains(needle)
            || record.user.to_lowercase().contains(needle)
            || record.pid.to_string().contains(needle)
    }
}

/// Filter, sort descending by the query's key, then truncate.
///
/// `total` counts every match, before truncation.
pub fn select_processes(records: Vec<ProcessRecord>, query: &ProcessQuery) -> ProcessSummary {
    let needle = query.filter.trim().to_lowercase();

    let mut list: Vec<ProcessRecord> = records
        .into_iter()
        .filter(|record| query.matches(record, &needle))
        .collect();

    let key = |record: &ProcessRecord| match query.sort {
        SortKey::Cpu => record.cpu,
        SortKey::Memory => record.mem,
    };
    list.sort_by(|a, b| {
        key(b)
            .partial_cmp(&key(a))
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.pid.cmp(&b.pid))
    });

    let total = list.len();
    list.truncate(query.limit);

    ProcessSummary { total, list }
}

/// Stateless lister: every call re-reads the process table
#[derive(Clone)]
pub struct ProcessLister {
    source: Arc<dyn ProcessTableSource>,
}

impl ProcessLister {
    pub fn new(source: Arc<dyn ProcessTableSource>) -> Self {
        Self { source }
    }

    /// An unreadable process table yields an empty summary
    pub async fn list(&self, query: &ProcessQuery) -> ProcessSummary {
        match self.source.processes().await {
            Ok(records) => select_processes(records, query),
            Err(e) => {
                log::warn!("Process table unavailable: {}", e);
                ProcessSummary::default()
            }
        }
    }
}
