//! Process table via `ps`.

use async_trait::async_trait;
use std::time::Duration;

use crate::core::config::Timeouts;
use crate::core::system_monitor::{round1, ProcessRecord, ProcessTableSource};
use crate::error::Result;
use crate::platform::command::run_command;
use crate::utils::format_elapsed;

const PS_FORMAT: &str = "pid,user,comm,pcpu,pmem,rss,etimes,ni,state";

pub struct PsProcessTable {
    timeout: Duration,
}

impl PsProcessTable {
    pub fn new(timeouts: &Timeouts) -> Self {
        Self {
            timeout: Duration::from_millis(timeouts.process_table_ms),
        }
    }
}

#[async_trait]
impl ProcessTableSource for PsProcessTable {
    async fn processes(&self) -> Result<Vec<ProcessRecord>> {
        let output = run_command("ps", &["-eo", PS_FORMAT], self.timeout).await?;
        Ok(parse_ps_output(&output))
    }
}

/// Parse `ps -eo pid,user,comm,pcpu,pmem,rss,etimes,ni,state` output.
///
/// The header and malformed lines are skipped.
pub fn parse_ps_output(output: &str) -> Vec<ProcessRecord> {
    output.lines().skip(1).filter_map(parse_ps_line).collect()
}

fn parse_ps_line(line: &str) -> Option<ProcessRecord> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 9 {
        return None;
    }

    // `comm` may contain spaces; the last six columns are fixed
    let tail = &parts[parts.len() - 6..];
    let command = parts[2..parts.len() - 6].join(" ");

    let pid: u32 = parts[0].parse().ok()?;
    let cpu: f64 = tail[0].parse().ok()?;
    let mem: f64 = tail[1].parse().ok()?;
    let rss_kb: u64 = tail[2].parse().ok()?;
    let elapsed_seconds: u64 = tail[3].parse().ok()?;
    // kernel threads without a nice value print "-"
    let ni: i32 = tail[4].parse().unwrap_or(0);

    Some(ProcessRecord {
        pid,
        user: parts[1].to_string(),
        command,
        cpu: round1(cpu),
        mem: round1(mem),
        rss_mb: (rss_kb as f64 / 1024.0).round() as u64,
        elapsed_seconds,
        etime: format_elapsed(elapsed_seconds),
        ni,
        state: tail[5].to_string(),
    })
}
