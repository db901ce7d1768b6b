//! Parsers for the text formats exposed by procfs, sysfs and `ip`.
//!
//! All functions here are pure so they can be tested against captured output.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::core::system_monitor::{CpuTimes, MemoryMetrics, SwapMetrics};
use crate::error::{PulseError, Result};

/// Parse the `cpu` and `cpuN` lines of `/proc/stat`.
///
/// The aggregate line comes first when present. Missing trailing fields
/// (old kernels) read as zero.
pub fn parse_proc_stat(content: &str) -> Result<Vec<(String, CpuTimes)>> {
    let mut entries = Vec::new();

    for line in content.lines() {
        let mut parts = line.split_whitespace();
        let Some(label) = parts.next() else {
            continue;
        };
        let is_cpu = label == "cpu"
            || (label.len() > 3
                && label.starts_with("cpu")
                && label[3..].chars().all(|c| c.is_ascii_digit()));
        if !is_cpu {
            continue;
        }

        let mut fields = [0u64; 8];
        for (slot, raw) in fields.iter_mut().zip(parts) {
            *slot = raw
                .parse()
                .map_err(|_| PulseError::parse(format!("bad /proc/stat field '{}' on {}", raw, label)))?;
        }

        let [user, nice, system, idle, iowait, irq, softirq, steal] = fields;
        entries.push((
            label.to_string(),
            CpuTimes {
                user,
                nice,
                system,
                idle,
                iowait,
                irq,
                softirq,
                steal,
            },
        ));
    }

    if entries.is_empty() {
        return Err(PulseError::parse("no cpu lines in /proc/stat"));
    }

    entries.sort_by_key(|(label, _)| label != "cpu");
    Ok(entries)
}

/// Parse `/proc/meminfo` (values in kB) into byte counts
pub fn parse_meminfo(content: &str) -> Result<(MemoryMetrics, SwapMetrics)> {
    let mut info: HashMap<&str, u64> = HashMap::new();
    for line in content.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        if let Some(Ok(kb)) = rest.split_whitespace().next().map(str::parse::<u64>) {
            info.insert(key.trim(), kb * 1024);
        }
    }

    let total = *info
        .get("MemTotal")
        .ok_or_else(|| PulseError::parse("MemTotal missing from /proc/meminfo"))?;
    let free = info.get("MemFree").copied().unwrap_or(0);
    let available = info.get("MemAvailable").copied().unwrap_or(free);

    let memory = MemoryMetrics {
        total,
        used: total.saturating_sub(available),
        free,
        available,
        buffers: info.get("Buffers").copied().unwrap_or(0),
        cached: info.get("Cached").copied().unwrap_or(0),
    };

    let swap_total = info.get("SwapTotal").copied().unwrap_or(0);
    let swap_free = info.get("SwapFree").copied().unwrap_or(0);
    let swap = SwapMetrics {
        total: swap_total,
        used: swap_total.saturating_sub(swap_free),
        free: swap_free,
    };

    Ok((memory, swap))
}

/// Interface of the first default route (destination `00000000`) in `/proc/net/route`
pub fn parse_default_route(content: &str) -> Option<String> {
    content.lines().skip(1).find_map(|line| {
        let mut cols = line.split_whitespace();
        let iface = cols.next()?;
        let destination = cols.next()?;
        (destination == "00000000").then(|| iface.to_string())
    })
}

/// Single counter from `/sys/class/net/<if>/statistics/*`
pub fn parse_counter(content: &str) -> Result<u64> {
    content
        .trim()
        .parse()
        .map_err(|_| PulseError::parse(format!("bad interface counter '{}'", content.trim())))
}

static INET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"inet (\d{1,3}(?:\.\d{1,3}){3})").expect("valid inet pattern"));

/// First IPv4 address in `ip -4 addr show` output, empty when none
pub fn parse_inet_address(output: &str) -> String {
    INET.captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Thermal zone reading in millidegrees; `None` outside the plausible range
pub fn parse_thermal_millidegrees(content: &str) -> Option<f64> {
    let millis: i64 = content.trim().parse().ok()?;
    let celsius = millis as f64 / 1000.0;
    (celsius > 0.0 && celsius < 150.0).then(|| (celsius * 10.0).round() / 10.0)
}

/// `scaling_cur_freq` is in kHz
pub fn parse_frequency_khz(content: &str) -> Option<u32> {
    let khz: u64 = content.trim().parse().ok()?;
    u32::try_from((khz as f64 / 1000.0).round() as u64).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROC_STAT: &str = "\
cpu  4705 356 584 3699176 23060 0 277 0 0 0
cpu0 1393 280 209 924243 5946 0 162 0 0 0
cpu1 3312 76 375 2774933 17114 0 115 0 0 0
intr 114930548 113199788 3 0 5 263 0 4 [... lots more numbers ...]
ctxt 1990473
btime 1062191376
processes 2915
";

    #[test]
    fn test_proc_stat_aggregate_first() {
        let entries = parse_proc_stat(PROC_STAT).unwrap();
        let labels: Vec<&str> = entries.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, vec!["cpu", "cpu0", "cpu1"]);
        assert_eq!(entries[0].1.user, 4705);
        assert_eq!(entries[0].1.iowait, 23060);
        assert_eq!(entries[2].1.softirq, 115);
    }

    #[test]
    fn test_proc_stat_short_lines() {
        let entries = parse_proc_stat("cpu 10 0 5 100\n").unwrap();
        assert_eq!(entries[0].1.idle, 100);
        assert_eq!(entries[0].1.steal, 0);
    }

    #[test]
    fn test_proc_stat_without_cpu_lines() {
        assert!(parse_proc_stat("ctxt 1\nbtime 2\n").is_err());
    }

    #[test]
    fn test_meminfo() {
        let content = "\
MemTotal:       16000000 kB
MemFree:         2000000 kB
MemAvailable:    9000000 kB
Buffers:          500000 kB
Cached:          4000000 kB
SwapTotal:       2000000 kB
SwapFree:        1500000 kB
";
        let (mem, swap) = parse_meminfo(content).unwrap();
        assert_eq!(mem.total, 16_000_000 * 1024);
        assert_eq!(mem.used, 7_000_000 * 1024);
        assert_eq!(mem.cached, 4_000_000 * 1024);
        assert_eq!(swap.used, 500_000 * 1024);
    }

    #[test]
    fn test_meminfo_available_falls_back_to_free() {
        let (mem, swap) = parse_meminfo("MemTotal: 1000 kB\nMemFree: 400 kB\n").unwrap();
        assert_eq!(mem.available, 400 * 1024);
        assert_eq!(mem.used, 600 * 1024);
        assert_eq!(swap, SwapMetrics::default());
    }

    #[test]
    fn test_default_route() {
        let content = "\
Iface\tDestination\tGateway \tFlags\tRefCnt\tUse\tMetric\tMask
docker0\t000011AC\t00000000\t0001\t0\t0\t0\t0000FFFF
wlp2s0\t00000000\t0101A8C0\t0003\t0\t0\t600\t00000000
";
        assert_eq!(parse_default_route(content), Some("wlp2s0".to_string()));
        assert_eq!(parse_default_route("Iface\tDestination\n"), None);
    }

    #[test]
    fn test_inet_address() {
        let output = "\
2: eth0: <BROADCAST,MULTICAST,UP,LOWER_UP> mtu 1500 qdisc fq_codel state UP
    inet 192.168.1.23/24 brd 192.168.1.255 scope global dynamic eth0
       valid_lft 85632sec preferred_lft 85632sec
";
        assert_eq!(parse_inet_address(output), "192.168.1.23");
        assert_eq!(parse_inet_address(""), "");
    }

    #[test]
    fn test_inet_pattern_ignores_inet6() {
        Lazy::force(&INET);
        let output = "    inet6 fe80::1/64 scope link\n    inet 10.0.0.5/8 scope global eth1\n";
        assert_eq!(parse_inet_address(output), "10.0.0.5");
        assert_eq!(parse_inet_address("    inet6 ::1/128 scope host\n"), "");
    }

    #[test]
    fn test_thermal_range() {
        assert_eq!(parse_thermal_millidegrees("45123\n"), Some(45.1));
        assert_eq!(parse_thermal_millidegrees("0"), None);
        assert_eq!(parse_thermal_millidegrees("200000"), None);
        assert_eq!(parse_thermal_millidegrees("garbage"), None);
    }

    #[test]
    fn test_frequency() {
        assert_eq!(parse_frequency_khz("2400000\n"), Some(2400));
        assert_eq!(parse_frequency_khz("799999"), Some(800));
        assert_eq!(parse_frequency_khz(""), None);
    }
}
