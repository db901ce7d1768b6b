use hostpulse::core::system_monitor::{
    ProcessLister, ProcessQuery, ProcessRecord, ProcessTerminator, SignalKind, SortKey,
    TerminateFailure,
};
use std::sync::Arc;

use super::support::ScriptedHost;

fn record(pid: u32, user: &str, command: &str, cpu: f64, mem: f64) -> ProcessRecord {
    ProcessRecord {
        pid,
        user: user.to_string(),
        command: command.to_string(),
        cpu,
        mem,
        ..Default::default()
    }
}

fn lister() -> ProcessLister {
    let host = Arc::new(ScriptedHost {
        processes: vec![
            record(1, "root", "systemd", 0.0, 0.2),
            record(300, "www", "nginx", 2.5, 1.0),
            record(301, "www", "nginx", 7.5, 1.1),
            record(900, "dev", "node", 30.0, 12.0),
        ],
        ..Default::default()
    });
    ProcessLister::new(host.sources().processes)
}

#[tokio::test]
async fn test_list_by_memory_with_filter() {
    let query = ProcessQuery {
        sort: SortKey::Memory,
        filter: "NGINX".to_string(),
        limit: 10,
    };
    let summary = lister().list(&query).await;

    assert_eq!(summary.total, 2);
    let pids: Vec<u32> = summary.list.iter().map(|p| p.pid).collect();
    assert_eq!(pids, vec![301, 300]);
}

#[tokio::test]
async fn test_list_filter_single_match() {
    let query = ProcessQuery::parse(Some("cpu"), Some("node"), None).unwrap();
    let summary = lister().list(&query).await;
    assert_eq!(summary.list.len(), 1);
    assert_eq!(summary.list[0].pid, 900);
}

#[tokio::test]
async fn test_list_is_never_cached() {
    let lister = lister();
    let first = lister.list(&ProcessQuery::default()).await;
    let second = lister.list(&ProcessQuery::default()).await;
    assert_eq!(first, second);
    assert_eq!(first.list[0].command, "node");
}

#[test]
fn test_terminate_missing_process() {
    let terminator = ProcessTerminator::default();
    // far above any kernel pid_max
    let result = terminator.terminate(i32::MAX - 7, SignalKind::Graceful);
    if cfg!(unix) {
        assert_eq!(result, Err(TerminateFailure::NoSuchProcess(i32::MAX - 7)));
    } else {
        assert!(result.is_err());
    }
}

#[test]
fn test_terminate_rejects_bad_input() {
    let terminator = ProcessTerminator::default();
    assert!(matches!(
        terminator.terminate_request("123", "STOP"),
        Err(TerminateFailure::InvalidInput(_))
    ));
    assert!(matches!(
        terminator.terminate_request("-5", "KILL"),
        Err(TerminateFailure::InvalidInput(_))
    ));
}
