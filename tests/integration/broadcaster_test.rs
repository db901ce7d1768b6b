use hostpulse::core::system_monitor::{
    AssemblerSettings, Broadcaster, MetricsSnapshot, Subscription, NO_INTERFACE,
};
use std::sync::Arc;
use std::time::Duration;

use super::support::ScriptedHost;

const TICK: Duration = Duration::from_millis(1000);

fn broadcaster(host: &Arc<ScriptedHost>) -> Broadcaster {
    Broadcaster::new(host.sources(), AssemblerSettings::default(), 32)
}

async fn take(sub: &mut Subscription, n: usize) -> Vec<Arc<MetricsSnapshot>> {
    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        out.push(sub.recv().await.expect("broadcaster ended early"));
    }
    out
}

#[tokio::test(start_paused = true)]
async fn test_snapshots_carry_rates_after_first_tick() {
    let host = Arc::new(ScriptedHost::default());
    let broadcaster = broadcaster(&host);
    broadcaster.start(TICK).await.unwrap();
    let mut sub = broadcaster.subscribe().unwrap();

    let snapshots = take(&mut sub, 3).await;

    let first = &snapshots[0];
    assert_eq!(first.seq, 1);
    assert_eq!(first.cpu.total_pct, 0.0);
    assert_eq!(first.net.rx_bps, 0);
    assert_eq!(first.net.active_interface, "eth0");
    assert_eq!(first.net.local_ip, "10.0.0.5");

    let third = &snapshots[2];
    assert_eq!(third.cpu.total_pct, 50.0);
    assert_eq!(third.cpu.per_core_pct, vec![50.0]);
    assert_eq!(third.net.rx_bps, 1000);
    assert_eq!(third.host.uptime_formatted, "1d 1h 1m");
    assert!(third.degraded.is_empty());

    broadcaster.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_slow_probes_fill_in_without_blocking() {
    let host = Arc::new(ScriptedHost::default());
    let broadcaster = broadcaster(&host);
    broadcaster.start(TICK).await.unwrap();
    let mut sub = broadcaster.subscribe().unwrap();

    let snapshots = take(&mut sub, 4).await;

    // reachability is unknown until the first background check lands
    assert!(!snapshots[0].net.has_internet);
    assert!(snapshots[0].net.public_ip.is_empty());

    let last = &snapshots[3];
    assert!(last.net.has_internet);
    assert_eq!(last.net.public_ip, "203.0.113.7");

    broadcaster.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_disks_filtered_root_first() {
    let host = Arc::new(ScriptedHost::default());
    let broadcaster = broadcaster(&host);
    broadcaster.start(TICK).await.unwrap();
    let mut sub = broadcaster.subscribe().unwrap();

    let snapshot = sub.recv().await.unwrap();
    let mounts: Vec<&str> = snapshot.disks.iter().map(|d| d.mount.as_str()).collect();
    assert_eq!(mounts, vec!["/", "/home"]);

    broadcaster.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_failed_disk_read_degrades_only_disks() {
    let host = Arc::new(ScriptedHost {
        fail_disks: true,
        ..Default::default()
    });
    let broadcaster = broadcaster(&host);
    broadcaster.start(TICK).await.unwrap();
    let mut sub = broadcaster.subscribe().unwrap();

    let snapshots = take(&mut sub, 2).await;
    for snapshot in &snapshots {
        assert!(snapshot.disks.is_empty());
        assert_eq!(snapshot.degraded, vec!["disks".to_string()]);
        assert_eq!(snapshot.host.hostname, "scripted");
    }

    broadcaster.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_lost_default_route_resets_network_baseline() {
    let host = Arc::new(ScriptedHost::default());
    let broadcaster = broadcaster(&host);
    broadcaster.start(TICK).await.unwrap();
    let mut sub = broadcaster.subscribe().unwrap();

    take(&mut sub, 2).await;

    *host.interface.lock() = None;
    let offline = sub.recv().await.unwrap();
    assert_eq!(offline.net.active_interface, NO_INTERFACE);
    assert_eq!(offline.net.rx_total, 0);

    *host.interface.lock() = Some("eth0".to_string());
    let back = take(&mut sub, 2).await;
    assert_eq!(back[0].net.rx_bps, 0);
    assert_eq!(back[1].net.rx_bps, 1000);

    broadcaster.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_many_subscribers_in_lockstep() {
    let host = Arc::new(ScriptedHost::default());
    let broadcaster = broadcaster(&host);
    broadcaster.start(TICK).await.unwrap();

    let mut subs: Vec<Subscription> = (0..8).map(|_| broadcaster.subscribe().unwrap()).collect();
    assert_eq!(broadcaster.subscriber_count(), 8);

    let mut per_sub = Vec::new();
    for sub in subs.iter_mut() {
        let seqs: Vec<u64> = take(sub, 4).await.iter().map(|s| s.seq).collect();
        per_sub.push(seqs);
    }
    assert!(per_sub.iter().all(|seqs| seqs == &vec![1, 2, 3, 4]));

    drop(subs);
    broadcaster.stop().await;
    assert_eq!(broadcaster.subscriber_count(), 0);
}
