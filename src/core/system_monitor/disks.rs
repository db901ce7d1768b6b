//! Disk list filtering and ordering.

use std::cmp::Ordering;

use super::metrics::DiskMetrics;

/// Pseudo and virtual filesystems never reported as disks
const EXCLUDED_FSTYPES: &[&str] = &[
    "proc",
    "sysfs",
    "tmpfs",
    "devtmpfs",
    "devpts",
    "cgroup",
    "cgroup2",
    "pstore",
    "bpf",
    "securityfs",
    "debugfs",
    "tracefs",
    "fusectl",
    "configfs",
    "squashfs",
];

const RESERVED_MOUNT_PREFIXES: &[&str] = &["/sys", "/proc", "/dev"];

pub fn is_reportable(disk: &DiskMetrics) -> bool {
    if EXCLUDED_FSTYPES.contains(&disk.fstype.as_str()) {
        return false;
    }
    if RESERVED_MOUNT_PREFIXES
        .iter()
        .any(|prefix| disk.mount.starts_with(prefix))
    {
        return false;
    }
    disk.size > 0
}

/// Root first, then by mount point
fn mount_order(a: &DiskMetrics, b: &DiskMetrics) -> Ordering {
    match (a.mount == "/", b.mount == "/") {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a.mount.cmp(&b.mount),
    }
}

/// Drop pseudo filesystems, reserved mounts and empty entries, then sort
pub fn filter_and_sort(disks: Vec<DiskMetrics>) -> Vec<DiskMetrics> {
    let mut disks: Vec<_> = disks.into_iter().filter(is_reportable).collect();
    disks.sort_by(mount_order);
    disks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disk(mount: &str, fstype: &str, size: u64) -> DiskMetrics {
        DiskMetrics {
            device: format!("/dev/{}", mount.trim_start_matches('/')),
            mount: mount.to_string(),
            fstype: fstype.to_string(),
            size,
            used: size / 2,
            avail: size / 2,
        }
    }

    #[test]
    fn test_tmpfs_excluded() {
        let disks = filter_and_sort(vec![disk("/", "ext4", 100), disk("/tmp", "tmpfs", 100)]);
        assert_eq!(disks.len(), 1);
        assert_eq!(disks[0].mount, "/");
    }

    #[test]
    fn test_root_sorts_first() {
        let disks = filter_and_sort(vec![
            disk("/home", "ext4", 10),
            disk("/boot", "vfat", 10),
            disk("/", "btrfs", 10),
            disk("/a", "xfs", 10),
        ]);
        let mounts: Vec<_> = disks.iter().map(|d| d.mount.as_str()).collect();
        assert_eq!(mounts, vec!["/", "/a", "/boot", "/home"]);
    }

    #[test]
    fn test_reserved_mounts_and_empty_entries_excluded() {
        let disks = filter_and_sort(vec![
            disk("/dev/shm", "ext4", 10),
            disk("/sys/firmware/efi", "efivarfs", 10),
            disk("/mnt/empty", "ext4", 0),
            disk("/data", "ext4", 10),
        ]);
        assert_eq!(disks.len(), 1);
        assert_eq!(disks[0].mount, "/data");
    }
}
