//! Disk usage of the volume holding the logs

use crate::analysis::FixedPoint;
use log::{debug, warn};
use std::path::Path;
use sysinfo::Disks;

/// Used space of `volume` as a percentage, `None` when it cannot be read
///
/// The volume is resolved to the mounted disk whose mount point is its
/// longest prefix. Failures are logged and never abort the run; the report
/// then shows the usage as unavailable.
pub fn disk_usage(volume: &Path) -> Option<FixedPoint> {
    let resolved = volume
        .canonicalize()
        .unwrap_or_else(|_| volume.to_path_buf());

    let disks = Disks::new_with_refreshed_list();
    let index = covering_mount(&resolved, disks.list().iter().map(|d| d.mount_point()));
    let Some(disk) = index.and_then(|i| disks.list().get(i)) else {
        warn!("No mounted disk holds {}", volume.display());
        return None;
    };

    let usage = used_percent(disk.total_space(), disk.available_space());
    debug!(
        "Disk usage of {} (mounted on {}): {}%",
        volume.display(),
        disk.mount_point().display(),
        usage
    );
    Some(usage)
}

/// Index of the mount point that is the longest prefix of `volume`
fn covering_mount<'a>(
    volume: &Path,
    mounts: impl IntoIterator<Item = &'a Path>,
) -> Option<usize> {
    mounts
        .into_iter()
        .enumerate()
        .filter(|(_, mount)| volume.starts_with(mount))
        .max_by_key(|(_, mount)| mount.components().count())
        .map(|(index, _)| index)
}

/// `(total - available) / total`, truncated to two decimals
fn used_percent(total: u64, available: u64) -> FixedPoint {
    if total == 0 {
        return FixedPoint::ZERO;
    }
    let used = u128::from(total.saturating_sub(available));
    let scaled = used * 10_000 / u128::from(total);
    // Bounded by 10_000 since used <= total
    FixedPoint::from_scaled(i64::try_from(scaled).unwrap_or(10_000))
}
