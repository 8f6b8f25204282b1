use crate::service::catalog::BackupCatalog;
use chrono::{DateTime, Duration, Utc};

/// Time elapsed since the newest backup, `None` when there is no backup yet
pub fn time_since_last(catalog: &BackupCatalog, now: &DateTime<Utc>) -> Option<Duration> {
    catalog.latest().map(|entry| *now - entry.timestamp)
}

/// A backup is due on the first run, or once strictly more than `interval`
/// has passed since the newest one.
pub fn is_backup_due(catalog: &BackupCatalog, now: &DateTime<Utc>, interval: Duration) -> bool {
    match time_since_last(catalog, now) {
        None => true,
        Some(diff) => diff > interval,
    }
}

pub fn diff_hours(catalog: &BackupCatalog, now: &DateTime<Utc>) -> Option<f64> {
    time_since_last(catalog, now).map(|diff| diff.num_seconds() as f64 / 3600.0)
}

/// Rounds to two decimals for reporting
pub fn round_hours(hours: f64) -> f64 {
    (hours * 100.0).round() / 100.0
}
