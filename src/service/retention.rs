use crate::models::archive_result::PruneReport;
use crate::models::dry_run_mode::DryRunMode;
use crate::models::error::{BackupError, Result};
use crate::models::retention::Retention;
use crate::service::catalog::BackupCatalog;
use indicatif::ProgressBar;
use log::{debug, info, warn};
use std::fs;

/// Removes the oldest backups so that at most `keep` remain. `catalog` has to
/// be scanned after the newest archive was created.
pub fn prune_old_backups(
    catalog: &BackupCatalog,
    keep: Retention,
    dry_run: DryRunMode,
    progress: Option<&ProgressBar>,
) -> Result<PruneReport> {
    let mut report = PruneReport::default();

    let excess = keep.excess(catalog.len());
    if excess == 0 {
        debug!("Nothing to prune ({} backups, keep {})", catalog.len(), keep);
        return Ok(report);
    }
    let candidates = catalog.oldest(excess);

    // Checked up front so a directory never leaves the pass half done
    if let Some(dir) = candidates.iter().find(|entry| entry.is_dir) {
        return Err(BackupError::UnsupportedEntry {
            path: dir.path.clone(),
        });
    }

    if let Some(pb) = progress {
        pb.set_length(candidates.len() as u64);
    }

    for entry in candidates {
        if !dry_run.should_delete_files() {
            info!("{}rm {}", dry_run.log_prefix(), entry.path.display());
            report.removed.push(entry.path.clone());
        } else {
            match fs::remove_file(&entry.path) {
                Ok(()) => {
                    info!("Removed old backup {}", entry.path.display());
                    report.removed.push(entry.path.clone());
                }
                Err(cause) => {
                    let error = BackupError::Deletion {
                        path: entry.path.clone(),
                        cause,
                    };
                    warn!("{}", error);
                    report.failed.push((entry.path.clone(), error.to_string()));
                }
            }
        }

        if let Some(pb) = progress {
            pb.inc(1);
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::catalog::tests::{naming, touch_backup};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
    }

    fn seed(dir: &Path, count: i64) -> Vec<PathBuf> {
        (0..count)
            .map(|i| touch_backup(dir, &(base() + Duration::hours(24 * i))))
            .collect()
    }

    fn scan(dir: &Path) -> BackupCatalog {
        BackupCatalog::scan(dir, &naming()).unwrap()
    }

    #[test]
    fn test_removes_oldest_first() {
        let temp_dir = TempDir::new().unwrap();
        let paths = seed(temp_dir.path(), 5);

        let report =
            prune_old_backups(&scan(temp_dir.path()), Retention::Keep(2), DryRunMode::None, None)
                .unwrap();

        assert_eq!(report.removed, paths[..3].to_vec());
        assert!(report.failed.is_empty());
        let remaining: Vec<_> = scan(temp_dir.path())
            .entries()
            .iter()
            .map(|e| e.path.clone())
            .collect();
        assert_eq!(remaining, paths[3..].to_vec());
    }

    #[test]
    fn test_keep_all_leaves_everything() {
        let temp_dir = TempDir::new().unwrap();
        seed(temp_dir.path(), 6);

        for _ in 0..3 {
            let report = prune_old_backups(
                &scan(temp_dir.path()),
                Retention::KeepAll,
                DryRunMode::None,
                None,
            )
            .unwrap();
            assert!(report.removed.is_empty());
        }

        assert_eq!(scan(temp_dir.path()).len(), 6);
    }

    #[test]
    fn test_under_limit_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        seed(temp_dir.path(), 2);

        let report =
            prune_old_backups(&scan(temp_dir.path()), Retention::Keep(2), DryRunMode::None, None)
                .unwrap();

        assert!(report.removed.is_empty());
        assert_eq!(scan(temp_dir.path()).len(), 2);
    }

    #[test]
    fn test_keep_zero_removes_all() {
        let temp_dir = TempDir::new().unwrap();
        seed(temp_dir.path(), 3);

        prune_old_backups(&scan(temp_dir.path()), Retention::Keep(0), DryRunMode::None, None)
            .unwrap();

        assert!(scan(temp_dir.path()).is_empty());
    }

    #[test]
    fn test_dry_run_reports_without_deleting() {
        let temp_dir = TempDir::new().unwrap();
        let paths = seed(temp_dir.path(), 4);

        let report = prune_old_backups(
            &scan(temp_dir.path()),
            Retention::Keep(1),
            DryRunMode::Preview,
            None,
        )
        .unwrap();

        assert_eq!(report.removed, paths[..3].to_vec());
        assert_eq!(scan(temp_dir.path()).len(), 4);
    }

    #[test]
    fn test_directory_candidate_is_unsupported() {
        let temp_dir = TempDir::new().unwrap();
        let dir_backup = temp_dir.path().join(naming().file_name(&(base() - Duration::days(1))));
        fs::create_dir(&dir_backup).unwrap();
        seed(temp_dir.path(), 3);

        let result =
            prune_old_backups(&scan(temp_dir.path()), Retention::Keep(1), DryRunMode::None, None);

        match result {
            Err(BackupError::UnsupportedEntry { path }) => assert_eq!(path, dir_backup),
            other => panic!("Expected UnsupportedEntry error, got {:?}", other),
        }
        assert_eq!(scan(temp_dir.path()).len(), 4);
    }

    #[test]
    fn test_directory_beyond_candidates_is_fine() {
        let temp_dir = TempDir::new().unwrap();
        seed(temp_dir.path(), 2);
        let newest_dir = temp_dir.path().join(naming().file_name(&(base() + Duration::days(30))));
        fs::create_dir(&newest_dir).unwrap();

        let report =
            prune_old_backups(&scan(temp_dir.path()), Retention::Keep(2), DryRunMode::None, None)
                .unwrap();

        assert_eq!(report.removed.len(), 1);
        assert!(newest_dir.is_dir());
    }

    #[test]
    fn test_failed_deletion_does_not_stop_others() {
        let temp_dir = TempDir::new().unwrap();
        let paths = seed(temp_dir.path(), 4);
        let catalog = scan(temp_dir.path());
        // vanishes between scan and prune
        fs::remove_file(&paths[0]).unwrap();

        let report =
            prune_old_backups(&catalog, Retention::Keep(1), DryRunMode::None, None).unwrap();

        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, paths[0]);
        assert_eq!(report.removed, paths[1..3].to_vec());
        assert!(paths[3].exists());
    }
}
