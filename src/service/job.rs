use crate::models::archive_result::{ArchiveResult, PruneReport};
use crate::models::backup_entry::BackupEntry;
use crate::models::config::JobConfig;
use crate::models::error::{BackupError, Result};
use crate::service::archiver::ToolRunner;
use crate::service::backup::{create_backup, discard_stale_staging, BackupRequest};
use crate::service::catalog::{BackupCatalog, BackupNaming};
use crate::service::retention::prune_old_backups;
use crate::service::schedule::{diff_hours, is_backup_due, round_hours};
use crate::utils::progress::{create_progress_bar, create_spinner};
use chrono::{DateTime, SubsecRound, Utc};
use indicatif::MultiProgress;
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};

/// Where a run currently is. `Failed` is reached through an `Err` return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Init,
    CatalogScanned,
    Due,
    NotDue,
    Creating,
    Created,
    Pruning,
    Done,
}

#[derive(Debug)]
pub struct JobOutcome {
    pub archive: Option<ArchiveResult>,
    pub pruned: PruneReport,
    /// Hours since the previous backup at the start of the run
    pub diff_hours: Option<f64>,
}

/// One backup run. `now` is fixed when the job is built so the due check and
/// the new archive's name agree.
pub struct BackupJob {
    config: JobConfig,
    now: DateTime<Utc>,
    state: JobState,
}

impl BackupJob {
    pub fn new(config: JobConfig) -> Self {
        Self::at(config, Utc::now())
    }

    pub fn at(config: JobConfig, now: DateTime<Utc>) -> Self {
        BackupJob {
            config,
            now: now.trunc_subsecs(0),
            state: JobState::Init,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn naming(&self) -> BackupNaming<'_> {
        BackupNaming {
            prefix: &self.config.prefix,
            file_extension: &self.config.file_extension,
            timestamp_format: &self.config.timestamp_format,
            timestamp_length: self.config.timestamp_length,
        }
    }

    pub fn new_backup_filename(&self) -> String {
        self.naming().file_name(&self.now)
    }

    pub fn scan_catalog(&self) -> Result<BackupCatalog> {
        BackupCatalog::scan(&self.config.destination, &self.naming())
    }

    fn transition(&mut self, next: JobState) {
        debug!("Job state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    pub fn run(
        &mut self,
        runner: &dyn ToolRunner,
        interrupted: &AtomicBool,
        multi_progress: Option<&MultiProgress>,
    ) -> Result<JobOutcome> {
        let dry_run = self.config.dry_run;
        let prefix = dry_run.log_prefix();

        let scan_progress = multi_progress.map(|mp| {
            mp.add(create_spinner(&format!(
                "{}[1/3] Scanning {}...",
                prefix,
                self.config.destination.display()
            )))
        });
        let catalog = self.scan_catalog()?;
        self.transition(JobState::CatalogScanned);
        if catalog.is_empty() {
            info!(
                "{}No previous backups in {}",
                prefix,
                self.config.destination.display()
            );
        }
        for entry in catalog.entries() {
            debug!("Existing backup: {}", entry.file_name);
        }
        discard_stale_staging(&self.config.destination, &self.config.prefix, dry_run)?;
        if let Some(progress) = scan_progress {
            progress.finish_with_message(format!(
                "{}[1/3] Found {} backups",
                prefix,
                catalog.len()
            ));
        }

        let diff = diff_hours(&catalog, &self.now);
        let due = is_backup_due(&catalog, &self.now, self.config.interval);

        let mut archive = None;
        if due {
            self.transition(JobState::Due);
            if interrupted.load(Ordering::SeqCst) {
                return Err(BackupError::Interrupted);
            }
            archive = Some(self.create(runner, diff, multi_progress)?);
        } else {
            self.transition(JobState::NotDue);
            if let Some(hours) = diff {
                info!(
                    "{}Last backup was {} hours ago, next one is due after {} hours",
                    prefix,
                    round_hours(hours),
                    self.config.interval.num_hours()
                );
            }
        }

        if interrupted.load(Ordering::SeqCst) {
            return Err(BackupError::Interrupted);
        }
        self.transition(JobState::Pruning);

        // Rescan so the archive just written is counted
        let mut catalog = self.scan_catalog()?;
        if let Some(ArchiveResult::DryRun { path, .. }) = &archive {
            let file_name = self.new_backup_filename();
            catalog.include(BackupEntry {
                path: path.clone(),
                file_name,
                timestamp: self.now,
                is_dir: false,
            });
        }

        let prune_progress = multi_progress.map(|mp| {
            mp.add(create_progress_bar(
                0,
                &format!("{}[3/3] Pruning old backups", prefix),
            ))
        });
        let pruned = prune_old_backups(
            &catalog,
            self.config.keep,
            dry_run,
            prune_progress.as_ref(),
        )?;
        if let Some(progress) = prune_progress {
            progress.finish();
        }
        if !pruned.failed.is_empty() {
            warn!(
                "{} old backups could not be removed and will be retried next run",
                pruned.failed.len()
            );
        }

        self.transition(JobState::Done);
        Ok(JobOutcome {
            archive,
            pruned,
            diff_hours: diff,
        })
    }

    fn create(
        &mut self,
        runner: &dyn ToolRunner,
        diff: Option<f64>,
        multi_progress: Option<&MultiProgress>,
    ) -> Result<ArchiveResult> {
        self.transition(JobState::Creating);
        let file_name = self.new_backup_filename();
        let prefix = self.config.dry_run.log_prefix();

        let progress = multi_progress.map(|mp| {
            mp.add(create_spinner(&format!(
                "{}[2/3] Archiving {} into {}...",
                prefix,
                self.config.source.display(),
                file_name
            )))
        });

        let result = create_backup(
            runner,
            &BackupRequest {
                source: &self.config.source,
                destination: &self.config.destination,
                file_name: &file_name,
                archiver: &self.config.archiver,
                dry_run: self.config.dry_run,
                diff_hours: diff,
            },
        );

        if let Some(progress) = progress {
            let message = match &result {
                Ok(_) => format!("{}[2/3] Archived {}", prefix, file_name),
                Err(_) => format!("{}[2/3] Archiving failed", prefix),
            };
            progress.finish_with_message(message);
        }

        let result = result?;
        self.transition(JobState::Created);
        Ok(result)
    }
}
