mod models;
mod service;
mod utils;

use crate::models::archive_result::ArchiveResult;
use crate::models::config::{setup_settings, JobConfig, Overrides};
use crate::models::dry_run_mode::DryRunMode;
use crate::service::archiver::{list_backup_contents, ProcessRunner};
use crate::service::job::BackupJob;
use anyhow::{Context, Result};
use clap::Parser;
use indicatif::MultiProgress;
use log::{debug, info, warn};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "rolling-backup")]
#[command(about = "Create rolling backups of a file or folder", long_about = None)]
struct Cli {
    /// Source path to back up
    source: PathBuf,

    /// Directory that holds the backups
    destination: PathBuf,

    #[arg(short = 'c', long = "config", env = "ROLLING_BACKUP_CONFIG")]
    config_file: Option<String>,

    /// Number of backups to keep (-1 to keep all backups)
    #[arg(short = 'k', long = "keep", allow_negative_numbers = true)]
    keep: Option<i64>,

    /// Minimum hours between backups
    #[arg(short = 'i', long = "interval")]
    interval_hours: Option<u64>,

    #[arg(long = "prefix")]
    prefix: Option<String>,

    #[arg(long = "extension")]
    file_extension: Option<String>,

    #[arg(
        short = 'l',
        long = "log-level",
        default_value = "info",
        env = "LOG_LEVEL"
    )]
    log_level: String,

    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    /// Just print the commands to be executed
    #[arg(short = 'd', long = "dry-run")]
    dry_run: bool,

    /// Print the contents of the newest backup and exit
    #[arg(long = "list")]
    list: bool,
}

fn main() -> Result<()> {
    let args = Cli::parse();

    let log_level = match args.log_level.to_lowercase().as_str() {
        "trace" => log::LevelFilter::Trace,
        "debug" => log::LevelFilter::Debug,
        "info" => log::LevelFilter::Info,
        "warn" => log::LevelFilter::Warn,
        "error" => log::LevelFilter::Error,
        _ => log::LevelFilter::Info,
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp_secs()
        .init();

    let settings =
        setup_settings(args.config_file.as_deref()).context("Failed to load settings")?;
    debug!("Loaded settings: {:?}", &settings);

    let dry_run_mode = DryRunMode::from_flag(args.dry_run);
    if dry_run_mode.is_dry_run() {
        info!("Running in DRY RUN mode - no archive will be written and nothing removed");
    }

    let config = JobConfig::new(
        args.source,
        args.destination,
        settings,
        Overrides {
            prefix: args.prefix,
            file_extension: args.file_extension,
            keep: args.keep,
            interval_hours: args.interval_hours,
        },
        dry_run_mode,
    )
    .context("Invalid configuration")?;

    if args.list {
        return list_latest(config);
    }

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = interrupted.clone();
    ctrlc::set_handler(move || {
        warn!("Received interrupt, stopping before any backup is removed...");
        flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl+C handler")?;

    let multi_progress = if !args.quiet {
        Some(MultiProgress::new())
    } else {
        None
    };

    let mut job = BackupJob::new(config);
    let outcome = job
        .run(&ProcessRunner, &interrupted, multi_progress.as_ref())
        .context("Backup run failed")?;

    match &outcome.archive {
        Some(ArchiveResult::DryRun {
            invocation,
            staging_path,
            path,
        }) => {
            println!("{}", invocation);
            println!("mv {} {}", staging_path.display(), path.display());
        }
        Some(ArchiveResult::Created {
            path,
            size,
            diff_hours,
        }) => debug!(
            "Wrote {} bytes to {} ({:?} hours after the previous backup)",
            size,
            path.display(),
            diff_hours
        ),
        None => info!("No backup due"),
    }
    debug!(
        "Run for {} finished in state {:?} (hours since previous backup: {:?})",
        job.now(),
        job.state(),
        outcome.diff_hours
    );
    if dry_run_mode.is_dry_run() {
        info!(
            "DRY RUN completed - {} backups would be removed",
            outcome.pruned.removed.len()
        );
    } else {
        info!(
            "Backup run completed - {} old backups removed",
            outcome.pruned.removed.len()
        );
    }
    Ok(())
}

fn list_latest(config: JobConfig) -> Result<()> {
    let archiver = config.archiver.clone();
    let job = BackupJob::new(config);
    let catalog = job.scan_catalog().context("Failed to scan backups")?;

    let Some(latest) = catalog.latest() else {
        warn!("No backups found");
        return Ok(());
    };

    info!("Contents of {}", latest.path.display());
    let entries = list_backup_contents(&ProcessRunner, &archiver, &latest.path)
        .with_context(|| format!("Failed to list {}", latest.path.display()))?;
    for entry in entries {
        println!("{}", entry);
    }
    Ok(())
}
