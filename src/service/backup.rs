use crate::models::archive_result::ArchiveResult;
use crate::models::dry_run_mode::DryRunMode;
use crate::models::error::{BackupError, Result};
use crate::service::archiver::{create_args, ToolRunner};
use crate::service::schedule::round_hours;
use crate::utils::directory::split_source;
use crate::utils::progress::format_bytes;
use log::{debug, info, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Hidden name the archiver writes to before the archive is moved into place.
/// It never matches the `<prefix>-*` pattern, so a half-written archive is
/// invisible to catalog scans.
pub fn staging_path(destination: &Path, file_name: &str) -> PathBuf {
    destination.join(format!(".{}.partial", file_name))
}

/// Removes `.<prefix>-*.partial` files left behind by a run that was killed
/// before it could clean up. In dry-run mode they are only reported.
pub fn discard_stale_staging(
    destination: &Path,
    prefix: &str,
    dry_run: DryRunMode,
) -> Result<Vec<PathBuf>> {
    let pattern = format!(".{}-", prefix);
    let mut stale = Vec::new();

    for entry in WalkDir::new(destination)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|cause| BackupError::DirectoryRead {
            path: destination.to_path_buf(),
            cause: cause.to_string(),
        })?;
        let Some(file_name) = entry.file_name().to_str() else {
            continue;
        };
        if !entry.file_type().is_file()
            || !file_name.starts_with(&pattern)
            || !file_name.ends_with(".partial")
        {
            continue;
        }

        if !dry_run.should_delete_files() {
            info!(
                "{}Would remove stale staging file {}",
                dry_run.log_prefix(),
                entry.path().display()
            );
            stale.push(entry.path().to_path_buf());
            continue;
        }
        match fs::remove_file(entry.path()) {
            Ok(()) => {
                info!("Removed stale staging file {}", entry.path().display());
                stale.push(entry.path().to_path_buf());
            }
            Err(e) => warn!("Could not remove {}: {}", entry.path().display(), e),
        }
    }

    Ok(stale)
}

pub struct BackupRequest<'a> {
    pub source: &'a Path,
    pub destination: &'a Path,
    pub file_name: &'a str,
    pub archiver: &'a str,
    pub dry_run: DryRunMode,
    /// Hours since the previous backup, for the report line
    pub diff_hours: Option<f64>,
}

pub fn create_backup(
    runner: &dyn ToolRunner,
    request: &BackupRequest<'_>,
) -> Result<ArchiveResult> {
    let (parent, base_name) = split_source(request.source)?;

    let metadata = fs::metadata(request.source).map_err(|cause| BackupError::MetadataError {
        path: request.source.to_path_buf(),
        cause,
    })?;
    if metadata.is_dir() {
        debug!("Archiving directory {} from {}", base_name, parent.display());
    } else if metadata.is_file() {
        debug!("Archiving single file {} from {}", base_name, parent.display());
    } else {
        return Err(BackupError::InvalidConfig(format!(
            "Source is neither a file nor a directory: {}",
            request.source.display()
        )));
    }

    let archive = request.destination.join(request.file_name);
    let staging = staging_path(request.destination, request.file_name);
    let invocation = create_args(request.archiver, &staging, &parent, &base_name);

    if !request.dry_run.should_run_archiver() {
        return Ok(ArchiveResult::DryRun {
            invocation,
            staging_path: staging,
            path: archive,
        });
    }

    if archive.exists() {
        return Err(BackupError::Io(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("backup already exists: {}", archive.display()),
        )));
    }

    let output = match runner.run(&invocation) {
        Ok(output) => output,
        Err(e) => {
            discard_staging(&staging);
            return Err(e);
        }
    };
    for line in output.stdout.lines() {
        debug!("{}: {}", request.archiver, line);
    }
    if !output.success {
        discard_staging(&staging);
        return Err(BackupError::ArchiveCreation {
            archive,
            code: output.code,
            stderr: output.stderr,
        });
    }

    fs::rename(&staging, &archive).map_err(|cause| {
        discard_staging(&staging);
        BackupError::Rename {
            from: staging.clone(),
            to: archive.clone(),
            cause,
        }
    })?;

    let size = fs::metadata(&archive).map(|m| m.len()).unwrap_or(0);
    match request.diff_hours {
        None => info!(
            "New backup created: {} ({})",
            archive.display(),
            format_bytes(size)
        ),
        Some(hours) => info!(
            "Last backup was {} hours ago, new backup created: {} ({})",
            round_hours(hours),
            archive.display(),
            format_bytes(size)
        ),
    }

    Ok(ArchiveResult::Created {
        path: archive,
        size,
        diff_hours: request.diff_hours,
    })
}

fn discard_staging(staging: &Path) {
    if staging.exists() {
        if let Err(e) = fs::remove_file(staging) {
            debug!("Could not remove {}: {}", staging.display(), e);
        }
    }
}
