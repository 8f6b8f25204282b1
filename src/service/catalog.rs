use crate::models::backup_entry::BackupEntry;
use crate::models::error::{BackupError, Result};
use crate::utils::timestamp::{format_timestamp, parse_timestamp};
use chrono::{DateTime, Utc};
use log::debug;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// How backup files are named: `<prefix>-<timestamp><extension>`
#[derive(Debug, Clone, Copy)]
pub struct BackupNaming<'a> {
    pub prefix: &'a str,
    pub file_extension: &'a str,
    pub timestamp_format: &'a str,
    pub timestamp_length: usize,
}

impl BackupNaming<'_> {
    pub fn file_name(&self, now: &DateTime<Utc>) -> String {
        new_backup_filename(self.prefix, now, self.timestamp_format, self.file_extension)
    }

    pub fn extract_timestamp(&self, file_name: &str) -> Result<DateTime<Utc>> {
        extract_timestamp(
            file_name,
            self.prefix,
            self.file_extension,
            self.timestamp_format,
            self.timestamp_length,
        )
    }
}

pub fn new_backup_filename(
    prefix: &str,
    now: &DateTime<Utc>,
    timestamp_format: &str,
    file_extension: &str,
) -> String {
    format!(
        "{}-{}{}",
        prefix,
        format_timestamp(now, timestamp_format),
        file_extension
    )
}

/// Reads the creation time out of a backup's file name. File metadata is never
/// consulted, so archives keep their logical age when copied between hosts.
///
/// The name must be exactly `<prefix>-<timestamp><extension>`. Anything longer
/// would sort out of time order and is rejected.
pub fn extract_timestamp(
    file_name: &str,
    prefix: &str,
    file_extension: &str,
    timestamp_format: &str,
    timestamp_length: usize,
) -> Result<DateTime<Utc>> {
    let format_error = |cause: String| BackupError::TimestampFormat {
        file_name: file_name.to_string(),
        cause,
    };

    let Some(rest) = file_name
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('-'))
    else {
        return Err(format_error(format!("expected prefix '{}-'", prefix)));
    };
    let Some(timestamp) = rest.strip_suffix(file_extension) else {
        return Err(format_error(format!(
            "expected extension '{}'",
            file_extension
        )));
    };
    if timestamp.len() != timestamp_length {
        return Err(format_error(format!(
            "expected a {} character timestamp, found '{}'",
            timestamp_length, timestamp
        )));
    }

    parse_timestamp(timestamp, timestamp_format).map_err(format_error)
}

/// Lists `<prefix>-*` entries directly inside `destination`, sorted by name
pub fn scan_backup_files(
    destination: &Path,
    prefix: &str,
) -> Result<Vec<(PathBuf, String, bool)>> {
    let pattern = format!("{}-", prefix);
    let mut matches = Vec::new();

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
        if !file_name.starts_with(&pattern) {
            continue;
        }

        matches.push((
            entry.path().to_path_buf(),
            file_name.to_string(),
            entry.file_type().is_dir(),
        ));
    }

    Ok(matches)
}

/// Backups present in one destination, oldest first
#[derive(Debug, Clone, Default)]
pub struct BackupCatalog {
    entries: Vec<BackupEntry>,
}

impl BackupCatalog {
    pub fn scan(destination: &Path, naming: &BackupNaming<'_>) -> Result<Self> {
        if !destination.is_dir() {
            return Err(BackupError::DirectoryRead {
                path: destination.to_path_buf(),
                cause: "not a readable directory".to_string(),
            });
        }

        let entries = scan_backup_files(destination, naming.prefix)?
            .into_iter()
            .map(|(path, file_name, is_dir)| {
                let timestamp = naming.extract_timestamp(&file_name)?;
                Ok(BackupEntry {
                    path,
                    file_name,
                    timestamp,
                    is_dir,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "Found {} backups in {}",
            entries.len(),
            destination.display()
        );
        Ok(BackupCatalog { entries })
    }

    pub fn entries(&self) -> &[BackupEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&BackupEntry> {
        self.entries.last()
    }

    /// Adds an archive that is about to exist, keeping name order
    pub fn include(&mut self, entry: BackupEntry) {
        self.entries.push(entry);
        self.entries.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    }

    /// The `count` oldest entries
    pub fn oldest(&self, count: usize) -> &[BackupEntry] {
        &self.entries[..count.min(self.entries.len())]
    }
}
