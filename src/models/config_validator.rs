use crate::models::config::JobConfig;
use crate::models::error::{BackupError, Result};
use log::{debug, info};
use std::fs;
use std::path::{Path, MAIN_SEPARATOR};

/// Validates the entire configuration
pub fn validate_config(config: &JobConfig) -> Result<()> {
    debug!("Validating configuration...");

    validate_source(&config.source)?;

    validate_destination(&config.destination)?;

    validate_naming(&config.prefix, &config.file_extension)?;

    validate_programs(&config.archiver, &config.sync_tool)?;

    info!(
        "Backing up {} to {} (keep: {}, interval: {}h)",
        config.source.display(),
        config.destination.display(),
        config.keep,
        config.interval.num_hours()
    );
    Ok(())
}

fn validate_source(source: &Path) -> Result<()> {
    fs::symlink_metadata(source).map_err(|cause| BackupError::MetadataError {
        path: source.to_path_buf(),
        cause,
    })?;
    Ok(())
}

fn validate_destination(destination: &Path) -> Result<()> {
    if !destination.exists() {
        #[cfg(windows)]
        let suggestion = format!("mkdir \"{}\"", destination.display());
        #[cfg(not(windows))]
        let suggestion = format!("mkdir -p \"{}\"", destination.display());

        return Err(BackupError::InvalidConfig(format!(
            "Backup destination does not exist: {}\nSuggestion: Create the directory with: {}",
            destination.display(),
            suggestion
        )));
    }

    if !destination.is_dir() {
        return Err(BackupError::InvalidConfig(format!(
            "Backup destination is not a directory: {}",
            destination.display()
        )));
    }

    Ok(())
}

fn validate_naming(prefix: &str, file_extension: &str) -> Result<()> {
    if prefix.is_empty() {
        return Err(BackupError::InvalidConfig(
            "prefix must not be empty".to_string(),
        ));
    }

    if prefix.contains(MAIN_SEPARATOR) || prefix.contains('/') {
        return Err(BackupError::InvalidConfig(format!(
            "prefix must not contain a path separator: {}",
            prefix
        )));
    }

    if !file_extension.starts_with('.') || file_extension.len() < 2 {
        return Err(BackupError::InvalidConfig(format!(
            "file extension must start with '.', got '{}'",
            file_extension
        )));
    }

    Ok(())
}

fn validate_programs(archiver: &str, sync_tool: &str) -> Result<()> {
    if archiver.trim().is_empty() {
        return Err(BackupError::InvalidConfig(
            "archiver program must not be empty".to_string(),
        ));
    }
    if sync_tool.trim().is_empty() {
        return Err(BackupError::InvalidConfig(
            "sync tool program must not be empty".to_string(),
        ));
    }
    Ok(())
}
