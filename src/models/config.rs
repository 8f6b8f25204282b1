use crate::models::config_validator::validate_config;
use crate::models::dry_run_mode::DryRunMode;
use crate::models::error::{BackupError, Result};
use crate::models::retention::{Retention, KEEP_ALL};
use crate::utils::timestamp::{fixed_width, DEFAULT_TIMESTAMP_FORMAT};
use chrono::Duration;
use log::info;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

/// Optional settings file, every field falls back to a built-in default
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_file_extension")]
    pub file_extension: String,
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,
    #[serde(default = "default_keep")]
    pub keep: i64,
    #[serde(default = "default_interval_hours")]
    pub interval_hours: u64,
    #[serde(default = "default_archiver")]
    pub archiver: String,
    #[serde(default = "default_sync_tool")]
    pub sync_tool: String,
}

fn default_prefix() -> String {
    "bak".to_string()
}
fn default_file_extension() -> String {
    ".tar.gz".to_string()
}
fn default_timestamp_format() -> String {
    DEFAULT_TIMESTAMP_FORMAT.to_string()
}
const fn default_keep() -> i64 {
    KEEP_ALL
}
const fn default_interval_hours() -> u64 {
    24
}
fn default_archiver() -> String {
    "tar".to_string()
}
fn default_sync_tool() -> String {
    "rsync".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            prefix: default_prefix(),
            file_extension: default_file_extension(),
            timestamp_format: default_timestamp_format(),
            keep: default_keep(),
            interval_hours: default_interval_hours(),
            archiver: default_archiver(),
            sync_tool: default_sync_tool(),
        }
    }
}

/// Values given on the command line. Each one wins over the settings file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub prefix: Option<String>,
    pub file_extension: Option<String>,
    pub keep: Option<i64>,
    pub interval_hours: Option<u64>,
}

/// Immutable configuration for a single backup run
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub prefix: String,
    pub file_extension: String,
    pub timestamp_format: String,
    pub timestamp_length: usize,
    pub keep: Retention,
    pub interval: Duration,
    pub dry_run: DryRunMode,
    pub archiver: String,
    pub sync_tool: String,
}

impl JobConfig {
    pub fn new(
        source: PathBuf,
        destination: PathBuf,
        settings: Settings,
        overrides: Overrides,
        dry_run: DryRunMode,
    ) -> Result<Self> {
        let interval_hours = overrides.interval_hours.unwrap_or(settings.interval_hours);
        let interval = i64::try_from(interval_hours)
            .ok()
            .and_then(Duration::try_hours)
            .ok_or_else(|| {
                BackupError::InvalidConfig(format!(
                    "interval of {} hours is out of range",
                    interval_hours
                ))
            })?;

        let timestamp_length = fixed_width(&settings.timestamp_format)
            .map_err(BackupError::InvalidConfig)?;

        let config = JobConfig {
            source,
            destination,
            prefix: overrides.prefix.unwrap_or(settings.prefix),
            file_extension: overrides.file_extension.unwrap_or(settings.file_extension),
            timestamp_format: settings.timestamp_format,
            timestamp_length,
            keep: Retention::from_count(overrides.keep.unwrap_or(settings.keep))?,
            interval,
            dry_run,
            archiver: settings.archiver,
            sync_tool: settings.sync_tool,
        };

        validate_config(&config)?;

        Ok(config)
    }
}

pub fn setup_settings(config_file: Option<&str>) -> Result<Settings> {
    let Some(config_file) = config_file else {
        return Ok(Settings::default());
    };

    let config_path = PathBuf::from(config_file);
    info!("Loading settings from: {}", config_path.display());

    let config_str = fs::read_to_string(&config_path).map_err(|cause| {
        BackupError::ConfigRead {
            path: config_path.clone(),
            cause,
        }
    })?;

    serde_json::from_str(&config_str).map_err(|cause| BackupError::ConfigParse {
        path: config_path,
        cause,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn write_settings(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();
        temp_file.flush().unwrap();
        temp_file
    }

    #[test]
    fn test_load_settings_with_all_fields() {
        let temp_file = write_settings(
            r#"{
            "prefix": "snap",
            "file_extension": ".tgz",
            "timestamp_format": "%Y%m%d%H%M%S",
            "keep": 5,
            "interval_hours": 6,
            "archiver": "gtar",
            "sync_tool": "/usr/local/bin/rsync"
        }"#,
        );

        let settings = setup_settings(temp_file.path().to_str()).unwrap();

        assert_eq!(settings.prefix, "snap");
        assert_eq!(settings.file_extension, ".tgz");
        assert_eq!(settings.timestamp_format, "%Y%m%d%H%M%S");
        assert_eq!(settings.keep, 5);
        assert_eq!(settings.interval_hours, 6);
        assert_eq!(settings.archiver, "gtar");
        assert_eq!(settings.sync_tool, "/usr/local/bin/rsync");
    }

    #[test]
    fn test_load_settings_with_defaults() {
        let temp_file = write_settings("{}");

        let settings = setup_settings(temp_file.path().to_str()).unwrap();

        assert_eq!(settings.prefix, "bak");
        assert_eq!(settings.file_extension, ".tar.gz");
        assert_eq!(settings.timestamp_format, "%Y-%m-%d-%H-%M-%S");
        assert_eq!(settings.keep, -1);
        assert_eq!(settings.interval_hours, 24);
        assert_eq!(settings.archiver, "tar");
    }

    #[test]
    fn test_no_settings_file_uses_defaults() {
        let settings = setup_settings(None).unwrap();
        assert_eq!(settings.prefix, "bak");
        assert_eq!(settings.keep, -1);
    }

    #[test]
    fn test_error_on_missing_settings_file() {
        match setup_settings(Some("/this/does/not/exist/settings.json")) {
            Err(BackupError::ConfigRead { .. }) => {}
            other => panic!("Expected ConfigRead error, got {:?}", other),
        }
    }

    #[test]
    fn test_error_on_invalid_json() {
        let temp_file = write_settings(r#"{ "keep": "three" }"#);

        match setup_settings(temp_file.path().to_str()) {
            Err(BackupError::ConfigParse { .. }) => {}
            other => panic!("Expected ConfigParse error, got {:?}", other),
        }
    }

    #[test]
    fn test_overrides_win_over_settings() {
        let source = TempDir::new().unwrap();
        let destination = TempDir::new().unwrap();
        let settings = Settings {
            keep: 10,
            interval_hours: 48,
            ..Settings::default()
        };
        let overrides = Overrides {
            keep: Some(2),
            interval_hours: Some(1),
            prefix: Some("nightly".to_string()),
            file_extension: None,
        };

        let config = JobConfig::new(
            source.path().to_path_buf(),
            destination.path().to_path_buf(),
            settings,
            overrides,
            DryRunMode::None,
        )
        .unwrap();

        assert_eq!(config.keep, Retention::Keep(2));
        assert_eq!(config.interval, Duration::hours(1));
        assert_eq!(config.prefix, "nightly");
        assert_eq!(config.file_extension, ".tar.gz");
        assert_eq!(config.timestamp_length, 19);
    }

    #[test]
    fn test_keep_below_sentinel_is_rejected() {
        let source = TempDir::new().unwrap();
        let destination = TempDir::new().unwrap();
        let overrides = Overrides {
            keep: Some(-5),
            ..Overrides::default()
        };

        let result = JobConfig::new(
            source.path().to_path_buf(),
            destination.path().to_path_buf(),
            Settings::default(),
            overrides,
            DryRunMode::None,
        );

        assert!(matches!(result, Err(BackupError::InvalidConfig(_))));
    }
}
