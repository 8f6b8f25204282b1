use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Failed to read config file '{path}': {cause}")]
    ConfigRead { path: PathBuf, cause: io::Error },

    #[error("Failed to parse config file '{path}': {cause}")]
    ConfigParse {
        path: PathBuf,
        cause: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read backup directory '{path}': {cause}")]
    DirectoryRead { path: PathBuf, cause: String },

    #[error("Failed to get metadata for '{path}': {cause}")]
    MetadataError { path: PathBuf, cause: io::Error },

    #[error("Backup file '{file_name}' has no valid timestamp: {cause}")]
    TimestampFormat { file_name: String, cause: String },

    #[error("Failed to launch '{program}': {cause}")]
    ToolLaunch { program: String, cause: io::Error },

    #[error("Archiver failed creating '{archive}' (exit code {code:?}): {stderr}")]
    ArchiveCreation {
        archive: PathBuf,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Archiver failed listing '{archive}' (exit code {code:?}): {stderr}")]
    ArchiveList {
        archive: PathBuf,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Failed to move '{from}' to '{to}': {cause}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        cause: io::Error,
    },

    #[error("Removing directory backups is not supported: '{path}'")]
    UnsupportedEntry { path: PathBuf },

    #[error("Failed to remove backup '{path}': {cause}")]
    Deletion { path: PathBuf, cause: io::Error },

    #[error("Backup run interrupted")]
    Interrupted,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, BackupError>;
