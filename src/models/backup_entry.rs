use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// One archive already present in the destination directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupEntry {
    pub path: PathBuf,
    pub file_name: String,
    pub timestamp: DateTime<Utc>,
    pub is_dir: bool,
}
