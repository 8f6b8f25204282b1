use crate::service::archiver::ToolInvocation;
use std::path::PathBuf;

/// Outcome of the archive creation step
#[derive(Debug, Clone, PartialEq)]
pub enum ArchiveResult {
    Created {
        path: PathBuf,
        size: u64,
        /// Hours since the previous backup, `None` on the first run
        diff_hours: Option<f64>,
    },
    DryRun {
        invocation: ToolInvocation,
        staging_path: PathBuf,
        path: PathBuf,
    },
}

/// Outcome of the pruning step
#[derive(Debug, Default)]
pub struct PruneReport {
    /// Backups deleted, or that would be deleted in dry-run mode
    pub removed: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}
