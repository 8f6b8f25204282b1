/// Defines the dry-run behavior mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DryRunMode {
    /// Normal operation - run the archiver and delete old backups
    None,

    /// Preview - report the archiver invocation and the backups that would be
    /// removed without touching the destination
    Preview,
}

impl DryRunMode {
    pub fn from_flag(dry_run: bool) -> Self {
        if dry_run {
            DryRunMode::Preview
        } else {
            DryRunMode::None
        }
    }

    /// Returns true if this is any dry-run mode
    pub fn is_dry_run(&self) -> bool {
        matches!(self, DryRunMode::Preview)
    }

    /// Returns true if the archiver subprocess should actually be executed
    pub fn should_run_archiver(&self) -> bool {
        matches!(self, DryRunMode::None)
    }

    /// Returns true if pruned backups should actually be deleted
    pub fn should_delete_files(&self) -> bool {
        matches!(self, DryRunMode::None)
    }

    /// Get display string for log lines and progress spinners
    pub fn log_prefix(&self) -> &'static str {
        match self {
            DryRunMode::None => "",
            DryRunMode::Preview => "[DRY RUN] ",
        }
    }
}
