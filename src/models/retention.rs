use crate::models::error::{BackupError, Result};
use std::fmt;

/// Sentinel used on the command line and in settings files for "keep all".
pub const KEEP_ALL: i64 = -1;

/// How many archives survive the pruning step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retention {
    KeepAll,
    Keep(usize),
}

impl Retention {
    pub fn from_count(count: i64) -> Result<Self> {
        match count {
            KEEP_ALL => Ok(Retention::KeepAll),
            n if n >= 0 => Ok(Retention::Keep(n as usize)),
            n => Err(BackupError::InvalidConfig(format!(
                "keep must be {} (keep all) or a non-negative count, got {}",
                KEEP_ALL, n
            ))),
        }
    }

    /// Number of oldest entries to drop from a catalog of `len` entries
    pub fn excess(&self, len: usize) -> usize {
        match self {
            Retention::KeepAll => 0,
            Retention::Keep(keep) => len.saturating_sub(*keep),
        }
    }
}

impl fmt::Display for Retention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Retention::KeepAll => write!(f, "all"),
            Retention::Keep(n) => write!(f, "{}", n),
        }
    }
}
