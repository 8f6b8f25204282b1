use crate::models::error::{BackupError, Result};
use log::debug;
use std::fmt;
use std::path::Path;
use std::process::Command;

/// A program plus its ordered argument list, assembled fresh for every call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: String,
    pub args: Vec<String>,
}

impl fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// `-c -v -z -f <archive> -C <parent> ./<base>`
pub fn create_args(
    archiver: &str,
    archive: &Path,
    parent: &Path,
    base_name: &str,
) -> ToolInvocation {
    ToolInvocation {
        program: archiver.to_string(),
        args: vec![
            "-c".to_string(), // create
            "-v".to_string(),
            "-z".to_string(), // gzip
            "-f".to_string(),
            archive.display().to_string(),
            "-C".to_string(), // change to this dir first
            parent.display().to_string(),
            format!("./{}", base_name),
        ],
    }
}

/// `-t -v -z -f <archive>`
pub fn list_args(archiver: &str, archive: &Path) -> ToolInvocation {
    ToolInvocation {
        program: archiver.to_string(),
        args: vec![
            "-t".to_string(), // list
            "-v".to_string(),
            "-z".to_string(),
            "-f".to_string(),
            archive.display().to_string(),
        ],
    }
}

/// `-a --progress -z <source> <destination>`
#[allow(dead_code)]
pub fn sync_args(sync_tool: &str, source: &Path, destination: &Path) -> ToolInvocation {
    ToolInvocation {
        program: sync_tool.to_string(),
        args: vec![
            "-a".to_string(), // same as -rlptgoD
            "--progress".to_string(),
            "-z".to_string(),
            source.display().to_string(),
            destination.display().to_string(),
        ],
    }
}

#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Runs external tools synchronously. Implementations must block until the
/// program exits.
pub trait ToolRunner {
    fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput>;
}

/// Runs tools as child processes of this one
#[derive(Debug, Default)]
pub struct ProcessRunner;

impl ToolRunner for ProcessRunner {
    fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput> {
        debug!("Running: {}", invocation);
        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .output()
            .map_err(|cause| BackupError::ToolLaunch {
                program: invocation.program.clone(),
                cause,
            })?;

        Ok(ToolOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// Entry names inside an archive, as reported by the archiver's list mode
pub fn list_backup_contents(
    runner: &dyn ToolRunner,
    archiver: &str,
    archive: &Path,
) -> Result<Vec<String>> {
    let output = runner.run(&list_args(archiver, archive))?;
    if !output.success {
        return Err(BackupError::ArchiveList {
            archive: archive.to_path_buf(),
            code: output.code,
            stderr: output.stderr,
        });
    }

    Ok(output
        .stdout
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
