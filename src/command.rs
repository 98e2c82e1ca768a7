//! Checked execution of external tools (`git push`, `gh`).

use std::ffi::OsStr;
use std::path::Path;
use std::process::{Command, ExitStatus};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}")]
    Exited { program: String, status: ExitStatus },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
}

impl CommandError {
    /// True when the tool ran but reported failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. } | Self::Exited { .. })
    }
}

/// Runs `program` and returns its trimmed stdout on success.
pub fn run<I, S>(program: &str, args: I, cwd: Option<&Path>) -> Result<String, CommandError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new(program);
    cmd.args(args);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    debug!(command = ?cmd, "running");

    let output = cmd.output().map_err(|source| CommandError::Spawn {
        program: program.to_string(),
        source,
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if stderr.is_empty() {
            return Err(CommandError::Exited {
                program: program.to_string(),
                status: output.status,
            });
        }
        return Err(CommandError::Failed {
            program: program.to_string(),
            status: output.status,
            stderr,
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Like [`run`], but the child shares the terminal so progress output stays
/// visible.
pub fn run_inherited<I, S>(program: &str, args: I, cwd: Option<&Path>) -> Result<(), CommandError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new(program);
    cmd.args(args);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    debug!(command = ?cmd, "running");

    let status = cmd.status().map_err(|source| CommandError::Spawn {
        program: program.to_string(),
        source,
    })?;

    if !status.success() {
        return Err(CommandError::Exited {
            program: program.to_string(),
            status,
        });
    }

    Ok(())
}
