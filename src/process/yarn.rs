//! The real yarn executable
//!
//! Runs yarn through `tokio::process` with piped output. The child
//! inherits the parent environment plus the execution's overrides.

use crate::error::{YarnInstallError, YarnInstallResult};
use crate::process::{ExecOutput, Execution, Executable};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Yarn binary resolved from `PATH` or an explicit location
pub struct Yarn {
    binary: PathBuf,
}

impl Yarn {
    /// Yarn resolved through `PATH`
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("yarn"),
        }
    }

    /// Yarn at an explicit location
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

impl Default for Yarn {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Executable for Yarn {
    async fn execute(&self, execution: &Execution) -> YarnInstallResult<ExecOutput> {
        debug!(
            "Executing: {} {:?} in {}",
            self.binary.display(),
            execution.args,
            execution.dir.display()
        );

        let output = Command::new(&self.binary)
            .args(&execution.args)
            .current_dir(&execution.dir)
            .envs(&execution.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                YarnInstallError::command_failed(
                    format!("{} {}", self.binary.display(), execution.command_line()),
                    e,
                )
            })?;

        Ok(ExecOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }

    fn name(&self) -> &str {
        "yarn"
    }
}
