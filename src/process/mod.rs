//! Subprocess abstraction for the yarn CLI
//!
//! Every yarn invocation goes through the [`Executable`] trait so the
//! install logic can be driven by a recording fake in tests. Output is
//! captured in memory, never streamed.

mod yarn;

pub use yarn::Yarn;

use crate::error::YarnInstallResult;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A single subprocess invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Execution {
    /// Arguments passed after the executable name
    pub args: Vec<String>,

    /// Working directory for the child
    pub dir: PathBuf,

    /// Variables layered over the inherited parent environment
    pub env: BTreeMap<String, String>,
}

impl Execution {
    /// Create an execution running in `dir`
    pub fn new<I, S>(dir: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            dir: dir.into(),
            env: BTreeMap::new(),
        }
    }

    /// Add an environment override
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Arguments joined for log lines and error messages
    pub fn command_line(&self) -> String {
        self.args.join(" ")
    }
}

/// Captured result of a finished subprocess
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    /// Whether the child exited with status zero
    pub success: bool,

    /// Exit code, if the child was not killed by a signal
    pub code: Option<i32>,

    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    /// Successful output with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given exit code and stderr
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Stdout followed by stderr, the way a shared buffer would see them
    pub fn combined(&self) -> String {
        let mut buffer = String::with_capacity(self.stdout.len() + self.stderr.len());
        buffer.push_str(&self.stdout);
        buffer.push_str(&self.stderr);
        buffer
    }
}

/// Abstract interface to the package manager binary
#[async_trait]
pub trait Executable: Send + Sync {
    /// Run the executable to completion and capture its output.
    ///
    /// Returns `Err` only when the process could not be spawned; a
    /// non-zero exit is reported through [`ExecOutput::success`].
    async fn execute(&self, execution: &Execution) -> YarnInstallResult<ExecOutput>;

    /// Human-readable executable name for log lines
    fn name(&self) -> &str;
}
