//! Install change detection
//!
//! Hashes `yarn.lock`, the resolved yarn configuration and `NODE_ENV`
//! into a content key. A reinstall is skipped only when the key matches
//! the `cache_sha` stored by the previous build.

use crate::error::{YarnInstallError, YarnInstallResult};
use crate::layer::LayerMetadata;
use crate::process::{Executable, Execution};
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::debug;

/// Lockfile whose presence and content drive the decision
pub const LOCKFILE: &str = "yarn.lock";

/// Outcome of the change check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallDecision {
    /// Whether `yarn install` must run
    pub should_run: bool,

    /// Hash to persist after a successful install. Empty when the
    /// install is skipped, and also when no lockfile exists.
    pub content_hash: String,
}

impl InstallDecision {
    fn run(content_hash: impl Into<String>) -> Self {
        Self {
            should_run: true,
            content_hash: content_hash.into(),
        }
    }

    fn skip() -> Self {
        Self {
            should_run: false,
            content_hash: String::new(),
        }
    }
}

/// SHA256 over the lockfile bytes followed by the config buffer and
/// `NODE_ENV`, hex encoded
pub fn content_hash(lockfile: &[u8], config_output: &str, node_env: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(lockfile);
    hasher.update(config_output.as_bytes());
    hasher.update(node_env.as_bytes());
    hex::encode(hasher.finalize())
}

/// Decides whether dependencies need reinstalling
pub struct ChangeDetector<'a> {
    yarn: &'a dyn Executable,
    node_env: String,
}

impl<'a> ChangeDetector<'a> {
    pub fn new(yarn: &'a dyn Executable, node_env: impl Into<String>) -> Self {
        Self {
            yarn,
            node_env: node_env.into(),
        }
    }

    /// Compare the current content hash of `working_dir` with `stored`
    pub async fn should_run(
        &self,
        working_dir: &Path,
        stored: &LayerMetadata,
    ) -> YarnInstallResult<InstallDecision> {
        let lockfile_path = working_dir.join(LOCKFILE);
        let lockfile = match tokio::fs::read(&lockfile_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No {} found, install required", LOCKFILE);
                return Ok(InstallDecision::run(""));
            }
            Err(e) => {
                return Err(YarnInstallError::Hash {
                    context: format!("reading {}", lockfile_path.display()),
                    source: e,
                })
            }
        };

        let execution = Execution::new(working_dir, ["config", "list", "--silent"]);
        let output = self.yarn.execute(&execution).await?;
        if !output.success {
            return Err(YarnInstallError::ConfigQuery {
                output: output.combined(),
            });
        }

        let hash = content_hash(&lockfile, &output.combined(), &self.node_env);
        debug!(
            "Computed content hash {} (stored: {:?})",
            hash, stored.cache_sha
        );

        match stored.cache_sha {
            Some(ref previous) if *previous == hash => Ok(InstallDecision::skip()),
            _ => Ok(InstallDecision::run(hash)),
        }
    }
}
