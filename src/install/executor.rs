//! yarn install execution
//!
//! `Idle → ConfigQuery → [OfflineMirrorCheck] → Install → Success | Failed`.
//! No state is re-entered and nothing is retried.

use crate::config::BuildEnvironment;
use crate::error::{YarnInstallError, YarnInstallResult};
use crate::install::InstallMode;
use crate::layer::NODE_MODULES;
use crate::process::{Executable, Execution};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Find the offline mirror directory in `yarn config get` output.
///
/// Yarn may print warning lines (e.g. when there is no network) before
/// the value; the first remaining line starting with `/` wins.
pub fn parse_offline_mirror(output: &str) -> Option<PathBuf> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with("warning"))
        .find(|line| line.starts_with('/'))
        .map(PathBuf::from)
}

/// Arguments for `yarn install` into `<modules_layer>/node_modules`
pub fn install_args(modules_layer: &Path, mode: InstallMode, offline: bool) -> Vec<String> {
    let mut args = vec![
        "install".to_string(),
        "--ignore-engines".to_string(),
        "--frozen-lockfile".to_string(),
    ];

    if offline {
        args.push("--offline".to_string());
    }

    if mode.includes_dev_dependencies() {
        args.push("--production".to_string());
        args.push("false".to_string());
    }

    args.push("--modules-folder".to_string());
    args.push(modules_layer.join(NODE_MODULES).display().to_string());
    args
}

/// Runs `yarn install` for one layer
pub struct InstallExecutor<'a> {
    yarn: &'a dyn Executable,
    env: &'a BuildEnvironment,
}

impl<'a> InstallExecutor<'a> {
    pub fn new(yarn: &'a dyn Executable, env: &'a BuildEnvironment) -> Self {
        Self { yarn, env }
    }

    /// Install dependencies from `working_dir` into `modules_layer`
    pub async fn execute(
        &self,
        working_dir: &Path,
        modules_layer: &Path,
        mode: InstallMode,
    ) -> YarnInstallResult<()> {
        let path = self.env.path_with(&Path::new(NODE_MODULES).join(".bin"));

        let offline = self.offline_mirror_available(working_dir, &path).await?;
        let args = install_args(modules_layer, mode, offline);

        info!("Running '{} {}'", self.yarn.name(), args.join(" "));

        let execution = Execution::new(working_dir, args).with_env("PATH", path);
        let output = self.yarn.execute(&execution).await?;
        if !output.success {
            return Err(YarnInstallError::Install {
                output: output.combined(),
            });
        }

        debug!("Install finished for {}", modules_layer.display());
        Ok(())
    }

    async fn offline_mirror_available(
        &self,
        working_dir: &Path,
        path: &str,
    ) -> YarnInstallResult<bool> {
        let query = Execution::new(working_dir, ["config", "get", "yarn-offline-mirror"])
            .with_env("PATH", path);
        let output = self.yarn.execute(&query).await?;
        if !output.success {
            return Err(YarnInstallError::ConfigQuery {
                output: output.combined(),
            });
        }

        let Some(mirror) = parse_offline_mirror(&output.combined()) else {
            return Ok(false);
        };

        match tokio::fs::metadata(&mirror).await {
            Ok(meta) if meta.is_dir() => {
                debug!("Offline mirror found at {}", mirror.display());
                Ok(true)
            }
            Ok(_) => Ok(false),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(YarnInstallError::OfflineMirrorStat {
                path: mirror,
                source: e,
            }),
        }
    }
}
