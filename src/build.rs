//! Build orchestration
//!
//! Runs the build phase into `build-modules` and the launch phase into
//! `launch-modules`. When the build phase installs during this
//! invocation, the launch phase inherits its tree by copy and prunes dev
//! dependencies with a production install on top.

use crate::config::BuildEnvironment;
use crate::error::YarnInstallResult;
use crate::install::{
    link_existing, ChangeDetector, InstallExecutor, InstallMode, Relocation,
};
use crate::layer::{Layer, LayerContentMetadata, LayerMetadata};
use crate::process::Executable;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Directories and phases for one build
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// Application root
    pub app_dir: PathBuf,

    /// Root under which layers are created
    pub layers_dir: PathBuf,

    /// Scratch directory for the node_modules indirection link
    pub temp_dir: PathBuf,

    /// Install build-time modules
    pub build: bool,

    /// Install run-time modules
    pub launch: bool,
}

/// What happened to one layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerOutcome {
    pub mode: InstallMode,
    pub layer_path: PathBuf,

    /// Whether `yarn install` ran; false means the layer was reused
    pub installed: bool,

    /// Hash stored in the layer metadata, if any
    pub cache_sha: Option<String>,
}

/// Result of a complete build
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub project_dir: PathBuf,
    pub layers: Vec<LayerOutcome>,
}

/// Run every requested phase to completion, failing fast
pub async fn run_build(
    request: &BuildRequest,
    env: &BuildEnvironment,
    yarn: &dyn Executable,
) -> YarnInstallResult<BuildReport> {
    let project_dir = env.resolve_project_dir(&request.app_dir)?;
    if env.disable_sbom {
        debug!("SBOM generation disabled");
    }

    let mut report = BuildReport {
        project_dir: project_dir.clone(),
        layers: Vec::new(),
    };

    let mut current_layer: Option<PathBuf> = None;

    if request.build {
        let outcome = install_layer(
            InstallMode::Build,
            &project_dir,
            request,
            None,
            env,
            yarn,
        )
        .await?;
        if outcome.installed {
            current_layer = Some(outcome.layer_path.clone());
        }
        report.layers.push(outcome);
    }

    if request.launch {
        let outcome = install_layer(
            InstallMode::Launch,
            &project_dir,
            request,
            current_layer.as_deref(),
            env,
            yarn,
        )
        .await?;
        report.layers.push(outcome);
    }

    Ok(report)
}

async fn install_layer(
    mode: InstallMode,
    project_dir: &Path,
    request: &BuildRequest,
    current_layer: Option<&Path>,
    env: &BuildEnvironment,
    yarn: &dyn Executable,
) -> YarnInstallResult<LayerOutcome> {
    let layer = Layer::new(&request.layers_dir, mode.layer_name());
    let stored = layer.read_metadata().await?;

    let decision = ChangeDetector::new(yarn, env.node_env.clone())
        .should_run(project_dir, &stored.metadata)
        .await?;

    let outcome = if decision.should_run {
        info!("Installing {} modules into layer {}", mode, layer.name());

        layer.reset().await?;
        let next_layer = Relocation {
            working_dir: project_dir,
            current_layer,
            next_layer: layer.path(),
            temp_dir: &request.temp_dir,
        }
        .run()?;

        InstallExecutor::new(yarn, env)
            .execute(project_dir, &next_layer, mode)
            .await?;

        let metadata = if decision.content_hash.is_empty() {
            LayerMetadata::default()
        } else {
            LayerMetadata::with_cache_sha(decision.content_hash)
        };
        layer
            .write_metadata(&LayerContentMetadata {
                types: mode.layer_types(),
                metadata: metadata.clone(),
            })
            .await?;

        LayerOutcome {
            mode,
            layer_path: next_layer,
            installed: true,
            cache_sha: metadata.cache_sha,
        }
    } else {
        info!("Reusing cached {} modules from layer {}", mode, layer.name());

        link_existing(project_dir, layer.path())?;
        layer
            .write_metadata(&LayerContentMetadata {
                types: mode.layer_types(),
                metadata: stored.metadata.clone(),
            })
            .await?;

        LayerOutcome {
            mode,
            layer_path: layer.path().to_path_buf(),
            installed: false,
            cache_sha: stored.metadata.cache_sha,
        }
    };

    layer.export_bin_path(mode.env_scope()).await?;
    Ok(outcome)
}
