//! Buildpack layers
//!
//! A layer is a directory under the layers root plus a sibling
//! `<name>.toml` metadata file. Layers hold the installed
//! `node_modules` tree and the env files exporting its `.bin` directory.

pub mod metadata;

pub use metadata::{LayerContentMetadata, LayerMetadata, LayerTypes};

use crate::error::{YarnInstallError, YarnInstallResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Layer used for build-time modules (dev dependencies included)
pub const BUILD_MODULES_LAYER: &str = "build-modules";

/// Layer used for run-time modules (production dependencies only)
pub const LAUNCH_MODULES_LAYER: &str = "launch-modules";

/// Directory name of the installed dependency tree
pub const NODE_MODULES: &str = "node_modules";

/// Env-file scope inside a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvScope {
    /// `env.build/`, visible to subsequent buildpacks
    Build,
    /// `env.launch/`, visible to the running app
    Launch,
}

impl EnvScope {
    fn dir_name(&self) -> &'static str {
        match self {
            Self::Build => "env.build",
            Self::Launch => "env.launch",
        }
    }
}

/// A named layer rooted in the layers directory
#[derive(Debug, Clone)]
pub struct Layer {
    name: String,
    path: PathBuf,
    metadata_path: PathBuf,
}

impl Layer {
    pub fn new(layers_dir: &Path, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            path: layers_dir.join(&name),
            metadata_path: layers_dir.join(format!("{}.toml", name)),
            name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `<layer>/node_modules`
    pub fn modules_path(&self) -> PathBuf {
        self.path.join(NODE_MODULES)
    }

    /// Load the stored metadata, default when none exists
    pub async fn read_metadata(&self) -> YarnInstallResult<LayerContentMetadata> {
        LayerContentMetadata::from_file(&self.metadata_path).await
    }

    /// Persist metadata for this layer
    pub async fn write_metadata(&self, metadata: &LayerContentMetadata) -> YarnInstallResult<()> {
        metadata.write(&self.metadata_path).await
    }

    /// Remove any previous contents and recreate an empty layer directory
    pub async fn reset(&self) -> YarnInstallResult<()> {
        debug!("Resetting layer {}", self.path.display());

        match fs::remove_dir_all(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(YarnInstallError::io(
                    format!("clearing layer {}", self.path.display()),
                    e,
                ))
            }
        }

        fs::create_dir_all(&self.path).await.map_err(|e| {
            YarnInstallError::io(format!("creating layer {}", self.path.display()), e)
        })
    }

    /// Append `<layer>/node_modules/.bin` to `PATH` for the given scope
    pub async fn export_bin_path(&self, scope: EnvScope) -> YarnInstallResult<()> {
        let env_dir = self.path.join(scope.dir_name());
        fs::create_dir_all(&env_dir).await.map_err(|e| {
            YarnInstallError::io(format!("creating env directory {}", env_dir.display()), e)
        })?;

        let bin = self.modules_path().join(".bin");
        let delimiter = if cfg!(windows) { ";" } else { ":" };

        for (file, content) in [
            ("PATH.append", bin.display().to_string()),
            ("PATH.delim", delimiter.to_string()),
        ] {
            let path = env_dir.join(file);
            fs::write(&path, content).await.map_err(|e| {
                YarnInstallError::io(format!("writing env file {}", path.display()), e)
            })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn layer_paths() {
        let layer = Layer::new(Path::new("/layers"), BUILD_MODULES_LAYER);
        assert_eq!(layer.name(), "build-modules");
        assert_eq!(layer.path(), Path::new("/layers/build-modules"));
        assert_eq!(
            layer.modules_path(),
            Path::new("/layers/build-modules/node_modules")
        );
    }

    #[tokio::test]
    async fn reset_clears_contents() {
        let temp = TempDir::new().unwrap();
        let layer = Layer::new(temp.path(), LAUNCH_MODULES_LAYER);
        std::fs::create_dir_all(layer.modules_path().join("leftpad")).unwrap();

        layer.reset().await.unwrap();

        assert!(layer.path().is_dir());
        assert!(!layer.modules_path().exists());
    }

    #[tokio::test]
    async fn reset_creates_missing_layer() {
        let temp = TempDir::new().unwrap();
        let layer = Layer::new(temp.path(), BUILD_MODULES_LAYER);
        layer.reset().await.unwrap();
        assert!(layer.path().is_dir());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn export_bin_path_writes_env_files() {
        let temp = TempDir::new().unwrap();
        let layer = Layer::new(temp.path(), LAUNCH_MODULES_LAYER);

        layer.export_bin_path(EnvScope::Launch).await.unwrap();

        let env_dir = layer.path().join("env.launch");
        assert_eq!(
            std::fs::read_to_string(env_dir.join("PATH.append")).unwrap(),
            layer.modules_path().join(".bin").display().to_string()
        );
        assert_eq!(std::fs::read_to_string(env_dir.join("PATH.delim")).unwrap(), ":");
        assert!(!layer.path().join("env.build").exists());
    }

    #[tokio::test]
    async fn metadata_through_layer() {
        let temp = TempDir::new().unwrap();
        let layer = Layer::new(temp.path(), BUILD_MODULES_LAYER);

        assert_eq!(layer.read_metadata().await.unwrap().metadata.cache_sha, None);

        let metadata = LayerContentMetadata {
            types: LayerTypes {
                build: true,
                cache: true,
                launch: false,
            },
            metadata: LayerMetadata::with_cache_sha("feed"),
        };
        layer.write_metadata(&metadata).await.unwrap();

        assert!(temp.path().join("build-modules.toml").is_file());
        assert_eq!(
            layer.read_metadata().await.unwrap().metadata.cache_sha.as_deref(),
            Some("feed")
        );
    }
}
