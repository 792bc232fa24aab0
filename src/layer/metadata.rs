//! Layer content metadata
//!
//! Each layer has a sibling `<name>.toml` describing its types and the
//! buildpack-owned metadata table. The only key this buildpack stores
//! is `cache_sha`.

use crate::error::{YarnInstallError, YarnInstallResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Parsed `<layer>.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerContentMetadata {
    /// Layer visibility flags
    #[serde(default)]
    pub types: LayerTypes,

    /// Buildpack-owned metadata
    #[serde(default)]
    pub metadata: LayerMetadata,
}

/// Which lifecycle phases can see the layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerTypes {
    pub build: bool,
    pub launch: bool,
    pub cache: bool,
}

/// Metadata persisted between builds
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerMetadata {
    /// Content hash of the last successful install
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_sha: Option<String>,
}

impl LayerMetadata {
    pub fn with_cache_sha(sha: impl Into<String>) -> Self {
        Self {
            cache_sha: Some(sha.into()),
        }
    }
}

impl LayerContentMetadata {
    /// Read metadata from disk, defaulting when the file is absent
    pub async fn from_file(path: &Path) -> YarnInstallResult<Self> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(YarnInstallError::io(
                    format!("reading layer metadata {}", path.display()),
                    e,
                ))
            }
        };

        Self::parse(&content).map_err(|reason| YarnInstallError::LayerMetadataInvalid {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Parse metadata from a TOML string
    pub fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Write metadata to disk
    pub async fn write(&self, path: &Path) -> YarnInstallResult<()> {
        let content = toml::to_string_pretty(self)?;
        tokio::fs::write(path, content).await.map_err(|e| {
            YarnInstallError::io(format!("writing layer metadata {}", path.display()), e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const BUILD_LAYER: &str = r#"
[types]
build = true
cache = true

[metadata]
cache_sha = "abc"
"#;

    #[test]
    fn parse_layer_metadata() {
        let parsed = LayerContentMetadata::parse(BUILD_LAYER).unwrap();
        assert!(parsed.types.build);
        assert!(parsed.types.cache);
        assert!(!parsed.types.launch);
        assert_eq!(parsed.metadata.cache_sha.as_deref(), Some("abc"));
    }

    #[test]
    fn parse_without_metadata_table() {
        let parsed = LayerContentMetadata::parse("[types]\nlaunch = true\n").unwrap();
        assert!(parsed.types.launch);
        assert_eq!(parsed.metadata.cache_sha, None);
    }

    #[test]
    fn parse_rejects_wrong_types() {
        assert!(LayerContentMetadata::parse("[metadata]\ncache_sha = 12\n").is_err());
    }

    #[tokio::test]
    async fn missing_file_is_default() {
        let temp = TempDir::new().unwrap();
        let loaded = LayerContentMetadata::from_file(&temp.path().join("none.toml"))
            .await
            .unwrap();
        assert_eq!(loaded, LayerContentMetadata::default());
    }

    #[tokio::test]
    async fn write_then_read() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("launch-modules.toml");
        let written = LayerContentMetadata {
            types: LayerTypes {
                launch: true,
                cache: true,
                ..Default::default()
            },
            metadata: LayerMetadata::with_cache_sha("0123abcd"),
        };

        written.write(&path).await.unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("cache_sha = \"0123abcd\""));

        let loaded = LayerContentMetadata::from_file(&path).await.unwrap();
        assert_eq!(loaded, written);
    }

    #[tokio::test]
    async fn invalid_file_reports_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.toml");
        std::fs::write(&path, "not = [valid").unwrap();

        let err = LayerContentMetadata::from_file(&path).await.unwrap_err();
        assert!(matches!(err, YarnInstallError::LayerMetadataInvalid { .. }));
    }
}
