//! Yarn project detection
//!
//! A project qualifies when both `package.json` and `yarn.lock` sit in
//! the project directory. Detection produces the build plan entries the
//! rest of the build relies on.

use crate::error::{YarnInstallError, YarnInstallResult};
use crate::install::LOCKFILE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Manifest read for the node engine constraint
pub const PACKAGE_JSON: &str = "package.json";

/// Subset of `package.json` this buildpack reads
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageJson {
    #[serde(default)]
    pub engines: Engines,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Engines {
    pub node: Option<String>,
}

impl PackageJson {
    pub async fn from_file(path: &Path) -> YarnInstallResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| YarnInstallError::io(format!("reading {}", path.display()), e))?;

        serde_json::from_str(&content).map_err(|e| YarnInstallError::PackageJsonInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

/// Result of running detection against a project directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    Pass(BuildPlan),
    Fail { reason: String },
}

/// Build plan contributed by a passing detection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildPlan {
    pub provides: Vec<Provision>,
    pub requires: Vec<Requirement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Provision {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Requirement {
    pub name: String,
    pub metadata: RequirementMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RequirementMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_source: Option<String>,
    pub build: bool,
}

impl BuildPlan {
    pub fn to_toml(&self) -> YarnInstallResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Detect a yarn project in `project_dir`
pub async fn detect(project_dir: &Path) -> YarnInstallResult<Detection> {
    let package_json = project_dir.join(PACKAGE_JSON);
    if !package_json.is_file() {
        return Ok(Detection::Fail {
            reason: format!("no '{}' found in {}", PACKAGE_JSON, project_dir.display()),
        });
    }

    let lockfile: PathBuf = project_dir.join(LOCKFILE);
    if !lockfile.is_file() {
        return Ok(Detection::Fail {
            reason: format!("no '{}' found in {}", LOCKFILE, project_dir.display()),
        });
    }

    let manifest = PackageJson::from_file(&package_json).await?;
    let node_version = manifest.engines.node.filter(|v| !v.trim().is_empty());
    debug!("package.json node engine: {:?}", node_version);

    let node = Requirement {
        name: "node".to_string(),
        metadata: RequirementMetadata {
            version_source: node_version.as_ref().map(|_| PACKAGE_JSON.to_string()),
            version: node_version,
            build: true,
        },
    };
    let yarn = Requirement {
        name: "yarn".to_string(),
        metadata: RequirementMetadata {
            build: true,
            ..Default::default()
        },
    };

    Ok(Detection::Pass(BuildPlan {
        provides: vec![Provision {
            name: "node_modules".to_string(),
        }],
        requires: vec![node, yarn],
    }))
}
