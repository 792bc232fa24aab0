//! Error types for yarn-install
//!
//! All modules use `YarnInstallResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for yarn-install operations
pub type YarnInstallResult<T> = Result<T, YarnInstallError>;

/// All errors that can occur while detecting or building
#[derive(Error, Debug)]
pub enum YarnInstallError {
    // Input validation errors
    #[error("could not find project path \"{0}\"")]
    ProjectPathNotFound(PathBuf),

    #[error("failed to parse package.json at {path}: {reason}")]
    PackageJsonInvalid { path: PathBuf, reason: String },

    // Module relocation errors
    #[error("failed to stat node_modules directory {path}: {source}")]
    ModulesStat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to copy node_modules directory from {from} to {to}: {source}")]
    ModulesCopy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create node_modules directory {path}: {source}")]
    ModulesCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to move node_modules directory to layer {to}: {source}")]
    ModulesMove {
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to symlink node_modules {link} -> {target}: {source}")]
    ModulesSymlink {
        link: PathBuf,
        target: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to remove stale node_modules link {path}: {source}")]
    ModulesUnlink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to remove vendored node_modules directory {path}: {source}")]
    ModulesRemove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Subprocess errors
    #[error("failed to execute yarn config output:\n{output}")]
    ConfigQuery { output: String },

    #[error("failed to confirm existence of offline mirror directory {path}: {source}")]
    OfflineMirrorStat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to execute install:\n{output}")]
    Install { output: String },

    #[error("command failed to start: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // Hashing errors
    #[error("failed to compute content hash: {context}")]
    Hash {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Layer metadata errors
    #[error("invalid layer metadata at {path}: {reason}")]
    LayerMetadataInvalid { path: PathBuf, reason: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl YarnInstallError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ProjectPathNotFound(_) => {
                Some("BP_NODE_PROJECT_PATH must be relative to the application root")
            }
            Self::CommandFailed { .. } => Some("Make sure yarn is installed and on PATH"),
            Self::ModulesSymlink { .. } => {
                Some("Remove any leftover node_modules link before rebuilding")
            }
            Self::Install { .. } => Some("Check that yarn.lock is in sync with package.json"),
            _ => None,
        }
    }
}
