//! Build environment configuration
//!
//! The variables a build reacts to are captured once into a
//! [`BuildEnvironment`] value and passed down explicitly. Nothing in the
//! crate reads or mutates the process environment after startup.

use crate::error::{YarnInstallError, YarnInstallResult};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Relative project subdirectory inside the application root
pub const PROJECT_PATH_VAR: &str = "BP_NODE_PROJECT_PATH";

/// Node environment, hashed into the install decision
pub const NODE_ENV_VAR: &str = "NODE_ENV";

/// Disables SBOM generation
pub const DISABLE_SBOM_VAR: &str = "BP_DISABLE_SBOM";

/// Executable search path
pub const PATH_VAR: &str = "PATH";

/// Snapshot of the variables that influence a build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildEnvironment {
    /// Value of `BP_NODE_PROJECT_PATH`, if set and non-empty
    pub project_path: Option<String>,

    /// Value of `NODE_ENV`, empty when unset
    pub node_env: String,

    /// Whether `BP_DISABLE_SBOM` is truthy
    pub disable_sbom: bool,

    /// Value of `PATH`, empty when unset
    pub path: String,
}

impl BuildEnvironment {
    /// Capture the current process environment
    pub fn from_process() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Build from any set of key/value pairs
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut env = Self::default();
        for (key, value) in vars {
            match key.as_ref() {
                PROJECT_PATH_VAR => {
                    let value = value.into();
                    env.project_path = (!value.is_empty()).then_some(value);
                }
                NODE_ENV_VAR => env.node_env = value.into(),
                DISABLE_SBOM_VAR => env.disable_sbom = parse_bool(&value.into()),
                PATH_VAR => env.path = value.into(),
                _ => {}
            }
        }
        env
    }

    /// `PATH` extended with `extra`, using the platform separator
    pub fn path_with(&self, extra: &Path) -> String {
        if self.path.is_empty() {
            return extra.display().to_string();
        }
        let separator = if cfg!(windows) { ';' } else { ':' };
        format!("{}{}{}", self.path, separator, extra.display())
    }

    /// Resolve the project directory inside `app_dir`.
    ///
    /// Without `BP_NODE_PROJECT_PATH` this is `app_dir` itself. With it,
    /// the joined path must exist as a directory.
    pub fn resolve_project_dir(&self, app_dir: &Path) -> YarnInstallResult<PathBuf> {
        let Some(ref relative) = self.project_path else {
            return Ok(app_dir.to_path_buf());
        };

        let project_dir = app_dir.join(relative);
        if !project_dir.is_dir() {
            return Err(YarnInstallError::ProjectPathNotFound(project_dir));
        }

        debug!("Using project path: {}", project_dir.display());
        Ok(project_dir)
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "t" | "true" | "yes" | "y" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn from_vars_picks_known_keys() {
        let env = BuildEnvironment::from_vars([
            ("NODE_ENV", "production"),
            ("BP_NODE_PROJECT_PATH", "web"),
            ("BP_DISABLE_SBOM", "true"),
            ("PATH", "/usr/bin"),
            ("HOME", "/root"),
        ]);

        assert_eq!(env.node_env, "production");
        assert_eq!(env.project_path.as_deref(), Some("web"));
        assert!(env.disable_sbom);
        assert_eq!(env.path, "/usr/bin");
    }

    #[test]
    fn empty_project_path_is_unset() {
        let env = BuildEnvironment::from_vars([("BP_NODE_PROJECT_PATH", "")]);
        assert_eq!(env.project_path, None);
    }

    #[test]
    fn disable_sbom_defaults_false() {
        assert!(!BuildEnvironment::from_vars([("BP_DISABLE_SBOM", "nope")]).disable_sbom);
        assert!(!BuildEnvironment::default().disable_sbom);
    }

    #[cfg(unix)]
    #[test]
    fn path_with_appends() {
        let env = BuildEnvironment::from_vars([("PATH", "/usr/bin:/bin")]);
        assert_eq!(
            env.path_with(Path::new("node_modules/.bin")),
            "/usr/bin:/bin:node_modules/.bin"
        );
        assert_eq!(
            BuildEnvironment::default().path_with(Path::new("node_modules/.bin")),
            "node_modules/.bin"
        );
    }

    #[test]
    fn resolve_project_dir_defaults_to_app_dir() {
        let temp = TempDir::new().unwrap();
        let dir = BuildEnvironment::default()
            .resolve_project_dir(temp.path())
            .unwrap();
        assert_eq!(dir, temp.path());
    }

    #[test]
    fn resolve_project_dir_subdirectory() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("frontend")).unwrap();
        let env = BuildEnvironment::from_vars([("BP_NODE_PROJECT_PATH", "frontend")]);

        let dir = env.resolve_project_dir(temp.path()).unwrap();
        assert_eq!(dir, temp.path().join("frontend"));
    }

    #[test]
    fn resolve_project_dir_missing() {
        let temp = TempDir::new().unwrap();
        let env = BuildEnvironment::from_vars([("BP_NODE_PROJECT_PATH", "nope")]);

        let err = env.resolve_project_dir(temp.path()).unwrap_err();
        match err {
            YarnInstallError::ProjectPathNotFound(path) => {
                assert_eq!(path, temp.path().join("nope"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
