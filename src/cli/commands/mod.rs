//! CLI command implementations

pub mod build;
pub mod detect;

pub use build::execute as build;
pub use detect::execute as detect;

use crate::error::{YarnInstallError, YarnInstallResult};
use std::path::PathBuf;

/// Explicit app dir, or the current directory
fn app_dir_or_cwd(app_dir: Option<PathBuf>) -> YarnInstallResult<PathBuf> {
    match app_dir {
        Some(dir) => Ok(dir),
        None => std::env::current_dir()
            .map_err(|e| YarnInstallError::io("getting current directory", e)),
    }
}
