//! yarn-install - Yarn dependency buildpack
//!
//! Detects Yarn projects and installs their dependencies into build and
//! launch layers, skipping the install when the lockfile, resolved yarn
//! configuration and `NODE_ENV` are unchanged since the last build.

pub mod build;
pub mod cli;
pub mod config;
pub mod error;
pub mod install;
pub mod layer;
pub mod process;
pub mod project;

pub use error::{YarnInstallError, YarnInstallResult};
