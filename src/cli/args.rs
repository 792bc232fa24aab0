//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// yarn-install - install Yarn dependencies into cacheable layers
#[derive(Parser, Debug)]
#[command(name = "yarn-install")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check whether the application is a Yarn project
    Detect(DetectArgs),

    /// Install dependencies into build and/or launch layers
    Build(BuildArgs),
}

/// Arguments for the detect command
#[derive(Parser, Debug)]
pub struct DetectArgs {
    /// Application root (defaults to current directory)
    #[arg(short, long, env = "CNB_APP_DIR")]
    pub app_dir: Option<PathBuf>,
}

/// Arguments for the build command
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Application root (defaults to current directory)
    #[arg(short, long, env = "CNB_APP_DIR")]
    pub app_dir: Option<PathBuf>,

    /// Directory under which layers are written
    #[arg(short, long, env = "CNB_LAYERS_DIR")]
    pub layers_dir: PathBuf,

    /// Scratch directory for the node_modules indirection link
    #[arg(long)]
    pub temp_dir: Option<PathBuf>,

    /// Install build-time modules (dev dependencies included)
    #[arg(long)]
    pub build: bool,

    /// Install run-time modules (production dependencies only)
    #[arg(long)]
    pub launch: bool,

    /// Yarn executable (resolved from PATH by default)
    #[arg(long, env = "YARN_INSTALL_YARN")]
    pub yarn: Option<PathBuf>,
}

impl BuildArgs {
    /// Requested phases as (build, launch); neither flag means both
    pub fn phases(&self) -> (bool, bool) {
        if !self.build && !self.launch {
            (true, true)
        } else {
            (self.build, self.launch)
        }
    }
}
