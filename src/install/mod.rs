//! Dependency installation into layers
//!
//! Three steps per layer, each usable on its own:
//!
//! - [`decision`]: should `yarn install` run at all?
//! - [`relocate`]: wire `<work>/node_modules` to the layer that receives the install
//! - [`executor`]: run `yarn install` into that layer

pub mod decision;
pub mod executor;
pub mod relocate;

pub use decision::{content_hash, ChangeDetector, InstallDecision, LOCKFILE};
pub use executor::{install_args, parse_offline_mirror, InstallExecutor};
pub use relocate::{link_existing, ExistingModules, ModuleLocation, Relocation, RelocationStep};

use crate::layer::{EnvScope, LayerTypes, BUILD_MODULES_LAYER, LAUNCH_MODULES_LAYER};
use std::fmt;

/// Which lifecycle phase a layer is installed for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallMode {
    /// Build-time modules, dev dependencies included
    Build,
    /// Run-time modules, production dependencies only
    Launch,
}

impl InstallMode {
    pub fn includes_dev_dependencies(&self) -> bool {
        matches!(self, Self::Build)
    }

    /// Where the layer's `.bin` directory is exported
    pub fn env_scope(&self) -> EnvScope {
        match self {
            Self::Build => EnvScope::Build,
            Self::Launch => EnvScope::Launch,
        }
    }

    pub fn layer_name(&self) -> &'static str {
        match self {
            Self::Build => BUILD_MODULES_LAYER,
            Self::Launch => LAUNCH_MODULES_LAYER,
        }
    }

    pub fn layer_types(&self) -> LayerTypes {
        LayerTypes {
            build: matches!(self, Self::Build),
            launch: matches!(self, Self::Launch),
            cache: true,
        }
    }
}

impl fmt::Display for InstallMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Build => "build",
            Self::Launch => "launch",
        };
        write!(f, "{}", name)
    }
}
