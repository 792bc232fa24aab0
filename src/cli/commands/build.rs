//! Build command - install dependencies into layers

use crate::build::{run_build, BuildRequest};
use crate::cli::args::BuildArgs;
use crate::config::BuildEnvironment;
use crate::error::{YarnInstallError, YarnInstallResult};
use crate::process::Yarn;
use console::style;
use tracing::debug;

/// Execute the build command
pub async fn execute(args: BuildArgs, env: &BuildEnvironment) -> YarnInstallResult<()> {
    let (build, launch) = args.phases();
    let app_dir = super::app_dir_or_cwd(args.app_dir)?;

    // Not removed afterwards: the launch-phase node_modules link in the
    // app directory resolves through it.
    let temp_dir = match args.temp_dir {
        Some(dir) => dir,
        None => std::env::temp_dir().join(format!("yarn-install-{}", std::process::id())),
    };
    tokio::fs::create_dir_all(&temp_dir).await.map_err(|e| {
        YarnInstallError::io(format!("creating temp directory {}", temp_dir.display()), e)
    })?;

    let yarn = args.yarn.map(Yarn::with_binary).unwrap_or_default();
    debug!("Using yarn at {}", yarn.binary().display());

    let request = BuildRequest {
        app_dir,
        layers_dir: args.layers_dir,
        temp_dir,
        build,
        launch,
    };

    let report = run_build(&request, env, &yarn).await?;

    for outcome in &report.layers {
        let verb = if outcome.installed {
            "Installed"
        } else {
            "Reused"
        };
        println!(
            "{} {} {} modules in {}",
            style("✓").green(),
            verb,
            outcome.mode,
            style(outcome.layer_path.display()).cyan()
        );
    }

    Ok(())
}
