//! Detect command - decide whether this buildpack applies

use crate::cli::args::DetectArgs;
use crate::config::BuildEnvironment;
use crate::error::YarnInstallResult;
use crate::project::{self, Detection};
use console::style;
use std::process::ExitCode;
use tracing::info;

/// Exit status signalling that detection did not pass
pub const DETECT_FAIL_CODE: u8 = 100;

/// Execute the detect command
pub async fn execute(args: DetectArgs, env: &BuildEnvironment) -> YarnInstallResult<ExitCode> {
    let app_dir = super::app_dir_or_cwd(args.app_dir)?;
    let project_dir = env.resolve_project_dir(&app_dir)?;

    match project::detect(&project_dir).await? {
        Detection::Pass(plan) => {
            info!("Detected Yarn project in {}", project_dir.display());
            print!("{}", plan.to_toml()?);
            Ok(ExitCode::SUCCESS)
        }
        Detection::Fail { reason } => {
            println!("{} {}", style("!").yellow(), reason);
            Ok(ExitCode::from(DETECT_FAIL_CODE))
        }
    }
}
