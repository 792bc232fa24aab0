//! yarn-install - Yarn dependency buildpack
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use yarn_install::cli::{Cli, Commands};
use yarn_install::config::BuildEnvironment;
use yarn_install::error::YarnInstallResult;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> YarnInstallResult<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging: 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("yarn_install=warn"),
        1 => EnvFilter::new("yarn_install=info"),
        _ => EnvFilter::new("yarn_install=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let env = BuildEnvironment::from_process();
    debug!("Build environment: {:?}", env);

    match cli.command {
        Commands::Detect(args) => yarn_install::cli::commands::detect(args, &env).await,
        Commands::Build(args) => {
            yarn_install::cli::commands::build(args, &env).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
