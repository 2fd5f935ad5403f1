//! automerge CLI entry point

mod cli;

use anstream::eprintln;
use clap::Parser;
use cli::RunOptions;
use cli::style::Stylize;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Automatically merge approved pull requests once their checks pass
///
/// Inputs are read from `INPUT_*` environment variables as set by GitHub
/// Actions (e.g. `INPUT_TOKEN`, `INPUT_MERGE-METHOD`).
#[derive(Parser, Debug)]
#[command(name = "automerge", version, long_about = None)]
struct Cli {
    /// Pull request number to process instead of the triggering event's
    #[arg(short, long)]
    pull_request: Option<String>,

    /// Log what would be merged without merging
    #[arg(long)]
    dry_run: bool,

    /// Repository as owner/repo (defaults to GITHUB_REPOSITORY)
    #[arg(long)]
    repository: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let options = RunOptions {
        pull_request: cli.pull_request,
        dry_run: cli.dry_run,
        repository: cli.repository,
    };

    match cli::run_automerge(options).await {
        Ok(report) if report.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{} {e:#}", "error:".error());
            ExitCode::FAILURE
        }
    }
}
