//! Command-line entry point for ensemble record storage.
//!
//! Creates and deletes experiments, stores ensemble records from JSON files
//! or by sampling a distribution, and reads them back.
//!
//! # Architecture
//!
//! ```text
//! args --> Cli (clap) --> execute --> ExperimentDirectory / RecordStore --> HttpSession
//! ```
//!
//! One [`HttpSession`](ensemble_storage::HttpSession) is created per
//! process; its connection is resolved on the first request.

mod cli;
mod commands;

use ensemble_storage::{HttpSession, StorageConfig, Workspace};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

/// Application entry point.
///
/// Initializes logging, parses arguments, loads configuration from
/// environment variables, and runs a single command.
///
/// # Errors
///
/// Returns an error if the arguments, configuration, or command fail.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so command output on stdout stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::try_parse_args(std::env::args_os()).unwrap_or_else(|e| e.exit());

    let config = StorageConfig::from_env()?;
    info!(
        workspace = %config.workspace.display(),
        request_timeout_ms = config.request_timeout.as_millis(),
        "configuration loaded"
    );

    let session = HttpSession::from_config(&config)?;
    let workspace = Workspace::new(config.workspace);

    let output = commands::execute(cli, &session, &workspace).await?;
    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}
