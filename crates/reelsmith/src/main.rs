//! Reelsmith CLI binary.
//!
//! - Plan segments from a script
//! - Run, resume and reopen article-to-video runs
//! - Inspect stored runs and render caption files

use clap::Parser;
use reelsmith::observability::{ObservabilityConfig, init_observability};
use std::process::ExitCode;

mod cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    let _ = dotenvy::dotenv();

    let logging = ObservabilityConfig::for_verbosity(cli.verbose).with_json_logs(cli.json_logs);
    if let Err(e) = init_observability(&logging) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    match cli::dispatch(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(reason = e.reason_code(), error = %e, "Command failed");
            ExitCode::FAILURE
        }
    }
}
