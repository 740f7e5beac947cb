use clap::Parser;
use gh_token_checker::cli::Cli;
use gh_token_checker::{app, logger};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Resolve config first to get log level and log file
    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Keep the guard alive to ensure log messages are flushed
    let _guard = match logger::setup_logging(&config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match app::run(&config).await {
        Ok(report) => {
            tracing::debug!("Run finished: {:?}", report.summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
