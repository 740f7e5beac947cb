use crate::aggregator::Summary;
use crate::config::RunConfig;
use crate::errors::AppError;
use crate::github::GitHubClient;
use crate::models::ValidationResult;
use crate::output;
use crate::pool::run_pool;
use crate::token::load_tokens;
use std::sync::Arc;

/// Everything one run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub results: Vec<ValidationResult>,
    pub summary: Summary,
}

/// Loads tokens, checks them and writes every requested output.
///
/// Setup failures (missing or empty token file, bad API URL) are returned
/// before any request is made.
pub async fn run(config: &RunConfig) -> Result<RunReport, AppError> {
    let tokens = load_tokens(&config.tokens_file)?;
    let client = Arc::new(GitHubClient::new(&config.api_url, config.timeout)?);

    tracing::info!(
        "Checking {} tokens with {} workers against {}",
        tokens.len(),
        config.workers,
        client.api_url()
    );

    let results = run_pool(client, &tokens, config).await;
    let summary = Summary::from_results(&results);

    if let Some(path) = &config.valid_output_file {
        output::write_valid_tokens(path, &tokens, &results)?;
    }
    output::emit(&results, config.output_format, config.output_file.as_deref())?;

    tracing::info!(
        "Total: {}, Valid: {}, Invalid: {}, Errors: {}",
        summary.total,
        summary.valid,
        summary.invalid,
        summary.errors
    );

    Ok(RunReport { results, summary })
}
