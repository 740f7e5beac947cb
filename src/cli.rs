use crate::config::{OutputFormat, RunConfig, load_config, parse_delay, parse_scope_list};
use crate::errors::ConfigError;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// GitHub Token Checker - concurrently validate GitHub Personal Access Tokens
#[derive(Parser, Debug)]
#[command(name = "gh-token-checker", version)]
#[command(about = "Concurrent GitHub token checker with retry and rate-limit handling", long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// File with one token per line [default: tokens.txt]
    #[arg(long, value_name = "FILE")]
    pub tokens_file: Option<PathBuf>,

    /// GitHub API URL to check tokens against [default: https://api.github.com/user]
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Delay (s) between requests per worker [default: 1.0]
    #[arg(long, value_name = "SECONDS")]
    pub delay: Option<f64>,

    /// Number of concurrent workers [default: 2]
    #[arg(short, long, value_name = "N")]
    pub workers: Option<usize>,

    /// Retry count for transient HTTP errors [default: 2]
    #[arg(long, value_name = "N")]
    pub retries: Option<u32>,

    /// Request timeout in seconds [default: 10]
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Total seconds a token may wait on rate limits [default: 3600]
    #[arg(long, value_name = "SECONDS")]
    pub max_rate_limit_wait: Option<u64>,

    /// Comma-separated required scopes (e.g. "repo,read:org")
    #[arg(long, value_name = "SCOPES")]
    pub min_scopes: Option<String>,

    /// Mask tokens in output
    #[arg(long, overrides_with = "full_token")]
    pub mask: bool,

    /// Display full tokens in output
    #[arg(long, overrides_with = "mask")]
    pub full_token: bool,

    /// Output format
    #[arg(long, value_enum, value_name = "FORMAT")]
    pub output_format: Option<OutputFormat>,

    /// Path to write the report to instead of stdout
    #[arg(long, value_name = "FILE")]
    pub output_file: Option<PathBuf>,

    /// File path to write valid tokens (one per line)
    #[arg(long, value_name = "FILE")]
    pub valid_output_file: Option<PathBuf>,

    /// Log file path for detailed logs
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Loads the config file and applies command line overrides on top.
    pub fn resolve(self) -> Result<RunConfig, ConfigError> {
        let file_config = load_config(self.config.as_deref())?;
        let config = self.apply(RunConfig::from_file_config(file_config)?)?;
        config.validate()?;
        Ok(config)
    }

    fn apply(self, mut config: RunConfig) -> Result<RunConfig, ConfigError> {
        if let Some(path) = self.tokens_file {
            config.tokens_file = path;
        }
        if let Some(url) = self.api_url {
            config.api_url = url;
        }
        if let Some(delay) = self.delay {
            config.delay = parse_delay(delay)?;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(retries) = self.retries {
            config.retry.retries = retries;
        }
        if let Some(timeout) = self.timeout {
            config.timeout = Duration::from_secs(timeout);
        }
        if let Some(wait) = self.max_rate_limit_wait {
            config.retry.max_rate_limit_wait = Duration::from_secs(wait);
        }
        if let Some(scopes) = self.min_scopes {
            config.min_scopes = parse_scope_list(&scopes);
        }
        if self.mask {
            config.mask = true;
        } else if self.full_token {
            config.mask = false;
        }
        if let Some(format) = self.output_format {
            config.output_format = format;
        }
        if self.output_file.is_some() {
            config.output_file = self.output_file;
        }
        if self.valid_output_file.is_some() {
            config.valid_output_file = self.valid_output_file;
        }
        if self.log_file.is_some() {
            config.log_file = self.log_file;
        }
        config.verbose = self.verbose;
        Ok(config)
    }
}
