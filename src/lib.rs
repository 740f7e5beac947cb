pub mod aggregator;
pub mod app;
pub mod cli;
pub mod config;
pub mod errors;
pub mod github;
pub mod logger;
pub mod models;
pub mod output;
pub mod pool;
pub mod retry;
pub mod token;

pub use aggregator::{ResultAggregator, Summary};
pub use config::{OutputFormat, RunConfig};
pub use errors::{AppError, CheckError, ConfigError, InputError, OutputError};
pub use github::GitHubClient;
pub use models::{TokenStatus, ValidationResult};
pub use retry::{CheckOutcome, RetryPolicy, check_token};
pub use token::Token;
