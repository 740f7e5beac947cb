//! GitHub user endpoint access.

pub mod client;
pub mod types;

pub use client::{ApiResponse, GitHubClient};
pub use types::{GitHubUser, RateLimitHeaders};
