use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const OAUTH_SCOPES_HEADER: &str = "x-oauth-scopes";
pub const RATE_LIMIT_LIMIT_HEADER: &str = "x-ratelimit-limit";
pub const RATE_LIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining";
pub const RATE_LIMIT_RESET_HEADER: &str = "x-ratelimit-reset";

/// GitHub Rate Limit Response Headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitHeaders {
    /// Rate Limit
    pub limit: Option<u32>,
    /// Remaining requests
    pub remaining: Option<u32>,
    /// Reset time (unix seconds)
    pub reset: Option<u64>,
}

impl RateLimitHeaders {
    /// Returns `None` when the response carries none of the rate limit headers.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let rate = RateLimitHeaders {
            limit: header_number(headers, RATE_LIMIT_LIMIT_HEADER),
            remaining: header_number(headers, RATE_LIMIT_REMAINING_HEADER),
            reset: header_number(headers, RATE_LIMIT_RESET_HEADER),
        };
        if rate.limit.is_none() && rate.remaining.is_none() && rate.reset.is_none() {
            return None;
        }
        Some(rate)
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == Some(0)
    }

    /// Time left until `reset`, plus one second of slack so the next request
    /// lands after the window has rolled over.
    pub fn wait_until_reset(&self, now_epoch: i64) -> Option<Duration> {
        let reset = i64::try_from(self.reset?).ok()?;
        let secs = reset.saturating_sub(now_epoch).max(0) as u64;
        Some(Duration::from_secs(secs + 1))
    }
}

/// The subset of the `/user` response we report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubUser {
    pub login: String,
    pub id: u64,
}

/// Splits `X-OAuth-Scopes` (`"repo, read:org"`) preserving API order.
pub fn parse_scopes(headers: &HeaderMap) -> Vec<String> {
    headers
        .get(OAUTH_SCOPES_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// `Retry-After` in delta-seconds form. HTTP-date values are ignored.
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn header_number<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<T>().ok())
}
