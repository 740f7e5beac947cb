use crate::errors::CheckError;
use crate::github::{GitHubClient, GitHubUser, RateLimitHeaders};
use crate::models::TokenStatus;
use crate::token::Token;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Retry and rate-limit budget for a single token.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Extra attempts after the first for transport errors and unexpected statuses
    pub retries: u32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
    /// Rate-limit pauses allowed per token; they do not consume `retries`
    pub max_rate_limit_waits: u32,
    /// Total time a token may spend sleeping on rate limits
    pub max_rate_limit_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 2,
            base_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            max_rate_limit_waits: 5,
            max_rate_limit_wait: Duration::from_secs(3600),
        }
    }
}

impl RetryPolicy {
    /// `base * 2^(n-1)`, capped at `max_backoff`. `n` starts at 1.
    pub fn backoff(&self, n: u32) -> Duration {
        let factor = 2u32.saturating_pow(n.saturating_sub(1));
        self.base_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }
}

/// Terminal result of checking one token.
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    pub status: TokenStatus,
    pub scopes: Vec<String>,
    /// Status of the last response, if any arrived
    pub http_status: Option<u16>,
    pub rate_limit: Option<RateLimitHeaders>,
    pub user: Option<GitHubUser>,
    pub attempts: u32,
    pub detail: Option<String>,
}

enum State {
    Requesting,
    Waiting(Duration),
    Finished(CheckOutcome),
}

/// Runs one token through `Requesting ⇄ Waiting → Finished`.
pub async fn check_token(client: &GitHubClient, token: &Token, policy: &RetryPolicy) -> CheckOutcome {
    let label = token.masked();
    let mut attempts = 0u32;
    let mut failures = 0u32;
    let mut rate_limit_waits = 0u32;
    let mut rate_limit_slept = Duration::ZERO;
    let mut http_status = None;
    let mut rate_limit = None;
    let mut scopes = Vec::new();

    let mut state = State::Requesting;
    loop {
        state = match state {
            State::Finished(outcome) => return outcome,
            State::Waiting(wait) => {
                sleep(wait).await;
                State::Requesting
            }
            State::Requesting => {
                attempts += 1;
                let now = chrono::Utc::now().timestamp();
                let result = client.fetch_user(token).await.and_then(|response| {
                    http_status = Some(response.status.as_u16());
                    if response.rate_limit.is_some() {
                        rate_limit = response.rate_limit;
                    }
                    scopes = response.scopes.clone();
                    response.classify(now)
                });

                let finish = |status: TokenStatus, user, detail| {
                    State::Finished(CheckOutcome {
                        status,
                        scopes: scopes.clone(),
                        http_status,
                        rate_limit,
                        user,
                        attempts,
                        detail,
                    })
                };

                match result {
                    Ok(user) => {
                        debug!("{} is valid (attempt {})", label, attempts);
                        finish(TokenStatus::Valid, user, None)
                    }
                    Err(e) if e.is_terminal_invalid() => {
                        debug!("{} is invalid: {}", label, e);
                        finish(TokenStatus::Invalid, None, Some(e.to_string()))
                    }
                    Err(CheckError::RateLimited { status, wait }) => {
                        rate_limit_waits += 1;
                        let wait = wait.unwrap_or_else(|| policy.backoff(rate_limit_waits));
                        if rate_limit_waits > policy.max_rate_limit_waits
                            || rate_limit_slept + wait > policy.max_rate_limit_wait
                        {
                            warn!(
                                "{}: rate limited (HTTP {}), wait budget exhausted after {:?}",
                                label, status, rate_limit_slept
                            );
                            finish(
                                TokenStatus::Error,
                                None,
                                Some(format!(
                                    "Rate limit wait budget exhausted (HTTP {}, needed {}s more)",
                                    status,
                                    wait.as_secs()
                                )),
                            )
                        } else {
                            rate_limit_slept += wait;
                            warn!(
                                "{}: rate limit reached (HTTP {}). Sleeping {:?}...",
                                label, status, wait
                            );
                            State::Waiting(wait)
                        }
                    }
                    Err(e) if failures < policy.retries => {
                        failures += 1;
                        let wait = policy.backoff(failures);
                        warn!(
                            "{}: attempt {}/{} failed: {}. Retrying in {:?}",
                            label,
                            failures,
                            policy.retries + 1,
                            e,
                            wait
                        );
                        State::Waiting(wait)
                    }
                    Err(e) => {
                        warn!("{}: giving up after {} attempts: {}", label, attempts, e);
                        finish(TokenStatus::Error, None, Some(e.to_string()))
                    }
                }
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            base_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(3),
            ..RetryPolicy::default()
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(500));
        assert_eq!(policy.backoff(2), Duration::from_millis(1000));
        assert_eq!(policy.backoff(3), Duration::from_millis(2000));
        assert_eq!(policy.backoff(4), Duration::from_secs(3));
        assert_eq!(policy.backoff(60), Duration::from_secs(3));
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.retries, 2);
        assert_eq!(policy.max_rate_limit_waits, 5);
        // Long enough to sit out one primary quota window.
        assert_eq!(policy.max_rate_limit_wait, Duration::from_secs(3600));
    }
}
