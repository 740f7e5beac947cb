use crate::errors::{AppError, CheckError, ConfigError};
use crate::github::types::{
    GitHubUser, RateLimitHeaders, parse_retry_after, parse_scopes,
};
use crate::token::Token;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderValue};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

/// Longest slice of a response body carried into error details.
const BODY_SNIPPET_CHARS: usize = 80;

/// GitHub APIクライアント
///
/// Single-attempt primitive: one GET against the user endpoint per call.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: Client,
    api_url: Url,
}

/// What one request against the user endpoint returned.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub scopes: Vec<String>,
    pub rate_limit: Option<RateLimitHeaders>,
    pub retry_after: Option<Duration>,
    pub body: String,
}

impl GitHubClient {
    /// 新しいGitHubクライアントを作成
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let api_url = parse_api_url(api_url)?;
        let client = Client::builder()
            .user_agent(format!("gh-token-checker/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::ClientInit { source: e })?;

        Ok(GitHubClient { client, api_url })
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    /// Sends `GET <api_url>` authenticated with `token`.
    pub async fn fetch_user(&self, token: &Token) -> Result<ApiResponse, CheckError> {
        let mut authorization = HeaderValue::from_str(&format!("token {}", token.expose()))
            .map_err(|e| CheckError::InvalidToken {
                reason: e.to_string(),
            })?;
        authorization.set_sensitive(true);

        let response = self
            .client
            .get(self.api_url.clone())
            .header(AUTHORIZATION, authorization)
            .header(ACCEPT, "application/vnd.github.v3+json")
            .send()
            .await?;

        let status = response.status();
        let headers = response.headers();
        let scopes = parse_scopes(headers);
        let rate_limit = RateLimitHeaders::from_headers(headers);
        let retry_after = parse_retry_after(headers);
        let body = response.text().await?;

        tracing::debug!(
            "GET {} -> {} (rate limit remaining: {:?})",
            self.api_url,
            status,
            rate_limit.and_then(|r| r.remaining)
        );

        Ok(ApiResponse {
            status,
            scopes,
            rate_limit,
            retry_after,
            body,
        })
    }
}

impl ApiResponse {
    /// Maps the response onto the error taxonomy. `now_epoch` is used to turn
    /// `X-RateLimit-Reset` into a wait.
    pub fn classify(&self, now_epoch: i64) -> Result<Option<GitHubUser>, CheckError> {
        let status = self.status;

        if status.is_success() {
            // Custom API URLs may not answer with a user object; validity
            // only depends on the status.
            return Ok(serde_json::from_str::<GitHubUser>(&self.body).ok());
        }

        if status == StatusCode::UNAUTHORIZED {
            return Err(CheckError::Unauthorized);
        }

        if status == StatusCode::TOO_MANY_REQUESTS
            || (status == StatusCode::FORBIDDEN && self.is_rate_limited())
        {
            return Err(CheckError::RateLimited {
                status: status.as_u16(),
                wait: self.rate_limit_wait(now_epoch),
            });
        }

        if status == StatusCode::FORBIDDEN {
            return Err(CheckError::Forbidden {
                message: self.body_snippet(),
            });
        }

        Err(CheckError::UnexpectedStatus {
            status: status.as_u16(),
            message: self.body_snippet(),
        })
    }

    fn is_rate_limited(&self) -> bool {
        self.rate_limit.is_some_and(|r| r.is_exhausted())
            || self.retry_after.is_some()
            || self.body.to_ascii_lowercase().contains("rate limit")
    }

    /// `Retry-After` wins over the reset timestamp. `None` means the caller
    /// falls back to its own backoff.
    fn rate_limit_wait(&self, now_epoch: i64) -> Option<Duration> {
        self.retry_after
            .or_else(|| self.rate_limit.and_then(|r| r.wait_until_reset(now_epoch)))
    }

    fn body_snippet(&self) -> String {
        self.body.trim().chars().take(BODY_SNIPPET_CHARS).collect()
    }
}

fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidApiUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidApiUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{}'", other),
        }),
    }
}
