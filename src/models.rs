use crate::retry::CheckOutcome;
use serde::{Deserialize, Serialize};

/// Terminal state of a token check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStatus {
    Valid,
    Invalid,
    Error,
}

impl TokenStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenStatus::Valid => "valid",
            TokenStatus::Invalid => "invalid",
            TokenStatus::Error => "error",
        }
    }
}

/// One record per input token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Position of the token in the input file (0-based)
    pub index: usize,
    /// Masked or full token, depending on `--mask`
    pub token: String,
    pub valid: bool,
    pub status: TokenStatus,
    /// Granted scopes in the order the API listed them
    #[serde(default)]
    pub scopes: Vec<String>,
    pub http_status: Option<u16>,
    pub rate_limit_remaining: Option<u32>,
    pub rate_limit_reset: Option<u64>,
    pub login: Option<String>,
    pub user_id: Option<u64>,
    /// Valid and holding every `--min-scopes` entry
    #[serde(default)]
    pub meets_required_scopes: bool,
    /// Requests sent for this token
    pub attempts: u32,
    pub error: Option<String>,
}

impl ValidationResult {
    pub fn from_outcome(index: usize, token: String, outcome: CheckOutcome) -> Self {
        let CheckOutcome {
            status,
            scopes,
            http_status,
            rate_limit,
            user,
            attempts,
            detail,
        } = outcome;

        ValidationResult {
            index,
            token,
            valid: status == TokenStatus::Valid,
            status,
            scopes,
            http_status,
            rate_limit_remaining: rate_limit.and_then(|r| r.remaining),
            rate_limit_reset: rate_limit.and_then(|r| r.reset),
            login: user.as_ref().map(|u| u.login.clone()),
            user_id: user.as_ref().map(|u| u.id),
            meets_required_scopes: false,
            attempts,
            error: detail,
        }
    }

    /// Placeholder for a token whose worker never reported back.
    pub fn missing(index: usize, token: String) -> Self {
        ValidationResult {
            index,
            token,
            valid: false,
            status: TokenStatus::Error,
            scopes: Vec::new(),
            http_status: None,
            rate_limit_remaining: None,
            rate_limit_reset: None,
            login: None,
            user_id: None,
            meets_required_scopes: false,
            attempts: 0,
            error: Some("Worker aborted before checking this token".to_string()),
        }
    }
}
