use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// アプリケーション全体のエラー型
#[derive(Error, Debug)]
pub enum AppError {
    /// 入力ファイル関連エラー
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    /// 設定関連エラー
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// 出力関連エラー
    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    /// HTTPクライアント初期化エラー
    #[error("Failed to create HTTP client: {source}")]
    ClientInit {
        #[source]
        source: reqwest::Error,
    },

    /// ログ初期化エラー
    #[error("Failed to initialize logging: {reason}")]
    Logging { reason: String },
}

/// Failure of a single request against the user endpoint.
///
/// Each variant maps to one retry decision in [`crate::retry`].
#[derive(Error, Debug)]
pub enum CheckError {
    /// Network or timeout failure, retried.
    #[error("Request failed: {source}")]
    Transport {
        #[source]
        source: reqwest::Error,
    },

    /// 403/429 rate limit signal. `wait` is the server-advised pause, if any.
    #[error("GitHub API rate limit exceeded (HTTP {status})")]
    RateLimited { status: u16, wait: Option<Duration> },

    /// 401, the credential is rejected.
    #[error("Unauthorized / invalid token")]
    Unauthorized,

    /// 403 without any rate limit signal.
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    /// The token cannot be sent at all (e.g. not a valid header value).
    #[error("Malformed token: {reason}")]
    InvalidToken { reason: String },

    /// Any other status; retried until the retry budget is spent.
    #[error("HTTP {status}: {message}")]
    UnexpectedStatus { status: u16, message: String },
}

impl CheckError {
    /// True when the token is definitively rejected and retrying is pointless.
    pub fn is_terminal_invalid(&self) -> bool {
        matches!(
            self,
            CheckError::Unauthorized
                | CheckError::Forbidden { .. }
                | CheckError::InvalidToken { .. }
        )
    }
}

/// トークンファイル関連エラー
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Tokens file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read tokens file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is empty", .path.display())]
    Empty { path: PathBuf },
}

/// 設定関連エラー
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 設定ファイル読み込みエラー
    #[error("Failed to load config file {}: {source}", .path.display())]
    LoadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 設定ファイルパースエラー
    #[error("Failed to parse config file: {source}")]
    ParseError {
        #[source]
        source: toml::de::Error,
    },

    /// API URL が不正
    #[error("Invalid API URL '{url}': {reason}")]
    InvalidApiUrl { url: String, reason: String },

    /// 設定バリデーションエラー
    #[error("Configuration validation failed: {reason}")]
    ValidationError { reason: String },
}

/// 出力関連エラー
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write to stdout: {source}")]
    Stdout {
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization failed: {source}")]
    Json {
        #[source]
        source: serde_json::Error,
    },
}

impl From<reqwest::Error> for CheckError {
    fn from(error: reqwest::Error) -> Self {
        CheckError::Transport { source: error }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(error: toml::de::Error) -> Self {
        ConfigError::ParseError { source: error }
    }
}

impl From<serde_json::Error> for OutputError {
    fn from(error: serde_json::Error) -> Self {
        OutputError::Json { source: error }
    }
}
