use crate::errors::ConfigError;
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.github.com/user";
pub const DEFAULT_TOKENS_FILE: &str = "tokens.txt";

/// 出力形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

/// GitHub API設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// 確認に使うエンドポイント（デフォルト: https://api.github.com/user）
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// リクエストのタイムアウト（秒）
    #[serde(default = "default_timeout_sec")]
    pub timeout_sec: u64,

    /// 失敗時の再試行回数
    #[serde(default = "default_retries")]
    pub retries: u32,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout_sec() -> u64 {
    10
}

fn default_retries() -> u32 {
    2
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_sec: default_timeout_sec(),
            retries: default_retries(),
        }
    }
}

/// チェック設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckConfig {
    /// 並列ワーカー数
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// ワーカーごとのリクエスト間隔（秒）
    #[serde(default = "default_delay_sec")]
    pub delay_sec: f64,

    /// 必須スコープ
    #[serde(default)]
    pub min_scopes: Vec<String>,

    /// 出力時にトークンをマスクするかどうか
    #[serde(default)]
    pub mask: bool,
}

fn default_workers() -> usize {
    2
}

fn default_delay_sec() -> f64 {
    1.0
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            delay_sec: default_delay_sec(),
            min_scopes: Vec::new(),
            mask: false,
        }
    }
}

/// レートリミット待機の設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_max_waits")]
    pub max_waits: u32,

    /// トークンごとの最大待機時間の合計（秒）
    #[serde(default = "default_max_total_wait_sec")]
    pub max_total_wait_sec: u64,

    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_max_waits() -> u32 {
    5
}

fn default_max_total_wait_sec() -> u64 {
    3600
}

fn default_base_backoff_ms() -> u64 {
    500
}

fn default_max_backoff_ms() -> u64 {
    30_000
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_waits: default_max_waits(),
            max_total_wait_sec: default_max_total_wait_sec(),
            base_backoff_ms: default_base_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// ログ設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// ログレベル（省略可、デフォルト: info）
    #[serde(default = "default_log_level")]
    pub level: String,

    /// ログファイルのパス
    #[serde(default)]
    pub file_path: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_path: None,
        }
    }
}

/// 設定ファイル（TOML）の内容
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub check: CheckConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Fully resolved options for one run. Built once, read-only afterwards.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub tokens_file: PathBuf,
    pub api_url: String,
    pub timeout: Duration,
    pub workers: usize,
    pub delay: Duration,
    pub retry: RetryPolicy,
    pub min_scopes: Vec<String>,
    pub mask: bool,
    pub output_format: OutputFormat,
    pub output_file: Option<PathBuf>,
    pub valid_output_file: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub log_level: String,
    pub verbose: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            tokens_file: PathBuf::from(DEFAULT_TOKENS_FILE),
            api_url: default_api_url(),
            timeout: Duration::from_secs(default_timeout_sec()),
            workers: default_workers(),
            delay: Duration::from_secs(1),
            retry: RetryPolicy::default(),
            min_scopes: Vec::new(),
            mask: false,
            output_format: OutputFormat::default(),
            output_file: None,
            valid_output_file: None,
            log_file: None,
            log_level: default_log_level(),
            verbose: false,
        }
    }
}

impl RunConfig {
    /// Values from the config file (or its defaults) before CLI overrides.
    pub fn from_file_config(file: FileConfig) -> Result<Self, ConfigError> {
        let FileConfig {
            github,
            check,
            rate_limit,
            logging,
        } = file;

        Ok(RunConfig {
            tokens_file: PathBuf::from(DEFAULT_TOKENS_FILE),
            api_url: github.api_url,
            timeout: Duration::from_secs(github.timeout_sec),
            workers: check.workers,
            delay: parse_delay(check.delay_sec)?,
            retry: RetryPolicy {
                retries: github.retries,
                base_backoff: Duration::from_millis(rate_limit.base_backoff_ms),
                max_backoff: Duration::from_millis(rate_limit.max_backoff_ms),
                max_rate_limit_waits: rate_limit.max_waits,
                max_rate_limit_wait: Duration::from_secs(rate_limit.max_total_wait_sec),
            },
            min_scopes: normalize_scopes(check.min_scopes),
            mask: check.mask,
            output_format: OutputFormat::default(),
            output_file: None,
            valid_output_file: None,
            log_file: logging.file_path,
            log_level: logging.level,
            verbose: false,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::ValidationError {
                reason: "workers must be at least 1".to_string(),
            });
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::ValidationError {
                reason: "timeout must be greater than zero".to_string(),
            });
        }
        if self.retry.base_backoff > self.retry.max_backoff {
            return Err(ConfigError::ValidationError {
                reason: "base backoff must not exceed max backoff".to_string(),
            });
        }
        Ok(())
    }

    /// `debug` with `--verbose`, otherwise the configured level.
    pub fn effective_log_level(&self) -> &str {
        if self.verbose { "debug" } else { self.log_level.as_str() }
    }
}

/// Parses a delay given in (fractional) seconds.
pub fn parse_delay(secs: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::ValidationError {
        reason: format!("invalid delay '{}': expected non-negative seconds", secs),
    })
}

/// Splits `"repo, read:org"` into trimmed, de-duplicated entries.
pub fn parse_scope_list(raw: &str) -> Vec<String> {
    normalize_scopes(raw.split(',').map(str::to_string).collect())
}

fn normalize_scopes(scopes: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(scopes.len());
    for scope in scopes {
        let scope = scope.trim();
        if !scope.is_empty() && !out.iter().any(|s| s == scope) {
            out.push(scope.to_string());
        }
    }
    out
}

/// 設定ファイルのパスを取得
pub fn get_config_path() -> Option<PathBuf> {
    let mut config_path = dirs::config_dir()?;
    config_path.push("gh-token-checker");
    config_path.push("config.toml");
    Some(config_path)
}

/// Reads `path`, or the default location when `path` is `None`. A missing
/// default file yields the built-in defaults; a missing explicit file is an
/// error.
pub fn load_config(path: Option<&Path>) -> Result<FileConfig, ConfigError> {
    let (path, explicit) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => match get_config_path() {
            Some(p) => (p, false),
            None => return Ok(FileConfig::default()),
        },
    };

    if !explicit && !path.exists() {
        return Ok(FileConfig::default());
    }

    let contents = fs::read_to_string(&path).map_err(|e| ConfigError::LoadError {
        path: path.clone(),
        source: e,
    })?;
    let config: FileConfig = toml::from_str(&contents)?;
    Ok(config)
}
