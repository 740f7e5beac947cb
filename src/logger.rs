use crate::config::RunConfig;
use crate::errors::AppError;
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_LOG_FILE_NAME: &str = "gh-token-checker.log";

/// Set up application logging based on configuration
///
/// Logs always go to stderr; with a log file configured they are mirrored
/// there too. The returned guard must be kept alive until exit so buffered
/// lines are flushed.
pub fn setup_logging(config: &RunConfig) -> Result<Option<WorkerGuard>, AppError> {
    // RUST_LOG wins over --verbose and the configured level
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.effective_log_level()))
        .map_err(|e| AppError::Logging {
            reason: format!("invalid log level '{}': {}", config.effective_log_level(), e),
        })?;

    let (file_writer, guard) = match &config.log_file {
        Some(path) => {
            let (writer, guard) = create_file_logger(path)?;
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    set_global(build_subscriber(env_filter, std::io::stderr, file_writer))?;
    Ok(guard)
}

/// Console layer keeps its colours; the file layer is always plain text.
fn build_subscriber<W>(
    env_filter: EnvFilter,
    console: W,
    file_writer: Option<NonBlocking>,
) -> impl tracing::Subscriber + Send + Sync + 'static
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let file_layer = file_writer.map(|writer| fmt::layer().with_ansi(false).with_writer(writer));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(console))
        .with(file_layer)
}

fn set_global<S>(subscriber: S) -> Result<(), AppError>
where
    S: tracing::Subscriber + Send + Sync + 'static,
{
    tracing::subscriber::set_global_default(subscriber).map_err(|e| AppError::Logging {
        reason: e.to_string(),
    })
}

// Create file logger
fn create_file_logger(log_path: &Path) -> Result<(NonBlocking, WorkerGuard), AppError> {
    let log_dir = match log_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().map_err(|e| AppError::Logging {
            reason: format!("current directory not accessible: {}", e),
        })?,
    };

    // Create the directory if it doesn't exist
    std::fs::create_dir_all(&log_dir).map_err(|e| AppError::Logging {
        reason: format!("failed to create log directory {}: {}", log_dir.display(), e),
    })?;

    let log_file_name = log_path
        .file_name()
        .unwrap_or(std::ffi::OsStr::new(DEFAULT_LOG_FILE_NAME));

    // One run, one file: no rotation
    let file_appender = tracing_appender::rolling::never(&log_dir, log_file_name);
    Ok(tracing_appender::non_blocking(file_appender))
}
