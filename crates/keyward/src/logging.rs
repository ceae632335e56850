//! Logging setup for the keyward binary.
//!
//! Structured logging on the `tracing` stack: a level derived from the
//! CLI's `-v` flags, a choice of human or JSON output, and an optional
//! file sink with a non-blocking writer.
//!
//! # Example
//!
//! ```no_run
//! use keyward::logging::{init_logging, LogConfig};
//!
//! let _guard = init_logging(&LogConfig::default()).expect("logging init");
//! tracing::info!("controller starting");
//! ```

use std::path::PathBuf;

use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Error type for logging initialization failures.
#[derive(Debug)]
pub enum LogError {
    /// Failed to create the log file or its directory.
    FileCreation(String),
    /// Failed to install the subscriber (e.g. already installed).
    SubscriberInit(String),
}

impl std::fmt::Display for LogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FileCreation(msg) => write!(f, "failed to create log file: {msg}"),
            Self::SubscriberInit(msg) => write!(f, "failed to initialize logging: {msg}"),
        }
    }
}

impl std::error::Error for LogError {}

/// Minimum severity that will be logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Everything, including per-poll consent samples.
    Trace,
    /// Internal progress of each request.
    Debug,
    /// Request outcomes and state transitions.
    Info,
    /// Only problems.
    #[default]
    Warn,
}

impl LogLevel {
    /// The env-filter directive for this level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
        }
    }
}

/// Map CLI verbosity flags (`-v`, `-vv`, `-vvv`) to a level.
#[must_use]
pub const fn verbosity_to_level(verbosity: u8) -> LogLevel {
    match verbosity {
        0 => LogLevel::Warn,
        1 => LogLevel::Info,
        2 => LogLevel::Debug,
        _ => LogLevel::Trace,
    }
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Compact single-line format for interactive use.
    #[default]
    Compact,
    /// JSON for log aggregation.
    Json,
}

/// Configuration for [`init_logging`].
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    /// Minimum severity to log.
    pub level: LogLevel,
    /// Line format.
    pub format: LogFormat,
    /// Optional file sink, in addition to stderr.
    pub file_path: Option<PathBuf>,
}

/// Keeps the non-blocking file writer alive; logs flush when dropped.
pub struct LogGuard {
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
}

impl std::fmt::Debug for LogGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogGuard")
            .field("has_file_guard", &self._file_guard.is_some())
            .finish()
    }
}

/// Install the global tracing subscriber.
///
/// Returns a guard that must be kept alive for the program's lifetime.
///
/// # Errors
///
/// Returns [`LogError`] if the log directory cannot be created or a
/// subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> Result<LogGuard, LogError> {
    let filter = EnvFilter::try_new(config.level.as_str())
        .map_err(|e| LogError::SubscriberInit(e.to_string()))?;

    let (file_writer, file_guard) = match &config.file_path {
        Some(path) => {
            let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
            std::fs::create_dir_all(dir)
                .map_err(|e| LogError::FileCreation(format!("{}: {e}", dir.display())))?;
            let filename = path
                .file_name()
                .map_or_else(|| "keyward.log".to_string(), |n| n.to_string_lossy().into_owned());
            let appender = tracing_appender::rolling::never(dir, filename);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    match (config.format, file_writer) {
        (LogFormat::Compact, None) => {
            let stderr_layer = fmt::layer()
                .compact()
                .with_writer(std::io::stderr)
                .with_target(true);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .try_init()
                .map_err(|e| LogError::SubscriberInit(e.to_string()))?;
        }
        (LogFormat::Compact, Some(writer)) => {
            let stderr_layer = fmt::layer()
                .compact()
                .with_writer(std::io::stderr)
                .with_target(true);
            let file_layer = fmt::layer()
                .compact()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(file_layer)
                .try_init()
                .map_err(|e| LogError::SubscriberInit(e.to_string()))?;
        }
        (LogFormat::Json, None) => {
            let stderr_layer = fmt::layer().json().with_writer(std::io::stderr);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .try_init()
                .map_err(|e| LogError::SubscriberInit(e.to_string()))?;
        }
        (LogFormat::Json, Some(writer)) => {
            let stderr_layer = fmt::layer().json().with_writer(std::io::stderr);
            let file_layer = fmt::layer().json().with_writer(writer).with_ansi(false);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(file_layer)
                .try_init()
                .map_err(|e| LogError::SubscriberInit(e.to_string()))?;
        }
    }

    Ok(LogGuard {
        _file_guard: file_guard,
    })
}
