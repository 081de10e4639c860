use std::path::Path;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::AppSettings;

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("invalid log level '{0}': {1}")]
    InvalidLogLevel(String, String),

    #[error("cannot prepare log directory: {0}")]
    LogDirectory(#[from] std::io::Error),

    #[error("failed to install subscriber: {0}")]
    Subscriber(String),
}

/// Install the global tracing subscriber.
///
/// Console output always; a daily-rolling file alongside it when
/// `log_file` is set. Authorization decisions and lockout transitions
/// are logged by the services, so the filter level decides how much of
/// that ends up on disk.
pub fn init_logging(settings: &AppSettings) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_new(&settings.log_level).map_err(|e| {
        LoggingError::InvalidLogLevel(settings.log_level.clone(), e.to_string())
    })?;

    let console = fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_filter(filter.clone());

    let registry = tracing_subscriber::registry().with(console);

    let Some(log_path) = &settings.log_file else {
        return registry
            .try_init()
            .map_err(|e| LoggingError::Subscriber(e.to_string()));
    };

    let dir = match log_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let file_name = log_path.file_name().ok_or_else(|| {
        LoggingError::Subscriber(format!("invalid log file path: {}", log_path.display()))
    })?;

    let file = fmt::layer()
        .with_writer(tracing_appender::rolling::daily(dir, file_name))
        .with_ansi(false)
        .with_target(true)
        .with_filter(filter);

    registry
        .with(file)
        .try_init()
        .map_err(|e| LoggingError::Subscriber(e.to_string()))
}
