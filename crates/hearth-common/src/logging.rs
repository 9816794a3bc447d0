//! Structured logging bootstrap for Hearth

use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::error::{HearthError, Result};

/// Options for the logging system
#[derive(Debug, Clone)]
pub struct LoggingOptions {
    /// Log level filter used when `RUST_LOG` is not set (e.g. "info", "hearth_workouts=debug")
    pub level: String,
    /// Emit one JSON object per event instead of human-readable lines
    pub json_format: bool,
    /// Optional directory for a daily-rolling log file
    pub directory: Option<PathBuf>,
    /// File name prefix for the rolling log file
    pub file_prefix: String,
    /// Whether to log span close events
    pub include_spans: bool,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            directory: None,
            file_prefix: "hearth.log".to_string(),
            include_spans: false,
        }
    }
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize the global tracing subscriber.
///
/// Returns the worker guard of the file writer when a log directory is set;
/// the caller must keep it alive for buffered lines to be flushed.
pub fn init_logging(options: &LoggingOptions) -> Result<Option<WorkerGuard>> {
    let span_events = if options.include_spans {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let console = if options.json_format {
        fmt::layer()
            .json()
            .with_span_events(span_events.clone())
            .with_target(true)
            .boxed()
    } else {
        fmt::layer()
            .with_span_events(span_events.clone())
            .with_target(true)
            .with_thread_names(true)
            .boxed()
    };

    let (file_layer, guard) = match &options.directory {
        Some(directory) => {
            let (writer, guard) = rolling_writer(directory, &options.file_prefix);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_span_events(span_events)
                .with_target(true)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter(&options.level))
        .with(console)
        .with(file_layer)
        .try_init()
        .map_err(|e| HearthError::config(format!("Failed to install tracing subscriber: {e}")))?;

    Ok(guard)
}

fn rolling_writer(
    directory: &Path,
    prefix: &str,
) -> (tracing_appender::non_blocking::NonBlocking, WorkerGuard) {
    let appender = tracing_appender::rolling::daily(directory, prefix);
    tracing_appender::non_blocking(appender)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = LoggingOptions::default();
        assert_eq!(options.level, "info");
        assert!(!options.json_format);
        assert!(options.directory.is_none());
        assert_eq!(options.file_prefix, "hearth.log");
    }

    #[test]
    fn test_invalid_level_falls_back() {
        // An unparsable directive must not panic.
        let _filter = env_filter("not a [valid filter");
    }
}
