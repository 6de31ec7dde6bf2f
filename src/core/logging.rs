//! Structured logging system
//!
//! This module provides structured logging with:
//! - JSON and text format support
//! - Configurable log levels, overridable through `RUST_LOG`
//! - Non-blocking stdout or daily rolling file output

use crate::core::config::LoggingConfig;
use anyhow::{Context, Result};
use tracing::Level;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// File name prefix for rolling log files
const LOG_FILE_PREFIX: &str = "mashebi-api.log";

/// Logger instance that manages the logging system
///
/// Keep it alive for the lifetime of the process; dropping it flushes and
/// stops the background writer.
pub struct Logger {
    _guard: WorkerGuard,
}

impl Logger {
    /// Initialize the global tracing subscriber from configuration
    pub fn init(config: &LoggingConfig) -> Result<Self> {
        let level = parse_log_level(&config.level)?;

        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(level.as_str()));

        let (writer, guard) = build_writer(config)?;

        let fmt_layer = match config.format.as_str() {
            "json" => fmt::layer()
                .json()
                .with_writer(writer)
                .with_span_events(FmtSpan::CLOSE)
                .with_current_span(true)
                .with_target(true)
                .boxed(),
            "text" => fmt::layer()
                .with_writer(writer)
                .with_span_events(FmtSpan::CLOSE)
                .with_target(true)
                .boxed(),
            _ => anyhow::bail!("Invalid format configuration: {}", config.format),
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .context("Failed to initialize tracing subscriber")?;

        tracing::info!(
            level = %config.level,
            format = %config.format,
            output = %config.output,
            "Logging system initialized"
        );

        Ok(Logger { _guard: guard })
    }
}

fn build_writer(config: &LoggingConfig) -> Result<(NonBlocking, WorkerGuard)> {
    match config.output.as_str() {
        "stdout" => Ok(tracing_appender::non_blocking(std::io::stdout())),
        "file" => {
            let log_dir = config
                .log_dir
                .as_ref()
                .context("log_dir must be specified when output is 'file'")?;

            std::fs::create_dir_all(log_dir).context("Failed to create log directory")?;

            let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
            Ok(tracing_appender::non_blocking(appender))
        }
        _ => anyhow::bail!("Invalid output configuration: {}", config.output),
    }
}

/// Parse log level string to tracing Level
fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!("Invalid log level: {}", level),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level() {
        assert!(matches!(parse_log_level("debug"), Ok(Level::DEBUG)));
        assert!(matches!(parse_log_level("INFO"), Ok(Level::INFO)));
        assert!(matches!(parse_log_level("warn"), Ok(Level::WARN)));
        assert!(matches!(parse_log_level("error"), Ok(Level::ERROR)));
        assert!(parse_log_level("trace-everything").is_err());
    }

    #[test]
    fn test_file_writer_creates_directory() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let log_dir = temp_dir.path().join("logs");
        let config = LoggingConfig {
            level: "info".to_string(),
            format: "text".to_string(),
            output: "file".to_string(),
            log_dir: Some(log_dir.clone()),
        };

        let _writer = build_writer(&config).unwrap();
        assert!(log_dir.is_dir());
    }

    #[test]
    fn test_unknown_output_rejected() {
        let config = LoggingConfig {
            level: "info".to_string(),
            format: "json".to_string(),
            output: "syslog".to_string(),
            log_dir: None,
        };
        assert!(build_writer(&config).is_err());
    }
}
