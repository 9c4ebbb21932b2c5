//! Tracing setup for the CLI driver
//!
//! The report is printed to stdout as JSON, so log lines go to stderr. With
//! `ENABLE_FILE_LOGS` set, a daily rolling file under `LOG_DIR` receives a
//! copy without ANSI colors.

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "study-engine.log";

/// Keeps the non-blocking file writer alive; drop it to flush
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

pub fn file_logging_enabled() -> bool {
    std::env::var("ENABLE_FILE_LOGS")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false)
}

/// Filter from a level string, `info` when it does not parse
fn env_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Rolling file writer, `None` when the directory cannot be created
fn file_writer(log_dir: &str) -> Option<(NonBlocking, WorkerGuard)> {
    if let Err(err) = std::fs::create_dir_all(log_dir) {
        eprintln!("failed to create log directory {log_dir}: {err}");
        return None;
    }
    let appender = RollingFileAppender::new(Rotation::DAILY, log_dir, LOG_FILE_PREFIX);
    Some(tracing_appender::non_blocking(appender))
}

/// Install the global subscriber; a second call is a no-op
pub fn init_tracing(log_level: &str) -> Option<FileLogGuard> {
    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(true);

    let file = if file_logging_enabled() {
        let log_dir = std::env::var("LOG_DIR").unwrap_or_else(|_| "./logs".to_string());
        file_writer(&log_dir)
    } else {
        None
    };
    let (file_layer, guard) = match file {
        Some((writer, guard)) => (
            Some(fmt::layer().with_writer(writer).with_ansi(false).with_target(true)),
            Some(guard),
        ),
        None => (None, None),
    };

    let _ = tracing_subscriber::registry()
        .with(env_filter(log_level))
        .with(stderr_layer)
        .with(file_layer)
        .try_init();

    guard.map(|g| FileLogGuard { _guard: g })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_filter_falls_back() {
        let filter = env_filter("[[not a filter");
        assert_eq!(filter.to_string(), "info");
    }

    #[test]
    fn test_valid_filter_kept() {
        let filter = env_filter("study_engine=debug");
        assert_eq!(filter.to_string(), "study_engine=debug");
    }

    #[test]
    fn test_file_writer_creates_directory() {
        let dir = std::env::temp_dir().join(format!("study-engine-logs-{}", std::process::id()));
        let dir_str = dir.to_string_lossy().to_string();
        assert!(file_writer(&dir_str).is_some());
        assert!(dir.is_dir());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_init_without_file_logs_returns_no_guard() {
        if !file_logging_enabled() {
            assert!(init_tracing("warn").is_none());
            // already installed: still no panic
            assert!(init_tracing("debug").is_none());
        }
    }
}
