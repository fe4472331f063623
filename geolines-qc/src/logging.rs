//! Logging infrastructure.
//!
//! Installs the global `tracing` subscriber used by the CLI:
//! - appends timestamped lines to `<log_dir>/debug.log` (never truncated)
//! - mirrors messages to stderr so stdout stays free for results
//! - honours `RUST_LOG`, defaulting to `info`

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use time::macros::format_description;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Default name of the append-only debug log.
pub const DEFAULT_LOG_FILE: &str = "debug.log";

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping it flushes buffered lines to the log file.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
    path: PathBuf,
}

impl LoggingGuard {
    /// Path of the file receiving log lines.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Initialize the global subscriber.
///
/// Creates `log_dir` if needed. Existing content of the log file is kept;
/// new lines are appended.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn init_logging(log_dir: &Path, log_file: &str) -> Result<LoggingGuard, io::Error> {
    fs::create_dir_all(log_dir)?;

    let timer = LocalTime::new(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second]"
    ));

    let file_appender = tracing_appender::rolling::never(log_dir, log_file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_timer(timer.clone())
        .with_target(false);

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_timer(timer)
        .with_target(false)
        .compact();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
        path: log_dir.join(log_file),
    })
}

/// Default log directory (`<data-local-dir>/geolines-qc/logs`).
///
/// Falls back to `./logs` when the platform has no data directory.
pub fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("geolines-qc").join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_log_dir_ends_with_logs() {
        let dir = default_log_dir();
        assert!(dir.ends_with("logs"));
    }

    #[test]
    fn test_appender_appends_to_existing_file() {
        // The subscriber is global and can only be installed once per process,
        // so exercise the appender directly.
        use std::io::Write;

        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join(DEFAULT_LOG_FILE);
        fs::write(&path, "[2024-01-01 00:00:00] previous run\n").unwrap();

        let mut appender = tracing_appender::rolling::never(temp.path(), DEFAULT_LOG_FILE);
        appender.write_all(b"[2024-01-02 00:00:00] next run\n").unwrap();
        appender.flush().unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("previous run"));
        assert!(contents.contains("next run"));
    }
}
