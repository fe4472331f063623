//! Logger trait definition.

use std::fmt::{self, Arguments};

/// Severity of a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Per-feature detail.
    Trace,
    /// Stage internals.
    Debug,
    /// Stage and task milestones.
    Info,
    /// Recoverable oddities (degenerate or non-line features copied unsplit).
    Warn,
    /// Failures that end a task.
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        };
        f.write_str(label)
    }
}

/// Logging interface for pipeline components.
///
/// Implementations must be `Send + Sync`: the same logger is shared between
/// the caller and the task's worker thread.
pub trait Logger: Send + Sync {
    /// Log a message at the given level.
    fn log(&self, level: LogLevel, args: Arguments<'_>);

    /// Log a trace-level message.
    fn trace(&self, args: Arguments<'_>) {
        self.log(LogLevel::Trace, args);
    }

    /// Log a debug-level message.
    fn debug(&self, args: Arguments<'_>) {
        self.log(LogLevel::Debug, args);
    }

    /// Log an info-level message.
    fn info(&self, args: Arguments<'_>) {
        self.log(LogLevel::Info, args);
    }

    /// Log a warning.
    fn warn(&self, args: Arguments<'_>) {
        self.log(LogLevel::Warn, args);
    }

    /// Log an error.
    fn error(&self, args: Arguments<'_>) {
        self.log(LogLevel::Error, args);
    }
}

/// Log a trace-level message through a [`Logger`].
#[macro_export]
macro_rules! log_trace {
    ($logger:expr, $($arg:tt)*) => {
        $logger.trace(format_args!($($arg)*))
    };
}

/// Log a debug-level message through a [`Logger`].
#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)*) => {
        $logger.debug(format_args!($($arg)*))
    };
}

/// Log an info-level message through a [`Logger`].
#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)*) => {
        $logger.info(format_args!($($arg)*))
    };
}

/// Log a warning through a [`Logger`].
#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)*) => {
        $logger.warn(format_args!($($arg)*))
    };
}

/// Log an error through a [`Logger`].
#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)*) => {
        $logger.error(format_args!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
    }

    #[test]
    fn test_log_level_display() {
        assert_eq!(LogLevel::Warn.to_string(), "WARN");
        assert_eq!(LogLevel::Info.to_string(), "INFO");
    }
}
