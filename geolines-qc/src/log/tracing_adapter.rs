//! Adapter from [`Logger`] to the `tracing` crate.

use crate::log::{LogLevel, Logger};
use std::fmt::Arguments;

/// Logger that forwards every message to `tracing`.
///
/// Messages end up wherever the installed subscriber sends them; with
/// [`crate::logging::init_logging`] that is the append-only debug log plus
/// stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl TracingLogger {
    /// Create a new tracing adapter.
    pub fn new() -> Self {
        Self
    }
}

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, args: Arguments<'_>) {
        match level {
            LogLevel::Trace => tracing::trace!(target: "geolines_qc", "{}", args),
            LogLevel::Debug => tracing::debug!(target: "geolines_qc", "{}", args),
            LogLevel::Info => tracing::info!(target: "geolines_qc", "{}", args),
            LogLevel::Warn => tracing::warn!(target: "geolines_qc", "{}", args),
            LogLevel::Error => tracing::error!(target: "geolines_qc", "{}", args),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_logger_without_subscriber() {
        // No subscriber installed: messages are dropped, nothing panics.
        let logger: Box<dyn Logger> = Box::new(TracingLogger::new());
        logger.info(format_args!("split stage started"));
        logger.debug(format_args!("{} candidates", 4));
    }
}
