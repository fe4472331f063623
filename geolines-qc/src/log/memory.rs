//! Logger that keeps messages in memory.

use crate::log::{LogLevel, Logger};
use parking_lot::Mutex;
use std::fmt::Arguments;

/// Records every message with its level.
///
/// Handy for asserting that a stage reported a degenerate feature or that a
/// cancelled run said where it stopped.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    entries: Mutex<Vec<(LogLevel, String)>>,
}

impl MemoryLogger {
    /// Create an empty logger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded entries, oldest first.
    pub fn entries(&self) -> Vec<(LogLevel, String)> {
        self.entries.lock().clone()
    }

    /// Returns true if any message at `level` contains `needle`.
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.entries
            .lock()
            .iter()
            .any(|(l, msg)| *l == level && msg.contains(needle))
    }

    /// Number of recorded messages.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if nothing was logged.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Logger for MemoryLogger {
    fn log(&self, level: LogLevel, args: Arguments<'_>) {
        self.entries.lock().push((level, args.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{log_info, log_warn};

    #[test]
    fn test_memory_logger_records_levels() {
        let logger = MemoryLogger::new();
        log_info!(logger, "clipped {} features", 2);
        log_warn!(logger, "feature {} has fewer than two vertices", 7);

        assert_eq!(logger.len(), 2);
        assert!(logger.contains(LogLevel::Info, "clipped 2"));
        assert!(logger.contains(LogLevel::Warn, "feature 7"));
        assert!(!logger.contains(LogLevel::Error, "feature"));
    }
}
