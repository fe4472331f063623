//! Logger that discards everything.

use crate::log::{LogLevel, Logger};
use std::fmt::Arguments;

/// A logger that drops all messages.
///
/// Used by tests and by callers that only care about the task's terminal
/// state.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    #[inline]
    fn log(&self, _level: LogLevel, _args: Arguments<'_>) {}
}
