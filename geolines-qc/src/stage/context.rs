//! Execution context handed to every stage.

use tokio_util::sync::CancellationToken;

use crate::geometry::GeometryEngine;
use crate::log::Logger;

/// Receives a stage's own progress in percent (0 to 100).
pub trait ProgressSink: Send + Sync {
    fn report(&self, percent: f64);
}

impl<F> ProgressSink for F
where
    F: Fn(f64) + Send + Sync,
{
    fn report(&self, percent: f64) {
        self(percent)
    }
}

/// Collaborators a stage may use while executing.
pub struct StageContext<'a> {
    engine: &'a dyn GeometryEngine,
    cancel: &'a CancellationToken,
    progress: &'a dyn ProgressSink,
    logger: &'a dyn Logger,
}

impl<'a> StageContext<'a> {
    pub fn new(
        engine: &'a dyn GeometryEngine,
        cancel: &'a CancellationToken,
        progress: &'a dyn ProgressSink,
        logger: &'a dyn Logger,
    ) -> Self {
        Self {
            engine,
            cancel,
            progress,
            logger,
        }
    }

    pub fn engine(&self) -> &'a dyn GeometryEngine {
        self.engine
    }

    pub fn logger(&self) -> &'a dyn Logger {
        self.logger
    }

    /// Cancellation checkpoint.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Report progress in percent.
    pub fn report(&self, percent: f64) {
        self.progress.report(percent.clamp(0.0, 100.0));
    }

    /// Report `done` out of `total` items.
    pub fn report_items(&self, done: usize, total: usize) {
        if total == 0 {
            self.report(100.0);
        } else {
            self.report(done as f64 * 100.0 / total as f64);
        }
    }
}
