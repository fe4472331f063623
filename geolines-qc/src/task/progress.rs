//! Overall task progress.
//!
//! Each stage owns a fixed sub-range of 0..=100 and its own 0-100 progress
//! is mapped into that range. The stored value only ever grows, so progress
//! stays monotonic across stage boundaries and disabled stages.

use std::sync::atomic::{AtomicU8, Ordering};

use crate::stage::StageKind;

/// Progress value published when a task completes.
pub const FINALIZE_PROGRESS: u8 = 100;

/// Sub-range of overall progress assigned to one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressBudget {
    pub start: u8,
    pub end: u8,
}

impl ProgressBudget {
    /// Budget of `stage`.
    pub fn for_stage(stage: StageKind) -> Self {
        let (start, end) = match stage {
            StageKind::Clip => (0, 5),
            StageKind::Extract => (5, 10),
            StageKind::Split => (10, 50),
            StageKind::Tag => (50, 90),
        };
        Self { start, end }
    }

    /// Map a stage-local percentage into this budget.
    pub fn map(self, percent: f64) -> u8 {
        let fraction = if percent.is_finite() {
            percent.clamp(0.0, 100.0) / 100.0
        } else {
            0.0
        };
        let span = f64::from(self.end - self.start);
        self.start + (span * fraction).floor() as u8
    }
}

/// Monotonic progress counter shared between the worker and observers.
#[derive(Debug, Default)]
pub struct Progress(AtomicU8);

impl Progress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value, 0 to 100.
    pub fn get(&self) -> u8 {
        self.0.load(Ordering::Acquire)
    }

    /// Raise progress to `value`; lower values are ignored.
    pub fn advance(&self, value: u8) {
        self.0.fetch_max(value.min(FINALIZE_PROGRESS), Ordering::AcqRel);
    }
}
