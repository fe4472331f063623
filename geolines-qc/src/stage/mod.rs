//! Pipeline stage executors.
//!
//! Each stage turns one owned input [`Layer`] into an output layer, or
//! reports why it could not. Stages never panic past their caller and never
//! touch the layers they were given by reference (mask and reference
//! layers are read-only).
//!
//! | Stage                      | Output name          | Fails with      |
//! |----------------------------|----------------------|-----------------|
//! | [`ClipStage`]              | `Clipped <input>`    | empty result    |
//! | [`ExtractStage`]           | `Extracted <input>`  | empty result    |
//! | [`SplitStage`]             | `Segmented <input>`  | -               |
//! | [`TagStage`]               | caller supplied      | -               |
//!
//! Every stage checks the cancellation token in its per-feature loop and
//! answers [`StageResult::Cancelled`] without a partial layer.

mod clip;
mod context;
mod error;
mod extract;
mod proximity;
mod split;
mod tag;

pub use clip::ClipStage;
pub use context::{ProgressSink, StageContext};
pub use error::StageError;
pub use extract::ExtractStage;
pub use split::{split_line, SplitStage, SEGMENT_NO_FIELD, SOURCE_ID_FIELD};
pub use tag::{TagStage, DEFAULT_TAG_FIELD};

use std::fmt;

use crate::layer::Layer;

/// Pipeline stages in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StageKind {
    /// Intersect the input with a mask layer.
    Clip,
    /// Keep input features near the reference layer.
    Extract,
    /// Cut lines into fixed-length segments.
    Split,
    /// Buffer each feature and flag reference intersections.
    Tag,
}

impl StageKind {
    /// All stages in the order a task runs them.
    pub const ALL: [StageKind; 4] = [Self::Clip, Self::Extract, Self::Split, Self::Tag];

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Clip => "Clip",
            Self::Extract => "Extract within distance",
            Self::Split => "Split by length",
            Self::Tag => "Buffer and tag",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of one stage execution.
///
/// Exactly one of an output layer, an error or a cancellation.
#[derive(Debug)]
pub enum StageResult {
    /// The stage produced its output layer.
    Completed(Layer),

    /// The stage failed; later stages must not run.
    Failed(StageError),

    /// Cancellation was observed at a checkpoint.
    Cancelled,
}

impl StageResult {
    /// Returns true if the stage produced a layer.
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// Returns true if the stage failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Returns true if the stage was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Output layer, if any.
    pub fn into_layer(self) -> Option<Layer> {
        match self {
            Self::Completed(layer) => Some(layer),
            _ => None,
        }
    }
}

/// A pipeline stage executor.
///
/// Implementations are configured at construction and may be executed
/// once per task. `execute` must:
/// - check [`StageContext::is_cancelled`] at least once per input feature
/// - report progress in percent of its own work through the context
/// - return errors as [`StageResult::Failed`] instead of panicking
pub trait Stage: Send + Sync {
    /// Which stage this is.
    fn kind(&self) -> StageKind;

    /// Run the stage over `input`.
    fn execute(&self, input: Layer, ctx: &StageContext<'_>) -> StageResult;
}
