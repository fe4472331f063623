//! Per-run task configuration.

use crate::geometry::DEFAULT_ARC_SEGMENTS;
use crate::stage::DEFAULT_TAG_FIELD;

/// Options fixed when a task is created.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskOptions {
    /// Return every stage's output alongside the final layer.
    pub keep_intermediate_layers: bool,
    /// Buffer arc segments per quarter circle.
    pub arc_segments: u32,
    /// Name of the boolean field written by the tag stage.
    pub tag_field: String,
}

impl Default for TaskOptions {
    fn default() -> Self {
        Self {
            keep_intermediate_layers: false,
            arc_segments: DEFAULT_ARC_SEGMENTS,
            tag_field: DEFAULT_TAG_FIELD.to_string(),
        }
    }
}
