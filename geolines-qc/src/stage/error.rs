//! Stage error types.

use thiserror::Error;

use super::StageKind;
use crate::geometry::GeometryError;
use crate::layer::LayerError;

/// Why a stage could not produce its output layer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StageError {
    /// The stage ran but its output holds no features.
    #[error("{stage} produced no features from layer '{layer}'")]
    EmptyResult { stage: StageKind, layer: String },

    /// The geometry engine reported a failure.
    #[error("{stage} failed in the geometry engine: {source}")]
    GeometryEngine {
        stage: StageKind,
        source: GeometryError,
    },

    /// The output layer rejected a feature or attribute.
    #[error("{stage} could not build its output layer: {source}")]
    Layer { stage: StageKind, source: LayerError },
}

impl StageError {
    /// Stage that raised the error.
    pub fn stage(&self) -> StageKind {
        match self {
            Self::EmptyResult { stage, .. }
            | Self::GeometryEngine { stage, .. }
            | Self::Layer { stage, .. } => *stage,
        }
    }

    /// Returns true for an empty-result failure.
    pub fn is_empty_result(&self) -> bool {
        matches!(self, Self::EmptyResult { .. })
    }

    pub(crate) fn engine(stage: StageKind, source: GeometryError) -> Self {
        Self::GeometryEngine { stage, source }
    }

    pub(crate) fn layer(stage: StageKind, source: LayerError) -> Self {
        Self::Layer { stage, source }
    }
}
