//! Layer error types.

use super::{FeatureId, FieldType, GeometryKind};
use thiserror::Error;

/// Errors raised by layer mutation and lookup.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayerError {
    /// Geometry belongs to another family than the layer's.
    #[error("layer '{layer}' holds {expected} geometries, got {found}")]
    GeometryKindMismatch {
        layer: String,
        expected: GeometryKind,
        found: String,
    },

    /// Geometry type the layer model cannot hold (e.g. a collection).
    #[error("unsupported geometry type: {0}")]
    UnsupportedGeometry(String),

    /// A field with this name already exists.
    #[error("field '{0}' already exists")]
    DuplicateField(String),

    /// No field with this name or index.
    #[error("unknown field '{0}'")]
    UnknownField(String),

    /// Existing field has an incompatible type.
    #[error("field '{field}' is {expected}, value is {found}")]
    TypeMismatch {
        field: String,
        expected: FieldType,
        found: String,
    },

    /// No feature with this id.
    #[error("unknown feature {0}")]
    UnknownFeature(FeatureId),

    /// Attribute tuple does not match the schema length.
    #[error("expected {expected} attributes, got {found}")]
    AttributeCount { expected: usize, found: usize },
}
