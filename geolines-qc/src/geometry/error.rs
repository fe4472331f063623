//! Geometry engine errors.

use thiserror::Error;

/// Errors reported by a [`super::GeometryEngine`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// Buffer distance is negative, NaN or infinite.
    #[error("invalid buffer distance {0}")]
    InvalidDistance(f64),

    /// Arc approximation needs at least one segment per quarter circle.
    #[error("arc approximation needs at least one segment per quarter circle")]
    InvalidArcSegments,

    /// Input contains NaN or infinite coordinates.
    #[error("geometry contains non-finite coordinates")]
    NonFiniteCoordinate,

    /// Operation needs an areal geometry.
    #[error("expected a polygon geometry, got {0}")]
    NotAreal(String),

    /// The underlying engine failed.
    #[error("geometry engine failure: {0}")]
    Engine(String),
}
