//! Request validation, performed before any task exists.

use thiserror::Error;

use super::AnalysisRequest;
use crate::layer::{Crs, GeometryKind, Layer};
use crate::stage::StageKind;
use crate::task::TaskOptions;

/// A request that must not start.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("split length must be a positive number, got {0}")]
    NonPositiveSplitLength(f64),

    #[error("buffer distance must be a non-negative number, got {0}")]
    InvalidBufferDistance(f64),

    #[error("extract distance must be a non-negative number, got {0}")]
    InvalidExtractDistance(f64),

    #[error("buffer arc segments must be at least 1")]
    ZeroArcSegments,

    #[error("tag field name must not be empty")]
    EmptyTagField,

    #[error("{stage} needs a {role} layer")]
    MissingLayer { stage: StageKind, role: &'static str },

    #[error("layer '{layer}' is in {found} but the input is in {expected}")]
    CrsMismatch {
        layer: String,
        expected: Crs,
        found: Crs,
    },

    #[error("mask layer '{layer}' must contain polygons, not {kind}s")]
    MaskNotPolygon { layer: String, kind: GeometryKind },

    #[error("nothing to do: supply a mask or reference layer, or enable splitting")]
    NoStagesEnabled,
}

/// Check `request` and return the stages it enables, in order.
pub(crate) fn validate(
    request: &AnalysisRequest,
    options: &TaskOptions,
    split_segments: bool,
) -> Result<Vec<StageKind>, ValidationError> {
    let split = request.split_length;
    if !split.is_finite() || split <= 0.0 {
        return Err(ValidationError::NonPositiveSplitLength(split));
    }
    let buffer = request.buffer_distance;
    if !buffer.is_finite() || buffer < 0.0 {
        return Err(ValidationError::InvalidBufferDistance(buffer));
    }
    if let Some(d) = request.extract_distance {
        if !d.is_finite() || d < 0.0 {
            return Err(ValidationError::InvalidExtractDistance(d));
        }
        if request.reference.is_none() {
            return Err(ValidationError::MissingLayer {
                stage: StageKind::Extract,
                role: "reference",
            });
        }
    }
    if options.arc_segments == 0 {
        return Err(ValidationError::ZeroArcSegments);
    }
    if options.tag_field.trim().is_empty() {
        return Err(ValidationError::EmptyTagField);
    }

    let input = &request.input;
    for other in [&request.reference, &request.mask].into_iter().flatten() {
        check_crs(input, other)?;
    }
    if let Some(mask) = &request.mask {
        if mask.kind() != GeometryKind::Polygon {
            return Err(ValidationError::MaskNotPolygon {
                layer: mask.name().to_string(),
                kind: mask.kind(),
            });
        }
    }

    let mut stages = Vec::new();
    if request.mask.is_some() {
        stages.push(StageKind::Clip);
    }
    if request.extract_distance.is_some() {
        stages.push(StageKind::Extract);
    }
    if split_segments {
        stages.push(StageKind::Split);
    }
    if request.reference.is_some() {
        stages.push(StageKind::Tag);
    }
    if stages.is_empty() {
        return Err(ValidationError::NoStagesEnabled);
    }
    Ok(stages)
}

fn check_crs(input: &Layer, other: &Layer) -> Result<(), ValidationError> {
    if input.crs() == other.crs() {
        Ok(())
    } else {
        Err(ValidationError::CrsMismatch {
            layer: other.name().to_string(),
            expected: input.crs().clone(),
            found: other.crs().clone(),
        })
    }
}
