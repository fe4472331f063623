//! Analysis request builder.

use std::sync::Arc;

use crate::config::{DEFAULT_BUFFER_DISTANCE, DEFAULT_SEGMENT_LENGTH};
use crate::layer::Layer;

/// Everything one analysis run needs.
///
/// Only the input layer is required; the supplied layers decide which
/// stages run.
///
/// ```
/// use geolines_qc::layer::{Crs, GeometryKind, Layer};
/// use geolines_qc::orchestrator::AnalysisRequest;
///
/// let roads = Layer::new("roads", Crs::default(), GeometryKind::Line);
/// let rivers = Layer::new("rivers", Crs::default(), GeometryKind::Line);
/// let request = AnalysisRequest::new(roads)
///     .reference(rivers)
///     .buffer_distance(25.0)
///     .split_length(200.0);
/// assert_eq!(request.buffer(), 25.0);
/// ```
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub(crate) input: Arc<Layer>,
    pub(crate) reference: Option<Arc<Layer>>,
    pub(crate) mask: Option<Arc<Layer>>,
    pub(crate) buffer_distance: f64,
    pub(crate) split_length: f64,
    pub(crate) extract_distance: Option<f64>,
    pub(crate) output_name: Option<String>,
}

impl AnalysisRequest {
    pub fn new(input: impl Into<Arc<Layer>>) -> Self {
        Self {
            input: input.into(),
            reference: None,
            mask: None,
            buffer_distance: DEFAULT_BUFFER_DISTANCE,
            split_length: DEFAULT_SEGMENT_LENGTH,
            extract_distance: None,
            output_name: None,
        }
    }

    /// Layer the input is tested against.
    pub fn reference(mut self, layer: impl Into<Arc<Layer>>) -> Self {
        self.reference = Some(layer.into());
        self
    }

    /// Polygon layer restricting the analysis area.
    ///
    /// Its selected features are used, or all of them if none is selected.
    pub fn mask(mut self, layer: impl Into<Arc<Layer>>) -> Self {
        self.mask = Some(layer.into());
        self
    }

    pub fn buffer_distance(mut self, distance: f64) -> Self {
        self.buffer_distance = distance;
        self
    }

    pub fn split_length(mut self, length: f64) -> Self {
        self.split_length = length;
        self
    }

    /// Keep only input features within `distance` of the reference before
    /// splitting.
    pub fn extract_within(mut self, distance: f64) -> Self {
        self.extract_distance = Some(distance);
        self
    }

    /// Name of the result layer.
    pub fn output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }

    pub fn input(&self) -> &Layer {
        &self.input
    }

    pub fn buffer(&self) -> f64 {
        self.buffer_distance
    }

    pub fn length(&self) -> f64 {
        self.split_length
    }
}
