//! Extract stage: keep input features lying within a distance of the
//! reference layer.

use std::sync::Arc;

use super::proximity::Proximity;
use super::{Stage, StageContext, StageError, StageKind, StageResult};
use crate::layer::Layer;
use crate::{log_debug, log_info};

/// Filters the input down to features whose buffer intersects the
/// reference layer.
///
/// The distance is used exactly as given.
#[derive(Debug, Clone)]
pub struct ExtractStage {
    reference: Arc<Layer>,
    distance: f64,
    arc_segments: u32,
}

impl ExtractStage {
    pub fn new(reference: Arc<Layer>, distance: f64, arc_segments: u32) -> Self {
        Self {
            reference,
            distance,
            arc_segments,
        }
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }
}

impl Stage for ExtractStage {
    fn kind(&self) -> StageKind {
        StageKind::Extract
    }

    fn execute(&self, input: Layer, ctx: &StageContext<'_>) -> StageResult {
        let stage = self.kind();
        let engine = ctx.engine();
        let proximity = Proximity::new(&self.reference, self.distance, self.arc_segments, engine);
        log_debug!(
            ctx.logger(),
            "Extracting features of '{}' within {} of '{}' ({} indexed)",
            input.name(),
            self.distance,
            self.reference.name(),
            proximity.indexed()
        );

        let mut output = input.empty_like(format!("Extracted {}", input.name()));
        let total = input.len();
        for (done, feature) in input.features().enumerate() {
            if ctx.is_cancelled() {
                return StageResult::Cancelled;
            }
            match proximity.is_near(feature.geometry(), engine) {
                Ok(true) => {
                    if let Err(e) =
                        output.add_feature(feature.geometry().clone(), feature.attributes().to_vec())
                    {
                        return StageResult::Failed(StageError::layer(stage, e));
                    }
                }
                Ok(false) => {}
                Err(e) => return StageResult::Failed(StageError::engine(stage, e)),
            }
            ctx.report_items(done + 1, total);
        }

        if output.is_empty() {
            return StageResult::Failed(StageError::EmptyResult {
                stage,
                layer: input.name().to_string(),
            });
        }

        log_info!(
            ctx.logger(),
            "Extracted {} of {} feature(s) from '{}'",
            output.len(),
            total,
            input.name()
        );
        StageResult::Completed(output)
    }
}
