//! Clip stage: keep the parts of the input that fall inside a mask.

use std::sync::Arc;

use geo::Geometry;

use super::{Stage, StageContext, StageError, StageKind, StageResult};
use crate::layer::Layer;
use crate::{log_debug, log_info};

/// Intersects the input with the mask layer's selected features, or with
/// the whole mask when nothing is selected.
#[derive(Debug, Clone)]
pub struct ClipStage {
    mask: Arc<Layer>,
}

impl ClipStage {
    pub fn new(mask: Arc<Layer>) -> Self {
        Self { mask }
    }

    pub fn mask(&self) -> &Layer {
        &self.mask
    }
}

impl Stage for ClipStage {
    fn kind(&self) -> StageKind {
        StageKind::Clip
    }

    fn execute(&self, input: Layer, ctx: &StageContext<'_>) -> StageResult {
        let stage = self.kind();
        let engine = ctx.engine();

        let mask_features = self.mask.selected_or_all();
        log_debug!(
            ctx.logger(),
            "Clipping '{}' with {} of {} feature(s) from '{}'",
            input.name(),
            mask_features.len(),
            self.mask.len(),
            self.mask.name()
        );

        let polygons: Vec<&Geometry<f64>> = mask_features.iter().map(|f| f.geometry()).collect();
        let overlay = match engine.dissolve(&polygons) {
            Ok(overlay) => overlay,
            Err(e) => return StageResult::Failed(StageError::engine(stage, e)),
        };

        let mut output = input.empty_like(format!("Clipped {}", input.name()));
        let total = input.len();
        for (done, feature) in input.features().enumerate() {
            if ctx.is_cancelled() {
                return StageResult::Cancelled;
            }
            match engine.clip(feature.geometry(), &overlay) {
                Ok(Some(clipped)) => {
                    if let Err(e) = output.add_feature(clipped, feature.attributes().to_vec()) {
                        return StageResult::Failed(StageError::layer(stage, e));
                    }
                }
                Ok(None) => {}
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
            "Clip kept {} of {} feature(s) of '{}'",
            output.len(),
            total,
            input.name()
        );
        StageResult::Completed(output)
    }
}
