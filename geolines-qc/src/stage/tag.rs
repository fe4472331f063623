//! Buffer-and-Tag stage: flag features lying near the reference layer.
//!
//! The boolean field is added (or reused) and every feature's value is
//! written through one [`EditSession`](crate::layer::EditSession). The
//! session commits once after the last feature; cancellation or a failure
//! rolls it back, so no partial tagging and no stray field remain.

use std::sync::Arc;

use super::proximity::Proximity;
use super::{Stage, StageContext, StageError, StageKind, StageResult};
use crate::geometry::DEFAULT_ARC_SEGMENTS;
use crate::layer::{AttributeValue, FeatureId, Field, Layer};
use crate::{log_debug, log_info};

/// Default name of the boolean output field.
pub const DEFAULT_TAG_FIELD: &str = "intersects";

/// Buffers each input feature and sets a boolean field to whether the
/// buffer intersects any reference feature.
#[derive(Debug, Clone)]
pub struct TagStage {
    reference: Arc<Layer>,
    distance: f64,
    arc_segments: u32,
    field: String,
    output_name: Option<String>,
}

impl TagStage {
    /// Tag against `reference` at `distance`, writing [`DEFAULT_TAG_FIELD`].
    pub fn new(reference: Arc<Layer>, distance: f64) -> Self {
        Self {
            reference,
            distance,
            arc_segments: DEFAULT_ARC_SEGMENTS,
            field: DEFAULT_TAG_FIELD.to_string(),
            output_name: None,
        }
    }

    pub fn with_arc_segments(mut self, arc_segments: u32) -> Self {
        self.arc_segments = arc_segments;
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    /// Rename the output layer.
    pub fn with_output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }

    pub fn field(&self) -> &str {
        &self.field
    }
}

impl Stage for TagStage {
    fn kind(&self) -> StageKind {
        StageKind::Tag
    }

    fn execute(&self, mut input: Layer, ctx: &StageContext<'_>) -> StageResult {
        let stage = self.kind();
        let engine = ctx.engine();
        let proximity = Proximity::new(&self.reference, self.distance, self.arc_segments, engine);
        log_debug!(
            ctx.logger(),
            "Tagging '{}' against '{}' at {} ({} reference feature(s) indexed)",
            input.name(),
            self.reference.name(),
            self.distance,
            proximity.indexed()
        );

        let ids: Vec<FeatureId> = input.features().map(|f| f.id()).collect();
        let total = ids.len();
        let mut hits = 0usize;

        let mut session = input.begin_edit();
        let field = match session.add_field(Field::boolean(self.field.as_str())) {
            Ok(idx) => idx,
            Err(e) => return StageResult::Failed(StageError::layer(stage, e)),
        };

        for (done, id) in ids.into_iter().enumerate() {
            if ctx.is_cancelled() {
                session.rollback();
                log_debug!(ctx.logger(), "Tagging cancelled after {} feature(s)", done);
                return StageResult::Cancelled;
            }

            let near = match session.layer().feature(id) {
                Some(feature) => proximity.is_near(feature.geometry(), engine),
                None => Ok(false),
            };
            let near = match near {
                Ok(near) => near,
                Err(e) => return StageResult::Failed(StageError::engine(stage, e)),
            };
            if let Err(e) = session.set(id, field, AttributeValue::Boolean(near)) {
                return StageResult::Failed(StageError::layer(stage, e));
            }
            if near {
                hits += 1;
            }
            ctx.report_items(done + 1, total);
        }

        session.commit();
        if let Some(name) = &self.output_name {
            input.set_name(name.as_str());
        }

        log_info!(
            ctx.logger(),
            "Tagged {} of {} feature(s) of '{}' as {}",
            hits,
            total,
            input.name(),
            self.field
        );
        StageResult::Completed(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PlanarEngine;
    use crate::layer::{Crs, GeometryKind};
    use crate::log::NoOpLogger;
    use geo::{line_string, Geometry, LineString};
    use parking_lot::Mutex;
    use proptest::prelude::*;
    use tokio_util::sync::CancellationToken;

    fn reference() -> Arc<Layer> {
        let mut layer = Layer::new("river", Crs::default(), GeometryKind::Line);
        layer
            .add_feature(line_string![(x: 0.0, y: 100.0), (x: 1000.0, y: 100.0)].into(), vec![])
            .unwrap();
        Arc::new(layer)
    }

    fn segments() -> Layer {
        let mut layer = Layer::new("Segmented roads", Crs::default(), GeometryKind::Line);
        // Ends exactly on the reference line.
        layer
            .add_feature(line_string![(x: 10.0, y: 0.0), (x: 10.0, y: 100.0)].into(), vec![])
            .unwrap();
        // 50 units away.
        layer
            .add_feature(line_string![(x: 20.0, y: 0.0), (x: 20.0, y: 50.0)].into(), vec![])
            .unwrap();
        // Single vertex.
        layer
            .add_feature(
                Geometry::LineString(LineString::from(vec![(30.0, 99.0)])),
                vec![],
            )
            .unwrap();
        layer
    }

    fn run(stage: &TagStage, input: Layer, cancel: &CancellationToken) -> StageResult {
        let sink = |_: f64| {};
        let ctx = StageContext::new(&PlanarEngine, cancel, &sink, &NoOpLogger);
        stage.execute(input, &ctx)
    }

    fn flags(layer: &Layer, field: &str) -> Vec<Option<bool>> {
        let idx = layer.schema().index_of(field).unwrap();
        layer
            .features()
            .map(|f| f.attribute(idx).and_then(|v| v.as_bool()))
            .collect()
    }

    #[test]
    fn test_zero_distance_touching_is_true() {
        let stage = TagStage::new(reference(), 0.0);
        let output = run(&stage, segments(), &CancellationToken::new())
            .into_layer()
            .unwrap();
        assert_eq!(
            flags(&output, DEFAULT_TAG_FIELD),
            vec![Some(true), Some(false), Some(false)]
        );
    }

    #[test]
    fn test_distance_reaches_nearby_features() {
        let stage = TagStage::new(reference(), 60.0)
            .with_field("has_nearby_features")
            .with_output_name("roads - river 60");
        let output = run(&stage, segments(), &CancellationToken::new())
            .into_layer()
            .unwrap();
        assert_eq!(output.name(), "roads - river 60");
        assert_eq!(
            flags(&output, "has_nearby_features"),
            vec![Some(true), Some(true), Some(true)]
        );
    }

    #[test]
    fn test_empty_reference_tags_all_false() {
        let empty = Arc::new(Layer::new("none", Crs::default(), GeometryKind::Line));
        let stage = TagStage::new(empty, 500.0);
        let output = run(&stage, segments(), &CancellationToken::new())
            .into_layer()
            .unwrap();
        assert_eq!(
            flags(&output, DEFAULT_TAG_FIELD),
            vec![Some(false), Some(false), Some(false)]
        );
    }

    #[test]
    fn test_existing_field_is_reused() {
        let mut input = segments();
        input.add_field(Field::boolean(DEFAULT_TAG_FIELD)).unwrap();
        let width = input.schema().len();
        let stage = TagStage::new(reference(), 0.0);
        let output = run(&stage, input, &CancellationToken::new())
            .into_layer()
            .unwrap();
        assert_eq!(output.schema().len(), width);
    }

    #[test]
    fn test_field_type_conflict_fails() {
        let mut input = segments();
        input.add_field(Field::text(DEFAULT_TAG_FIELD)).unwrap();
        let stage = TagStage::new(reference(), 0.0);
        let result = run(&stage, input, &CancellationToken::new());
        assert!(matches!(
            result,
            StageResult::Failed(StageError::Layer { stage: StageKind::Tag, .. })
        ));
    }

    #[test]
    fn test_cancelled_leaves_no_result() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let stage = TagStage::new(reference(), 10.0);
        assert!(run(&stage, segments(), &cancel).is_cancelled());
    }

    #[test]
    fn test_single_vertex_on_reference_at_zero_distance() {
        let mut input = Layer::new("Segmented roads", Crs::default(), GeometryKind::Line);
        input
            .add_feature(Geometry::LineString(LineString::from(vec![(30.0, 100.0)])), vec![])
            .unwrap();
        input
            .add_feature(Geometry::LineString(LineString::from(vec![(30.0, 101.0)])), vec![])
            .unwrap();
        let stage = TagStage::new(reference(), 0.0);
        let output = run(&stage, input, &CancellationToken::new())
            .into_layer()
            .unwrap();
        assert_eq!(flags(&output, DEFAULT_TAG_FIELD), vec![Some(true), Some(false)]);
    }

    #[test]
    fn test_cancel_during_tagging_stops_loop() {
        let mut input = Layer::new("Segmented roads", Crs::default(), GeometryKind::Line);
        for i in 0..40 {
            let x = i as f64 * 10.0;
            input
                .add_feature(line_string![(x: x, y: 0.0), (x: x, y: 90.0)].into(), vec![])
                .unwrap();
        }

        let cancel = CancellationToken::new();
        let reported = Mutex::new(Vec::new());
        let sink = {
            let cancel = cancel.clone();
            let reported = &reported;
            move |pct: f64| {
                reported.lock().push(pct);
                if pct >= 50.0 {
                    cancel.cancel();
                }
            }
        };
        let ctx = StageContext::new(&PlanarEngine, &cancel, &sink, &NoOpLogger);
        let stage = TagStage::new(reference(), 20.0);

        assert!(stage.execute(input, &ctx).is_cancelled());
        let reported = reported.lock();
        assert_eq!(reported.last().copied(), Some(50.0));
        assert_eq!(reported.len(), 20);
    }

    proptest! {
        #[test]
        fn prop_tagging_is_idempotent(
            x in -200.0f64..1200.0,
            y in -200.0f64..400.0,
            dx in -100.0f64..100.0,
            distance in 0.0f64..150.0,
        ) {
            let mut input = Layer::new("segment", Crs::default(), GeometryKind::Line);
            input
                .add_feature(line_string![(x: x, y: y), (x: x + dx, y: y + 10.0)].into(), vec![])
                .unwrap();
            let stage = TagStage::new(reference(), distance);

            let first = run(&stage, input.clone(), &CancellationToken::new()).into_layer().unwrap();
            let second = run(&stage, input, &CancellationToken::new()).into_layer().unwrap();
            let again = run(&stage, first.clone(), &CancellationToken::new()).into_layer().unwrap();

            prop_assert_eq!(flags(&first, DEFAULT_TAG_FIELD), flags(&second, DEFAULT_TAG_FIELD));
            prop_assert_eq!(flags(&first, DEFAULT_TAG_FIELD), flags(&again, DEFAULT_TAG_FIELD));
        }
    }
}
