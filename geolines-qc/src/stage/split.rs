//! Split stage: cut line features into fixed-length segments.
//!
//! Each line part is walked vertex by vertex. Whenever the accumulated
//! length reaches the target, a cut point is interpolated at the exact
//! remaining distance and a new segment starts there. Whatever is left at
//! the end of a part becomes a shorter trailing segment.
//!
//! Segments carry the attributes of their source feature plus two extra
//! fields: [`SOURCE_ID_FIELD`] and a 1-based [`SEGMENT_NO_FIELD`].

use geo::{Coord, Geometry, LineString};

use super::{Stage, StageContext, StageError, StageKind, StageResult};
use crate::geometry::{distance, interpolate, line_parts};
use crate::layer::{AttributeValue, Field, Layer};
use crate::{log_debug, log_info, log_warn};

/// Output field holding the id of the source feature.
pub const SOURCE_ID_FIELD: &str = "source_id";

/// Output field holding the segment's position within its source feature.
pub const SEGMENT_NO_FIELD: &str = "segment_no";

/// Relative tolerance under which a cut lands on the next vertex.
const CUT_TOLERANCE: f64 = 1e-9;

/// Cuts every line feature into segments of `length`.
#[derive(Debug, Clone, Copy)]
pub struct SplitStage {
    length: f64,
}

impl SplitStage {
    pub fn new(length: f64) -> Self {
        Self { length }
    }

    pub fn length(&self) -> f64 {
        self.length
    }
}

impl Stage for SplitStage {
    fn kind(&self) -> StageKind {
        StageKind::Split
    }

    fn execute(&self, input: Layer, ctx: &StageContext<'_>) -> StageResult {
        let stage = self.kind();
        let mut output = input.empty_like(format!("Segmented {}", input.name()));

        let source_idx = match output.ensure_field(Field::integer(SOURCE_ID_FIELD)) {
            Ok(idx) => idx,
            Err(e) => return StageResult::Failed(StageError::layer(stage, e)),
        };
        let segment_idx = match output.ensure_field(Field::integer(SEGMENT_NO_FIELD)) {
            Ok(idx) => idx,
            Err(e) => return StageResult::Failed(StageError::layer(stage, e)),
        };
        let width = output.schema().len();

        log_debug!(
            ctx.logger(),
            "Splitting {} feature(s) of '{}' every {}",
            input.len(),
            input.name(),
            self.length
        );

        let total = input.len();
        for (done, feature) in input.features().enumerate() {
            let pieces: Vec<Geometry<f64>> = match line_parts(feature.geometry()) {
                Some(parts) if !parts.is_empty() => {
                    let mut pieces = Vec::new();
                    for part in &parts {
                        if ctx.is_cancelled() {
                            return StageResult::Cancelled;
                        }
                        if part.len() < 2 {
                            log_warn!(
                                ctx.logger(),
                                "Feature {} of '{}' has a part with {} vertex(es); kept unsplit",
                                feature.id(),
                                input.name(),
                                part.len()
                            );
                        }
                        pieces.extend(
                            split_line(part, self.length)
                                .into_iter()
                                .map(|coords| Geometry::LineString(LineString::new(coords))),
                        );
                    }
                    pieces
                }
                _ => {
                    if ctx.is_cancelled() {
                        return StageResult::Cancelled;
                    }
                    log_warn!(
                        ctx.logger(),
                        "Feature {} of '{}' is not a line; copied unsplit",
                        feature.id(),
                        input.name()
                    );
                    vec![feature.geometry().clone()]
                }
            };

            for (n, piece) in pieces.into_iter().enumerate() {
                let mut attributes = feature.attributes().to_vec();
                attributes.resize(width, AttributeValue::Null);
                attributes[source_idx] = AttributeValue::Integer(feature.id().0 as i64);
                attributes[segment_idx] = AttributeValue::Integer(n as i64 + 1);
                if let Err(e) = output.add_feature(piece, attributes) {
                    return StageResult::Failed(StageError::layer(stage, e));
                }
            }
            ctx.report_items(done + 1, total);
        }

        log_info!(
            ctx.logger(),
            "Split {} feature(s) of '{}' into {} segment(s)",
            total,
            input.name(),
            output.len()
        );
        StageResult::Completed(output)
    }
}

/// Split one vertex sequence into pieces of `length`.
///
/// Every piece but the last is `length` long (within a relative tolerance
/// of 1e-9). Consecutive pieces share their cut point, so concatenating
/// them in order while dropping each joint duplicate gives back the input
/// vertices with the cut points inserted. A sequence with fewer than two
/// vertices, or a non-positive length, yields the input as a single piece.
pub fn split_line(coords: &[Coord<f64>], length: f64) -> Vec<Vec<Coord<f64>>> {
    if coords.len() < 2 || !(length > 0.0) || !length.is_finite() {
        return vec![coords.to_vec()];
    }

    let tolerance = length * CUT_TOLERANCE;
    let mut pieces = Vec::new();
    let mut current = vec![coords[0]];
    let mut accumulated = 0.0;

    for pair in coords.windows(2) {
        let (mut start, end) = (pair[0], pair[1]);
        let mut remaining = distance(start, end);

        loop {
            let needed = length - accumulated;
            if remaining + tolerance < needed {
                current.push(end);
                accumulated += remaining;
                break;
            }

            let cut = if remaining - needed <= tolerance {
                end
            } else {
                interpolate(start, end, needed / remaining)
            };
            current.push(cut);
            pieces.push(std::mem::replace(&mut current, vec![cut]));
            accumulated = 0.0;

            if cut == end {
                break;
            }
            remaining -= needed;
            start = cut;
        }
    }

    if current.len() > 1 {
        pieces.push(current);
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{planar_length, PlanarEngine};
    use crate::layer::{Crs, FeatureId, GeometryKind, Schema};
    use crate::log::{LogLevel, MemoryLogger, NoOpLogger};
    use geo::{line_string, point, MultiLineString};
    use proptest::prelude::*;
    use tokio_util::sync::CancellationToken;

    fn c(x: f64, y: f64) -> Coord<f64> {
        Coord { x, y }
    }

    fn lengths(pieces: &[Vec<Coord<f64>>]) -> Vec<f64> {
        pieces.iter().map(|p| planar_length(p)).collect()
    }

    fn run(input: Layer, length: f64, cancel: &CancellationToken) -> StageResult {
        let sink = |_: f64| {};
        let ctx = StageContext::new(&PlanarEngine, cancel, &sink, &NoOpLogger);
        SplitStage::new(length).execute(input, &ctx)
    }

    #[test]
    fn test_split_450_by_200() {
        let pieces = split_line(&[c(0.0, 0.0), c(450.0, 0.0)], 200.0);
        let got = lengths(&pieces);
        assert_eq!(got.len(), 3);
        for (got, want) in got.iter().zip([200.0, 200.0, 50.0]) {
            assert!((got - want).abs() < 1e-9, "{got} vs {want}");
        }
    }

    #[test]
    fn test_split_across_vertices() {
        // L-shape: 30 + 40 units, split every 50.
        let pieces = split_line(&[c(0.0, 0.0), c(30.0, 0.0), c(30.0, 40.0)], 50.0);
        assert_eq!(pieces.len(), 2);
        assert_eq!(pieces[0][0], c(0.0, 0.0));
        assert_eq!(pieces[0][1], c(30.0, 0.0));
        assert!((pieces[0][2].y - 20.0).abs() < 1e-12);
        assert_eq!(pieces[1].last(), Some(&c(30.0, 40.0)));
    }

    #[test]
    fn test_cut_on_vertex_is_not_duplicated() {
        let pieces = split_line(&[c(0.0, 0.0), c(100.0, 0.0), c(200.0, 0.0)], 100.0);
        assert_eq!(
            pieces,
            vec![vec![c(0.0, 0.0), c(100.0, 0.0)], vec![c(100.0, 0.0), c(200.0, 0.0)]]
        );
    }

    #[test]
    fn test_shorter_than_length_is_single_piece() {
        let line = [c(0.0, 0.0), c(3.0, 4.0)];
        assert_eq!(split_line(&line, 100.0), vec![line.to_vec()]);
    }

    #[test]
    fn test_degenerate_passes_through() {
        assert_eq!(split_line(&[c(1.0, 1.0)], 10.0), vec![vec![c(1.0, 1.0)]]);
        assert_eq!(split_line(&[], 10.0), vec![Vec::<Coord<f64>>::new()]);
        let line = [c(0.0, 0.0), c(10.0, 0.0)];
        assert_eq!(split_line(&line, 0.0), vec![line.to_vec()]);
    }

    #[test]
    fn test_stage_copies_attributes_and_numbers_segments() {
        let schema: Schema = [Field::text("name")].into_iter().collect();
        let mut input = Layer::with_schema("roads", Crs::new("EPSG:2056"), GeometryKind::Line, schema);
        input
            .add_feature(
                line_string![(x: 0.0, y: 0.0), (x: 250.0, y: 0.0)].into(),
                vec!["main".into()],
            )
            .unwrap();
        input
            .add_feature(
                Geometry::MultiLineString(MultiLineString::new(vec![
                    line_string![(x: 0.0, y: 10.0), (x: 150.0, y: 10.0)],
                    line_string![(x: 0.0, y: 20.0), (x: 50.0, y: 20.0)],
                ])),
                vec!["side".into()],
            )
            .unwrap();

        let output = run(input, 100.0, &CancellationToken::new())
            .into_layer()
            .unwrap();
        assert_eq!(output.name(), "Segmented roads");
        assert_eq!(output.crs().authid(), "EPSG:2056");
        assert_eq!(output.len(), 6);

        let source = output.schema().index_of(SOURCE_ID_FIELD).unwrap();
        let segment = output.schema().index_of(SEGMENT_NO_FIELD).unwrap();
        let rows: Vec<(i64, i64, String)> = output
            .features()
            .map(|f| {
                (
                    f.attribute(source).and_then(|v| v.as_i64()).unwrap(),
                    f.attribute(segment).and_then(|v| v.as_i64()).unwrap(),
                    match f.attribute(0) {
                        Some(AttributeValue::Text(s)) => s.clone(),
                        other => panic!("unexpected {other:?}"),
                    },
                )
            })
            .collect();
        assert_eq!(
            rows,
            vec![
                (0, 1, "main".to_string()),
                (0, 2, "main".to_string()),
                (0, 3, "main".to_string()),
                (1, 1, "side".to_string()),
                (1, 2, "side".to_string()),
                (1, 3, "side".to_string()),
            ]
        );
    }

    #[test]
    fn test_stage_passes_points_through() {
        let mut input = Layer::new("wells", Crs::default(), GeometryKind::Point);
        input
            .add_feature(point!(x: 1.0, y: 2.0).into(), vec![])
            .unwrap();
        let output = run(input, 10.0, &CancellationToken::new())
            .into_layer()
            .unwrap();
        assert_eq!(output.len(), 1);
        let f = output.feature(FeatureId(0)).unwrap();
        assert_eq!(f.geometry(), &Geometry::Point(point!(x: 1.0, y: 2.0)));
    }

    #[test]
    fn test_stage_warns_on_degenerate_features() {
        let mut roads = Layer::new("roads", Crs::default(), GeometryKind::Line);
        roads
            .add_feature(Geometry::LineString(LineString::from(vec![(5.0, 5.0)])), vec![])
            .unwrap();
        roads
            .add_feature(line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0)].into(), vec![])
            .unwrap();
        let mut wells = Layer::new("wells", Crs::default(), GeometryKind::Point);
        wells
            .add_feature(point!(x: 1.0, y: 2.0).into(), vec![])
            .unwrap();

        let logger = MemoryLogger::new();
        let sink = |_: f64| {};
        let cancel = CancellationToken::new();
        let ctx = StageContext::new(&PlanarEngine, &cancel, &sink, &logger);
        let stage = SplitStage::new(100.0);

        assert_eq!(stage.execute(roads, &ctx).into_layer().unwrap().len(), 2);
        assert_eq!(stage.execute(wells, &ctx).into_layer().unwrap().len(), 1);
        assert!(logger.contains(LogLevel::Warn, "Feature #0 of 'roads' has a part with 1 vertex"));
        assert!(!logger.contains(LogLevel::Warn, "Feature #1 of 'roads'"));
        assert!(logger.contains(LogLevel::Warn, "Feature #0 of 'wells' is not a line"));
    }

    #[test]
    fn test_stage_cancelled() {
        let mut input = Layer::new("roads", Crs::default(), GeometryKind::Line);
        input
            .add_feature(line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0)].into(), vec![])
            .unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(run(input, 1.0, &cancel).is_cancelled());
    }

    fn polyline() -> impl Strategy<Value = Vec<Coord<f64>>> {
        prop::collection::vec((-1_000.0f64..1_000.0, -1_000.0f64..1_000.0), 2..12)
            .prop_map(|pts| pts.into_iter().map(|(x, y)| c(x, y)).collect())
    }

    proptest! {
        #[test]
        fn prop_pieces_have_target_length(line in polyline(), length in 1.0f64..500.0) {
            let pieces = split_line(&line, length);
            let got = lengths(&pieces);
            for piece_len in &got[..got.len() - 1] {
                prop_assert!((piece_len - length).abs() <= length * 1e-6);
            }
            prop_assert!(got[got.len() - 1] <= length * (1.0 + 1e-6));
            let total: f64 = got.iter().sum();
            prop_assert!((total - planar_length(&line)).abs() <= 1e-6 * (1.0 + total));
        }

        #[test]
        fn prop_pieces_reconstruct_line(line in polyline(), length in 1.0f64..500.0) {
            let pieces = split_line(&line, length);
            for pair in pieces.windows(2) {
                prop_assert_eq!(pair[0].last(), pair[1].first());
            }
            prop_assert_eq!(pieces[0].first(), line.first());
            prop_assert_eq!(pieces[pieces.len() - 1].last(), line.last());

            let mut joined = pieces[0].clone();
            for piece in &pieces[1..] {
                joined.extend_from_slice(&piece[1..]);
            }
            // Original vertices appear in order; everything else is a cut point.
            let mut cursor = joined.iter();
            for vertex in &line {
                prop_assert!(cursor.any(|v| v == vertex));
            }
        }
    }
}
