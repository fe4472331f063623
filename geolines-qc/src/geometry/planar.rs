//! Planar geometry engine built on the `geo` crate.
//!
//! Buffers are assembled from capsules: one rounded rectangle per segment
//! plus one disc per isolated vertex. The capsules are returned as a
//! multipolygon without dissolving them, which is all an intersects test
//! needs. Overlays go through `geo`'s boolean operations; those can panic on
//! degenerate input, so every call is isolated and reported as
//! [`GeometryError::Engine`].

use std::borrow::Cow;
use std::f64::consts::{FRAC_PI_2, PI};
use std::panic::{catch_unwind, AssertUnwindSafe};

use geo::{
    BooleanOps, BoundingRect, Coord, CoordsIter, Geometry, GeometryCollection, Intersects,
    LineString, MultiLineString, MultiPolygon, Point, Polygon, Rect,
};

use super::{GeometryEngine, GeometryError};

/// Default [`GeometryEngine`] working in layer coordinates.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanarEngine;

impl PlanarEngine {
    /// Create the engine.
    pub fn new() -> Self {
        Self
    }
}

impl GeometryEngine for PlanarEngine {
    fn name(&self) -> &str {
        "planar"
    }

    fn buffer(
        &self,
        geometry: &Geometry<f64>,
        distance: f64,
        arc_segments: u32,
    ) -> Result<Geometry<f64>, GeometryError> {
        if !distance.is_finite() || distance < 0.0 {
            return Err(GeometryError::InvalidDistance(distance));
        }
        if arc_segments == 0 {
            return Err(GeometryError::InvalidArcSegments);
        }
        check_finite(geometry)?;

        if distance == 0.0 {
            return Ok(geometry.clone());
        }

        let mut parts = Vec::new();
        collect_buffer_parts(geometry, distance, arc_segments, &mut parts);
        Ok(Geometry::MultiPolygon(MultiPolygon::new(parts)))
    }

    fn dissolve(&self, polygons: &[&Geometry<f64>]) -> Result<MultiPolygon<f64>, GeometryError> {
        let mut areal = Vec::with_capacity(polygons.len());
        for geometry in polygons {
            check_finite(geometry)?;
            areal.push(as_multi_polygon(geometry)?);
        }

        isolate(|| {
            let mut iter = areal.into_iter();
            let first = iter.next().unwrap_or_else(|| MultiPolygon::new(Vec::new()));
            iter.fold(first, |acc, next| acc.union(&next))
        })
    }

    fn clip(
        &self,
        geometry: &Geometry<f64>,
        overlay: &MultiPolygon<f64>,
    ) -> Result<Option<Geometry<f64>>, GeometryError> {
        check_finite(geometry)?;

        match geometry {
            Geometry::Point(_) | Geometry::MultiPoint(_) => {
                let kept: Vec<Point<f64>> = geometry
                    .coords_iter()
                    .map(Point::from)
                    .filter(|p| overlay.intersects(p))
                    .collect();
                Ok(match kept.len() {
                    0 => None,
                    1 => Some(Geometry::Point(kept[0])),
                    _ => Some(Geometry::MultiPoint(kept.into())),
                })
            }
            Geometry::Line(_) | Geometry::LineString(_) | Geometry::MultiLineString(_) => {
                let lines = as_multi_line_string(geometry);
                let clipped = isolate(|| overlay.clip(&lines, false))?;
                let mut parts: Vec<LineString<f64>> = clipped
                    .0
                    .into_iter()
                    .filter(|ls| ls.0.len() >= 2)
                    .collect();
                Ok(match parts.len() {
                    0 => None,
                    1 => parts.pop().map(Geometry::LineString),
                    _ => Some(Geometry::MultiLineString(MultiLineString::new(parts))),
                })
            }
            Geometry::GeometryCollection(_) => Err(GeometryError::Engine(
                "cannot clip a geometry collection".to_string(),
            )),
            _ => {
                let areal = as_multi_polygon(geometry)?;
                let mut clipped = isolate(|| areal.intersection(overlay))?;
                Ok(match clipped.0.len() {
                    0 => None,
                    1 => clipped.0.pop().map(Geometry::Polygon),
                    _ => Some(Geometry::MultiPolygon(clipped)),
                })
            }
        }
    }

    fn intersects(&self, a: &Geometry<f64>, b: &Geometry<f64>) -> bool {
        if a.coords_count() == 0 || b.coords_count() == 0 {
            return false;
        }
        let a = collapse_single_vertex_lines(a);
        let b = collapse_single_vertex_lines(b);
        (*a).intersects(&*b)
    }

    fn bounding_box(&self, geometry: &Geometry<f64>) -> Option<Rect<f64>> {
        geometry.bounding_rect()
    }
}

/// Replace line parts with a single vertex by that vertex as a point.
///
/// A one-vertex line string never intersects anything in `geo`, while its
/// buffer at any positive distance is a disc around the vertex.
fn collapse_single_vertex_lines(geometry: &Geometry<f64>) -> Cow<'_, Geometry<f64>> {
    match geometry {
        Geometry::LineString(ls) if ls.0.len() == 1 => Cow::Owned(Geometry::Point(Point(ls.0[0]))),
        Geometry::MultiLineString(mls) if mls.0.iter().any(|ls| ls.0.len() < 2) => {
            let members: Vec<Geometry<f64>> = mls
                .0
                .iter()
                .filter_map(|ls| match ls.0.len() {
                    0 => None,
                    1 => Some(Geometry::Point(Point(ls.0[0]))),
                    _ => Some(Geometry::LineString(ls.clone())),
                })
                .collect();
            Cow::Owned(Geometry::GeometryCollection(GeometryCollection::new_from(members)))
        }
        Geometry::GeometryCollection(gc)
            if gc.0.iter().any(|g| matches!(collapse_single_vertex_lines(g), Cow::Owned(_))) =>
        {
            let members: Vec<Geometry<f64>> = gc
                .0
                .iter()
                .map(|g| collapse_single_vertex_lines(g).into_owned())
                .collect();
            Cow::Owned(Geometry::GeometryCollection(GeometryCollection::new_from(members)))
        }
        _ => Cow::Borrowed(geometry),
    }
}

// =============================================================================
// Buffer construction
// =============================================================================

fn collect_buffer_parts(
    geometry: &Geometry<f64>,
    distance: f64,
    arc_segments: u32,
    out: &mut Vec<Polygon<f64>>,
) {
    match geometry {
        Geometry::Point(p) => out.push(disc(p.0, distance, arc_segments)),
        Geometry::MultiPoint(mp) => {
            out.extend(mp.iter().map(|p| disc(p.0, distance, arc_segments)));
        }
        Geometry::Line(line) => {
            buffer_path(&[line.start, line.end], distance, arc_segments, out);
        }
        Geometry::LineString(ls) => buffer_path(&ls.0, distance, arc_segments, out),
        Geometry::MultiLineString(mls) => {
            for ls in mls {
                buffer_path(&ls.0, distance, arc_segments, out);
            }
        }
        Geometry::Polygon(polygon) => buffer_polygon(polygon, distance, arc_segments, out),
        Geometry::MultiPolygon(mp) => {
            for polygon in mp {
                buffer_polygon(polygon, distance, arc_segments, out);
            }
        }
        Geometry::Rect(rect) => buffer_polygon(&rect.to_polygon(), distance, arc_segments, out),
        Geometry::Triangle(tri) => buffer_polygon(&tri.to_polygon(), distance, arc_segments, out),
        Geometry::GeometryCollection(gc) => {
            for member in gc {
                collect_buffer_parts(member, distance, arc_segments, out);
            }
        }
    }
}

fn buffer_polygon(polygon: &Polygon<f64>, distance: f64, arc_segments: u32, out: &mut Vec<Polygon<f64>>) {
    if polygon.exterior().0.is_empty() {
        return;
    }
    out.push(polygon.clone());
    buffer_path(&polygon.exterior().0, distance, arc_segments, out);
    for interior in polygon.interiors() {
        buffer_path(&interior.0, distance, arc_segments, out);
    }
}

fn buffer_path(coords: &[Coord<f64>], distance: f64, arc_segments: u32, out: &mut Vec<Polygon<f64>>) {
    match coords {
        [] => {}
        [single] => out.push(disc(*single, distance, arc_segments)),
        _ => {
            for pair in coords.windows(2) {
                if pair[0] == pair[1] {
                    out.push(disc(pair[0], distance, arc_segments));
                } else {
                    out.push(capsule(pair[0], pair[1], distance, arc_segments));
                }
            }
        }
    }
}

/// Disc around `center`, `4 * arc_segments` vertices.
fn disc(center: Coord<f64>, radius: f64, arc_segments: u32) -> Polygon<f64> {
    let steps = 4 * arc_segments;
    let step = 2.0 * PI / f64::from(steps);
    let mut ring: Vec<Coord<f64>> = (0..steps)
        .map(|k| arc_point(center, radius, f64::from(k) * step))
        .collect();
    ring.push(ring[0]);
    Polygon::new(LineString::new(ring), Vec::new())
}

/// Rounded rectangle around the segment `p -> q`.
///
/// Each end gets a half circle of `2 * arc_segments` segments.
fn capsule(p: Coord<f64>, q: Coord<f64>, radius: f64, arc_segments: u32) -> Polygon<f64> {
    let theta = (q.y - p.y).atan2(q.x - p.x);
    let steps = 2 * arc_segments;
    let step = PI / f64::from(steps);

    let mut ring = Vec::with_capacity(2 * steps as usize + 3);
    // Counter-clockwise: around q from the left side to the right side,
    // then around p back to the left side.
    for k in 0..=steps {
        ring.push(arc_point(q, radius, theta - FRAC_PI_2 + f64::from(k) * step));
    }
    for k in 0..=steps {
        ring.push(arc_point(p, radius, theta + FRAC_PI_2 + f64::from(k) * step));
    }
    ring.push(ring[0]);
    Polygon::new(LineString::new(ring), Vec::new())
}

fn arc_point(center: Coord<f64>, radius: f64, angle: f64) -> Coord<f64> {
    Coord {
        x: center.x + radius * angle.cos(),
        y: center.y + radius * angle.sin(),
    }
}

// =============================================================================
// Conversions
// =============================================================================

fn check_finite(geometry: &Geometry<f64>) -> Result<(), GeometryError> {
    if geometry.coords_iter().all(|c| c.x.is_finite() && c.y.is_finite()) {
        Ok(())
    } else {
        Err(GeometryError::NonFiniteCoordinate)
    }
}

fn as_multi_polygon(geometry: &Geometry<f64>) -> Result<MultiPolygon<f64>, GeometryError> {
    match geometry {
        Geometry::Polygon(p) => Ok(MultiPolygon::new(vec![p.clone()])),
        Geometry::MultiPolygon(mp) => Ok(mp.clone()),
        Geometry::Rect(r) => Ok(MultiPolygon::new(vec![r.to_polygon()])),
        Geometry::Triangle(t) => Ok(MultiPolygon::new(vec![t.to_polygon()])),
        other => Err(GeometryError::NotAreal(
            crate::layer::geometry_type_name(other).to_string(),
        )),
    }
}

fn as_multi_line_string(geometry: &Geometry<f64>) -> MultiLineString<f64> {
    match geometry {
        Geometry::Line(line) => {
            MultiLineString::new(vec![LineString::new(vec![line.start, line.end])])
        }
        Geometry::LineString(ls) => MultiLineString::new(vec![ls.clone()]),
        Geometry::MultiLineString(mls) => mls.clone(),
        _ => MultiLineString::new(Vec::new()),
    }
}

/// Run a `geo` overlay, turning a panic into an engine error.
fn isolate<T>(op: impl FnOnce() -> T) -> Result<T, GeometryError> {
    catch_unwind(AssertUnwindSafe(op)).map_err(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "overlay panicked".to_string());
        GeometryError::Engine(message)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{line_string, point, polygon, Area};

    fn engine() -> PlanarEngine {
        PlanarEngine::new()
    }

    fn square(x0: f64, y0: f64, size: f64) -> Geometry<f64> {
        Geometry::Polygon(polygon![
            (x: x0, y: y0),
            (x: x0 + size, y: y0),
            (x: x0 + size, y: y0 + size),
            (x: x0, y: y0 + size),
            (x: x0, y: y0),
        ])
    }

    #[test]
    fn test_buffer_zero_distance_returns_input() {
        let line = Geometry::LineString(line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0)]);
        let buffered = engine().buffer(&line, 0.0, 5).unwrap();
        assert_eq!(buffered, line);
    }

    #[test]
    fn test_buffer_rejects_bad_arguments() {
        let p = Geometry::Point(point!(x: 0.0, y: 0.0));
        assert_eq!(
            engine().buffer(&p, -1.0, 5),
            Err(GeometryError::InvalidDistance(-1.0))
        );
        assert!(matches!(
            engine().buffer(&p, f64::NAN, 5),
            Err(GeometryError::InvalidDistance(_))
        ));
        assert_eq!(
            engine().buffer(&p, 1.0, 0),
            Err(GeometryError::InvalidArcSegments)
        );
        let bad = Geometry::Point(point!(x: f64::INFINITY, y: 0.0));
        assert_eq!(
            engine().buffer(&bad, 1.0, 5),
            Err(GeometryError::NonFiniteCoordinate)
        );
    }

    #[test]
    fn test_buffer_point_area_approximates_circle() {
        let p = Geometry::Point(point!(x: 3.0, y: 4.0));
        let buffered = engine().buffer(&p, 10.0, 16).unwrap();
        let area = buffered.unsigned_area();
        let circle = PI * 100.0;
        assert!(area < circle);
        assert!(area > circle * 0.99, "area {area}");
    }

    #[test]
    fn test_buffer_line_reaches_distance() {
        let line = Geometry::LineString(line_string![(x: 0.0, y: 0.0), (x: 100.0, y: 0.0)]);
        let buffered = engine().buffer(&line, 5.0, 5).unwrap();

        let near = Geometry::Point(point!(x: 50.0, y: 4.9));
        let far = Geometry::Point(point!(x: 50.0, y: 5.1));
        let past_end = Geometry::Point(point!(x: 104.0, y: 0.0));
        assert!(engine().intersects(&buffered, &near));
        assert!(!engine().intersects(&buffered, &far));
        assert!(engine().intersects(&buffered, &past_end));
    }

    #[test]
    fn test_buffer_polygon_keeps_interior() {
        let sq = square(0.0, 0.0, 100.0);
        let buffered = engine().buffer(&sq, 1.0, 5).unwrap();
        let center = Geometry::Point(point!(x: 50.0, y: 50.0));
        assert!(engine().intersects(&buffered, &center));
    }

    #[test]
    fn test_intersects_touching_counts() {
        let a = square(0.0, 0.0, 10.0);
        let b = square(10.0, 0.0, 10.0);
        assert!(engine().intersects(&a, &b));
        let c = square(10.5, 0.0, 10.0);
        assert!(!engine().intersects(&a, &c));
    }

    #[test]
    fn test_intersects_single_vertex_line_at_zero_distance() {
        let engine = PlanarEngine;
        let lone = Geometry::LineString(LineString::new(vec![Coord { x: 30.0, y: 100.0 }]));
        let reference = Geometry::LineString(line_string![(x: 0.0, y: 100.0), (x: 100.0, y: 100.0)]);
        let off = Geometry::LineString(LineString::new(vec![Coord { x: 30.0, y: 105.0 }]));

        let zero = engine.buffer(&lone, 0.0, 5).unwrap();
        assert!(engine.intersects(&zero, &reference));
        assert!(engine.intersects(&reference, &zero));
        assert!(!engine.intersects(&engine.buffer(&off, 0.0, 5).unwrap(), &reference));

        let multi = Geometry::MultiLineString(MultiLineString::new(vec![
            LineString::new(vec![Coord { x: 500.0, y: 500.0 }]),
            LineString::new(vec![Coord { x: 30.0, y: 100.0 }]),
        ]));
        assert!(engine.intersects(&multi, &reference));
    }

    #[test]
    fn test_intersects_empty_is_false() {
        let empty = Geometry::LineString(LineString::new(Vec::new()));
        assert!(!engine().intersects(&empty, &square(0.0, 0.0, 1.0)));
    }

    #[test]
    fn test_dissolve_and_clip_line() {
        let a = square(0.0, 0.0, 10.0);
        let b = square(10.0, 0.0, 10.0);
        let overlay = engine().dissolve(&[&a, &b]).unwrap();
        assert!((overlay.unsigned_area() - 200.0).abs() < 1e-9);

        let line = Geometry::LineString(line_string![(x: -5.0, y: 5.0), (x: 25.0, y: 5.0)]);
        let clipped = engine().clip(&line, &overlay).unwrap().unwrap();
        let parts = super::super::line_parts(&clipped).unwrap();
        let total: f64 = parts.iter().map(|p| super::super::planar_length(p)).sum();
        assert!((total - 20.0).abs() < 1e-9, "length {total}");
    }

    #[test]
    fn test_clip_outside_is_none() {
        let overlay = engine().dissolve(&[&square(0.0, 0.0, 10.0)]).unwrap();
        let line = Geometry::LineString(line_string![(x: 50.0, y: 50.0), (x: 60.0, y: 50.0)]);
        assert_eq!(engine().clip(&line, &overlay).unwrap(), None);

        let inside = Geometry::Point(point!(x: 1.0, y: 1.0));
        assert_eq!(engine().clip(&inside, &overlay).unwrap(), Some(inside.clone()));
    }

    #[test]
    fn test_dissolve_rejects_lines() {
        let line = Geometry::LineString(line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)]);
        assert!(matches!(
            engine().dissolve(&[&line]),
            Err(GeometryError::NotAreal(_))
        ));
    }

    #[test]
    fn test_bounding_box() {
        let line = Geometry::LineString(line_string![(x: -1.0, y: 2.0), (x: 3.0, y: -4.0)]);
        let bbox = engine().bounding_box(&line).unwrap();
        assert_eq!(bbox.min(), Coord { x: -1.0, y: -4.0 });
        assert_eq!(bbox.max(), Coord { x: 3.0, y: 2.0 });
    }
}
