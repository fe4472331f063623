//! Small coordinate helpers shared by the stages.

use geo::{Coord, CoordsIter, EuclideanLength, Geometry, Line, LineInterpolatePoint};

/// Euclidean distance between two coordinates.
pub(crate) fn distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    Line::new(a, b).euclidean_length()
}

/// Point at fraction `t` along `a -> b`; `b` when the fraction is not finite.
pub(crate) fn interpolate(a: Coord<f64>, b: Coord<f64>, t: f64) -> Coord<f64> {
    Line::new(a, b)
        .line_interpolate_point(t)
        .map(Coord::from)
        .unwrap_or(b)
}

/// Length of a vertex sequence.
pub fn planar_length(coords: &[Coord<f64>]) -> f64 {
    coords
        .windows(2)
        .map(|w| Line::new(w[0], w[1]).euclidean_length())
        .sum()
}

/// Total number of vertices.
pub fn vertex_count(geometry: &Geometry<f64>) -> usize {
    geometry.coords_count()
}

/// Vertex sequence of each part of a line geometry.
///
/// Returns `None` for non-line geometries.
pub fn line_parts(geometry: &Geometry<f64>) -> Option<Vec<Vec<Coord<f64>>>> {
    match geometry {
        Geometry::Line(line) => Some(vec![vec![line.start, line.end]]),
        Geometry::LineString(ls) => Some(vec![ls.0.clone()]),
        Geometry::MultiLineString(mls) => Some(mls.0.iter().map(|ls| ls.0.clone()).collect()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{line_string, point, MultiLineString};

    #[test]
    fn test_planar_length() {
        let coords = [
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 3.0, y: 4.0 },
            Coord { x: 3.0, y: 10.0 },
        ];
        assert!((planar_length(&coords) - 11.0).abs() < 1e-12);
        assert_eq!(planar_length(&coords[..1]), 0.0);
    }

    #[test]
    fn test_interpolate_midpoint() {
        let mid = interpolate(Coord { x: 0.0, y: 0.0 }, Coord { x: 10.0, y: -4.0 }, 0.5);
        assert_eq!(mid, Coord { x: 5.0, y: -2.0 });
    }

    #[test]
    fn test_line_parts() {
        let multi = Geometry::MultiLineString(MultiLineString::new(vec![
            line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)],
            line_string![(x: 2.0, y: 0.0), (x: 3.0, y: 0.0), (x: 3.0, y: 1.0)],
        ]));
        let parts = line_parts(&multi).unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1].len(), 3);
        assert_eq!(vertex_count(&multi), 5);

        assert!(line_parts(&Geometry::Point(point!(x: 0.0, y: 0.0))).is_none());
    }
}
