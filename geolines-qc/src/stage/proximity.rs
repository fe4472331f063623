//! Buffer-then-intersect test shared by the Extract and Tag stages.

use geo::Geometry;

use crate::geometry::{GeometryEngine, GeometryError};
use crate::index::SpatialIndex;
use crate::layer::Layer;

/// Answers "does this geometry lie within `distance` of the reference?".
///
/// The reference index is built once on construction and reused for every
/// lookup.
pub(crate) struct Proximity<'a> {
    reference: &'a Layer,
    index: SpatialIndex,
    distance: f64,
    arc_segments: u32,
}

impl<'a> Proximity<'a> {
    pub(crate) fn new(
        reference: &'a Layer,
        distance: f64,
        arc_segments: u32,
        engine: &dyn GeometryEngine,
    ) -> Self {
        Self {
            reference,
            index: SpatialIndex::build(reference, engine),
            distance,
            arc_segments,
        }
    }

    pub(crate) fn indexed(&self) -> usize {
        self.index.len()
    }

    /// Buffer `geometry` and test it against the index candidates.
    pub(crate) fn is_near(
        &self,
        geometry: &Geometry<f64>,
        engine: &dyn GeometryEngine,
    ) -> Result<bool, GeometryError> {
        if self.index.is_empty() {
            return Ok(false);
        }
        let buffer = engine.buffer(geometry, self.distance, self.arc_segments)?;
        let hit = self
            .index
            .candidates(&buffer, engine)
            .into_iter()
            .filter_map(|id| self.reference.feature(id))
            .any(|candidate| engine.intersects(&buffer, candidate.geometry()));
        Ok(hit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PlanarEngine;
    use crate::layer::{Crs, GeometryKind};
    use geo::{line_string, point};

    fn reference() -> Layer {
        let mut layer = Layer::new("rivers", Crs::default(), GeometryKind::Line);
        layer
            .add_feature(line_string![(x: 0.0, y: 10.0), (x: 100.0, y: 10.0)].into(), vec![])
            .unwrap();
        layer
    }

    #[test]
    fn test_within_and_beyond_distance() {
        let reference = reference();
        let near = Proximity::new(&reference, 5.0, 5, &PlanarEngine);
        assert_eq!(near.indexed(), 1);

        let close: Geometry<f64> = line_string![(x: 0.0, y: 6.0), (x: 50.0, y: 6.0)].into();
        let far: Geometry<f64> = line_string![(x: 0.0, y: 0.0), (x: 50.0, y: 0.0)].into();
        assert!(near.is_near(&close, &PlanarEngine).unwrap());
        assert!(!near.is_near(&far, &PlanarEngine).unwrap());
    }

    #[test]
    fn test_zero_distance_touching() {
        let reference = reference();
        let touching = Proximity::new(&reference, 0.0, 5, &PlanarEngine);
        let candidate: Geometry<f64> = line_string![(x: 50.0, y: 0.0), (x: 50.0, y: 10.0)].into();
        assert!(touching.is_near(&candidate, &PlanarEngine).unwrap());
    }

    #[test]
    fn test_empty_reference_is_never_near() {
        let empty = Layer::new("none", Crs::default(), GeometryKind::Line);
        let proximity = Proximity::new(&empty, 1_000.0, 5, &PlanarEngine);
        let candidate = Geometry::Point(point!(x: 0.0, y: 0.0));
        assert!(!proximity.is_near(&candidate, &PlanarEngine).unwrap());
    }
}
