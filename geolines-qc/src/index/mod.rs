//! Spatial index over a layer's feature bounding boxes.
//!
//! Built once per stage run and queried with a search geometry's bounding
//! box. Results are candidates only: callers confirm them with an exact
//! predicate from the [`GeometryEngine`](crate::geometry::GeometryEngine).

use geo::{Geometry, Rect};
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{RTree, AABB};

use crate::geometry::GeometryEngine;
use crate::layer::{FeatureId, Layer};

type IndexedBox = GeomWithData<Rectangle<[f64; 2]>, FeatureId>;

/// R-tree of feature bounding boxes keyed by [`FeatureId`].
pub struct SpatialIndex {
    tree: RTree<IndexedBox>,
}

impl SpatialIndex {
    /// Bulk-load an index over every feature of `layer`.
    ///
    /// Features with an empty geometry have no bounding box and are never
    /// returned as candidates.
    pub fn build(layer: &Layer, engine: &dyn GeometryEngine) -> Self {
        let boxes = layer
            .features()
            .filter_map(|feature| {
                engine
                    .bounding_box(feature.geometry())
                    .map(|rect| GeomWithData::new(rectangle(rect), feature.id()))
            })
            .collect();
        Self {
            tree: RTree::bulk_load(boxes),
        }
    }

    /// Number of indexed features.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Ids whose bounding box intersects `rect`, sorted ascending.
    pub fn candidates_in(&self, rect: Rect<f64>) -> Vec<FeatureId> {
        let envelope = AABB::from_corners(
            [rect.min().x, rect.min().y],
            [rect.max().x, rect.max().y],
        );
        let mut ids: Vec<FeatureId> = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|entry| entry.data)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Candidates for `geometry`; empty when it has no bounding box.
    pub fn candidates(&self, geometry: &Geometry<f64>, engine: &dyn GeometryEngine) -> Vec<FeatureId> {
        match engine.bounding_box(geometry) {
            Some(rect) => self.candidates_in(rect),
            None => Vec::new(),
        }
    }
}

impl std::fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("len", &self.len())
            .finish()
    }
}

fn rectangle(rect: Rect<f64>) -> Rectangle<[f64; 2]> {
    Rectangle::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y])
}
