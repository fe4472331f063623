//! The geometry capability interface.

use geo::{Geometry, MultiPolygon, Rect};

use super::GeometryError;

/// Segments per quarter circle used when approximating buffer arcs.
pub const DEFAULT_ARC_SEGMENTS: u32 = 5;

/// Computational geometry consumed by the stage executors.
///
/// Calls are synchronous and may take arbitrarily long; the pipeline only
/// checks for cancellation between calls.
pub trait GeometryEngine: Send + Sync {
    /// Short engine name for logs.
    fn name(&self) -> &str;

    /// Buffer `geometry` by `distance`, approximating each quarter circle
    /// with `arc_segments` segments.
    ///
    /// A distance of zero returns the geometry unchanged, so a later
    /// intersects test still detects touching boundaries.
    fn buffer(
        &self,
        geometry: &Geometry<f64>,
        distance: f64,
        arc_segments: u32,
    ) -> Result<Geometry<f64>, GeometryError>;

    /// Union a set of polygonal geometries into one overlay.
    fn dissolve(&self, polygons: &[&Geometry<f64>]) -> Result<MultiPolygon<f64>, GeometryError>;

    /// Part of `geometry` inside `overlay`, or `None` if nothing remains.
    fn clip(
        &self,
        geometry: &Geometry<f64>,
        overlay: &MultiPolygon<f64>,
    ) -> Result<Option<Geometry<f64>>, GeometryError>;

    /// Exact intersection predicate (touching counts).
    fn intersects(&self, a: &Geometry<f64>, b: &Geometry<f64>) -> bool;

    /// Axis-aligned bounding box, `None` for empty geometries.
    fn bounding_box(&self, geometry: &Geometry<f64>) -> Option<Rect<f64>>;
}
