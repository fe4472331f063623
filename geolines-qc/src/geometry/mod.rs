//! Geometry capability consumed by the pipeline.
//!
//! The stages never compute buffers or overlays themselves: they call a
//! [`GeometryEngine`]. [`PlanarEngine`] is the default engine, built on the
//! `geo` crate and working in the layer's own planar coordinates.
//!
//! # Operations
//!
//! | Operation      | Used by                 |
//! |----------------|-------------------------|
//! | `buffer`       | Extract, Buffer-and-Tag |
//! | `dissolve`     | Clip (overlay build)    |
//! | `clip`         | Clip                    |
//! | `intersects`   | Extract, Buffer-and-Tag |
//! | `bounding_box` | spatial index           |

mod engine;
mod error;
mod ops;
mod planar;

pub use engine::{GeometryEngine, DEFAULT_ARC_SEGMENTS};
pub use error::GeometryError;
pub use ops::{line_parts, planar_length, vertex_count};
pub use planar::PlanarEngine;

pub(crate) use ops::{distance, interpolate};
