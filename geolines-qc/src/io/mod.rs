//! Layer import and export.
//!
//! Only GeoJSON FeatureCollections are supported.

mod geojson;

pub use geojson::{layer_from_str, layer_to_string, read_layer, write_layer, GeoJsonError};
