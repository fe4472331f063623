//! In-memory vector layers.
//!
//! A [`Layer`] is an ordered collection of [`Feature`]s that share a
//! [`Schema`], a coordinate reference system and a [`GeometryKind`] family.
//! Stage executors never reproject and never mix geometry families, so both
//! are fixed when the layer is created.
//!
//! Attribute edits that must become visible all at once go through an
//! [`EditSession`]: edits are buffered, then either committed together or
//! discarded (explicitly, or by dropping the session).
//!
//! ```
//! use geo::{line_string, Geometry};
//! use geolines_qc::layer::{AttributeValue, Crs, Field, GeometryKind, Layer};
//!
//! let mut layer = Layer::new("roads", Crs::new("EPSG:2056"), GeometryKind::Line);
//! layer.add_field(Field::integer("lanes")).unwrap();
//! let id = layer
//!     .add_feature(
//!         Geometry::LineString(line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0)]),
//!         vec![AttributeValue::Integer(2)],
//!     )
//!     .unwrap();
//!
//! let flag = {
//!     let mut edit = layer.begin_edit();
//!     let flag = edit.add_field(Field::boolean("checked")).unwrap();
//!     edit.set(id, flag, AttributeValue::Boolean(true)).unwrap();
//!     edit.commit();
//!     flag
//! };
//! assert_eq!(layer.feature(id).unwrap().attribute(flag), Some(&AttributeValue::Boolean(true)));
//! ```

mod edit;
mod error;
mod feature;
mod layer;
mod schema;

pub use edit::EditSession;
pub use error::LayerError;
pub use feature::{AttributeValue, Feature, FeatureId};
pub use layer::{Crs, GeometryKind, Layer};
pub(crate) use layer::geometry_type_name;
pub use schema::{Field, FieldType, Schema};
