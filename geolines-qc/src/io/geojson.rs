//! GeoJSON FeatureCollection reading and writing.
//!
//! The attribute schema is inferred from the feature properties in order of
//! first appearance. A property whose values are all integers becomes an
//! integer field, integers mixed with decimals a real field, and any other
//! mix a text field holding the JSON text of each value.
//!
//! The CRS comes from the legacy `crs.properties.name` member
//! (`EPSG:2056` or `urn:ogc:def:crs:EPSG::2056`); without it the layer is
//! `EPSG:4326`.

use std::fs;
use std::path::{Path, PathBuf};

use geo::{Coord, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::layer::{AttributeValue, Crs, Field, FieldType, GeometryKind, Layer, LayerError};

/// Errors reading or writing GeoJSON.
#[derive(Debug, Error)]
pub enum GeoJsonError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid GeoJSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a FeatureCollection, got {0}")]
    NotFeatureCollection(String),

    #[error("feature {index} has no geometry")]
    MissingGeometry { index: usize },

    #[error("feature {index}: a position needs at least two coordinates")]
    InvalidPosition { index: usize },

    #[error("cannot write {0} geometry as GeoJSON")]
    UnsupportedGeometry(String),

    #[error(transparent)]
    Layer(#[from] LayerError),
}

// =============================================================================
// Document model
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct FeatureCollectionDoc {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    crs: Option<CrsDoc>,
    #[serde(default)]
    features: Vec<FeatureDoc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CrsDoc {
    #[serde(rename = "type")]
    kind: String,
    properties: CrsProperties,
}

#[derive(Debug, Serialize, Deserialize)]
struct CrsProperties {
    name: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct FeatureDoc {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<Value>,
    geometry: Option<GeometryDoc>,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
}

type Position = Vec<f64>;

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
enum GeometryDoc {
    Point(Position),
    MultiPoint(Vec<Position>),
    LineString(Vec<Position>),
    MultiLineString(Vec<Vec<Position>>),
    Polygon(Vec<Vec<Position>>),
    MultiPolygon(Vec<Vec<Vec<Position>>>),
}

// =============================================================================
// Reading
// =============================================================================

/// Read a layer from a GeoJSON file; the layer is named after the file
/// unless the document carries a `name`.
pub fn read_layer(path: &Path) -> Result<Layer, GeoJsonError> {
    let text = fs::read_to_string(path).map_err(|source| GeoJsonError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let fallback = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "layer".to_string());
    layer_from_str(&text, &fallback)
}

/// Parse a GeoJSON FeatureCollection.
pub fn layer_from_str(text: &str, fallback_name: &str) -> Result<Layer, GeoJsonError> {
    let doc: FeatureCollectionDoc = serde_json::from_str(text)?;
    if doc.kind != "FeatureCollection" {
        return Err(GeoJsonError::NotFeatureCollection(doc.kind));
    }

    let crs = doc
        .crs
        .as_ref()
        .map(|c| Crs::new(normalize_crs(&c.properties.name)))
        .unwrap_or_default();
    let name = doc.name.clone().unwrap_or_else(|| fallback_name.to_string());

    let mut geometries = Vec::with_capacity(doc.features.len());
    for (index, feature) in doc.features.iter().enumerate() {
        let geometry = feature
            .geometry
            .as_ref()
            .ok_or(GeoJsonError::MissingGeometry { index })?;
        geometries.push(to_geometry(geometry, index)?);
    }

    let kind = geometries
        .iter()
        .find_map(GeometryKind::of)
        .unwrap_or(GeometryKind::Line);
    let fields = infer_fields(&doc.features);
    let schema = fields.iter().cloned().collect();
    let mut layer = Layer::with_schema(name, crs, kind, schema);

    for (feature, geometry) in doc.features.iter().zip(geometries) {
        let attributes = fields
            .iter()
            .map(|field| {
                let value = feature
                    .properties
                    .as_ref()
                    .and_then(|p| p.get(field.name()))
                    .unwrap_or(&Value::Null);
                attribute_value(field.field_type(), value)
            })
            .collect();
        layer.add_feature(geometry, attributes)?;
    }
    Ok(layer)
}

fn normalize_crs(name: &str) -> String {
    match name.strip_prefix("urn:ogc:def:crs:") {
        Some(rest) => {
            let mut parts = rest.split(':').filter(|p| !p.is_empty());
            let authority = parts.next().unwrap_or_default();
            match parts.last() {
                Some(code) => format!("{authority}:{code}"),
                None => authority.to_string(),
            }
        }
        None => name.to_string(),
    }
}

fn position(p: &[f64], index: usize) -> Result<Coord<f64>, GeoJsonError> {
    match p {
        [x, y, ..] => Ok(Coord { x: *x, y: *y }),
        _ => Err(GeoJsonError::InvalidPosition { index }),
    }
}

fn ring(points: &[Position], index: usize) -> Result<LineString<f64>, GeoJsonError> {
    points
        .iter()
        .map(|p| position(p, index))
        .collect::<Result<Vec<_>, _>>()
        .map(LineString::new)
}

fn polygon(rings: &[Vec<Position>], index: usize) -> Result<Polygon<f64>, GeoJsonError> {
    let mut rings = rings.iter().map(|r| ring(r, index));
    let exterior = rings.next().transpose()?.unwrap_or_else(|| LineString::new(Vec::new()));
    let interiors = rings.collect::<Result<Vec<_>, _>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn to_geometry(doc: &GeometryDoc, index: usize) -> Result<Geometry<f64>, GeoJsonError> {
    Ok(match doc {
        GeometryDoc::Point(p) => Geometry::Point(Point(position(p, index)?)),
        GeometryDoc::MultiPoint(points) => Geometry::MultiPoint(MultiPoint::new(
            points
                .iter()
                .map(|p| position(p, index).map(Point))
                .collect::<Result<_, _>>()?,
        )),
        GeometryDoc::LineString(points) => Geometry::LineString(ring(points, index)?),
        GeometryDoc::MultiLineString(lines) => Geometry::MultiLineString(MultiLineString::new(
            lines
                .iter()
                .map(|l| ring(l, index))
                .collect::<Result<_, _>>()?,
        )),
        GeometryDoc::Polygon(rings) => Geometry::Polygon(polygon(rings, index)?),
        GeometryDoc::MultiPolygon(polygons) => Geometry::MultiPolygon(MultiPolygon::new(
            polygons
                .iter()
                .map(|p| polygon(p, index))
                .collect::<Result<_, _>>()?,
        )),
    })
}

fn json_type(value: &Value) -> Option<FieldType> {
    match value {
        Value::Null => None,
        Value::Bool(_) => Some(FieldType::Boolean),
        Value::Number(n) if n.is_i64() => Some(FieldType::Integer),
        Value::Number(_) => Some(FieldType::Real),
        _ => Some(FieldType::Text),
    }
}

fn infer_fields(features: &[FeatureDoc]) -> Vec<Field> {
    let mut fields: Vec<(String, Option<FieldType>)> = Vec::new();
    for properties in features.iter().filter_map(|f| f.properties.as_ref()) {
        for (key, value) in properties {
            let seen = json_type(value);
            let pos = match fields.iter().position(|(name, _)| name == key) {
                Some(pos) => pos,
                None => {
                    fields.push((key.clone(), None));
                    fields.len() - 1
                }
            };
            let slot = &mut fields[pos].1;
            *slot = match (*slot, seen) {
                (current, None) => current,
                (None, new) => new,
                (Some(a), Some(b)) if a == b => Some(a),
                (Some(FieldType::Integer), Some(FieldType::Real))
                | (Some(FieldType::Real), Some(FieldType::Integer)) => Some(FieldType::Real),
                _ => Some(FieldType::Text),
            };
        }
    }
    fields
        .into_iter()
        .map(|(name, ty)| Field::new(name, ty.unwrap_or(FieldType::Text)))
        .collect()
}

fn attribute_value(field_type: FieldType, value: &Value) -> AttributeValue {
    match (field_type, value) {
        (_, Value::Null) => AttributeValue::Null,
        (FieldType::Boolean, Value::Bool(b)) => AttributeValue::Boolean(*b),
        (FieldType::Integer, Value::Number(n)) => {
            n.as_i64().map_or(AttributeValue::Null, AttributeValue::Integer)
        }
        (FieldType::Real, Value::Number(n)) => {
            n.as_f64().map_or(AttributeValue::Null, AttributeValue::Real)
        }
        (FieldType::Text, Value::String(s)) => AttributeValue::Text(s.clone()),
        (_, other) => AttributeValue::Text(other.to_string()),
    }
}

// =============================================================================
// Writing
// =============================================================================

/// Serialise `layer` as a GeoJSON FeatureCollection.
pub fn layer_to_string(layer: &Layer) -> Result<String, GeoJsonError> {
    let mut features = Vec::with_capacity(layer.len());
    for feature in layer.features() {
        let mut properties = Map::new();
        for (field, value) in layer.schema().iter().zip(feature.attributes()) {
            properties.insert(field.name().to_string(), json_value(value));
        }
        features.push(FeatureDoc {
            kind: "Feature".to_string(),
            id: Some(Value::from(feature.id().0)),
            geometry: Some(from_geometry(feature.geometry())?),
            properties: Some(properties),
        });
    }

    let doc = FeatureCollectionDoc {
        kind: "FeatureCollection".to_string(),
        name: Some(layer.name().to_string()),
        crs: Some(CrsDoc {
            kind: "name".to_string(),
            properties: CrsProperties {
                name: layer.crs().authid().to_string(),
            },
        }),
        features,
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

/// Write `layer` to `path` as GeoJSON.
pub fn write_layer(layer: &Layer, path: &Path) -> Result<(), GeoJsonError> {
    let text = layer_to_string(layer)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| GeoJsonError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, text).map_err(|source| GeoJsonError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn json_value(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::Null => Value::Null,
        AttributeValue::Boolean(b) => Value::Bool(*b),
        AttributeValue::Integer(i) => Value::from(*i),
        AttributeValue::Real(r) => serde_json::Number::from_f64(*r).map_or(Value::Null, Value::Number),
        AttributeValue::Text(s) => Value::String(s.clone()),
    }
}

fn coords(line: &LineString<f64>) -> Vec<Position> {
    line.0.iter().map(|c| vec![c.x, c.y]).collect()
}

fn rings(polygon: &Polygon<f64>) -> Vec<Vec<Position>> {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(coords)
        .collect()
}

fn from_geometry(geometry: &Geometry<f64>) -> Result<GeometryDoc, GeoJsonError> {
    Ok(match geometry {
        Geometry::Point(p) => GeometryDoc::Point(vec![p.x(), p.y()]),
        Geometry::MultiPoint(mp) => {
            GeometryDoc::MultiPoint(mp.iter().map(|p| vec![p.x(), p.y()]).collect())
        }
        Geometry::Line(l) => {
            GeometryDoc::LineString(vec![vec![l.start.x, l.start.y], vec![l.end.x, l.end.y]])
        }
        Geometry::LineString(ls) => GeometryDoc::LineString(coords(ls)),
        Geometry::MultiLineString(mls) => {
            GeometryDoc::MultiLineString(mls.iter().map(coords).collect())
        }
        Geometry::Polygon(p) => GeometryDoc::Polygon(rings(p)),
        Geometry::MultiPolygon(mp) => GeometryDoc::MultiPolygon(mp.iter().map(rings).collect()),
        Geometry::Rect(r) => GeometryDoc::Polygon(rings(&r.to_polygon())),
        Geometry::Triangle(t) => GeometryDoc::Polygon(rings(&t.to_polygon())),
        Geometry::GeometryCollection(_) => {
            return Err(GeoJsonError::UnsupportedGeometry(
                "GeometryCollection".to_string(),
            ))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::FeatureId;
    use geo::line_string;

    const ROADS: &str = r#"{
        "type": "FeatureCollection",
        "crs": { "type": "name", "properties": { "name": "urn:ogc:def:crs:EPSG::2056" } },
        "features": [
            { "type": "Feature",
              "properties": { "name": "main", "lanes": 2, "width": 7 },
              "geometry": { "type": "LineString", "coordinates": [[0, 0], [450, 0, 12.5]] } },
            { "type": "Feature",
              "properties": { "name": "side", "lanes": null, "width": 3.5, "paved": true },
              "geometry": { "type": "MultiLineString",
                            "coordinates": [[[0, 10], [50, 10]], [[60, 10], [90, 10]]] } }
        ]
    }"#;

    #[test]
    fn test_read_feature_collection() {
        let layer = layer_from_str(ROADS, "roads").unwrap();
        assert_eq!(layer.name(), "roads");
        assert_eq!(layer.crs().authid(), "EPSG:2056");
        assert_eq!(layer.kind(), GeometryKind::Line);
        assert_eq!(layer.len(), 2);

        let types: Vec<(String, FieldType)> = layer
            .schema()
            .iter()
            .map(|f| (f.name().to_string(), f.field_type()))
            .collect();
        assert_eq!(
            types,
            vec![
                ("name".to_string(), FieldType::Text),
                ("lanes".to_string(), FieldType::Integer),
                ("width".to_string(), FieldType::Real),
                ("paved".to_string(), FieldType::Boolean),
            ]
        );

        let first = layer.feature(FeatureId(0)).unwrap();
        assert_eq!(first.attribute(2), Some(&AttributeValue::Real(7.0)));
        assert_eq!(first.attribute(3), Some(&AttributeValue::Null));
        assert_eq!(
            first.geometry(),
            &Geometry::LineString(line_string![(x: 0.0, y: 0.0), (x: 450.0, y: 0.0)])
        );
    }

    #[test]
    fn test_default_crs_and_empty_collection() {
        let layer = layer_from_str(r#"{"type":"FeatureCollection","features":[]}"#, "empty").unwrap();
        assert_eq!(layer.crs(), &Crs::default());
        assert!(layer.is_empty());
    }

    #[test]
    fn test_rejects_non_collection_and_bad_positions() {
        assert!(matches!(
            layer_from_str(r#"{"type":"Feature","features":[]}"#, "x"),
            Err(GeoJsonError::NotFeatureCollection(_))
        ));
        let bad = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{},"geometry":{"type":"Point","coordinates":[1]}}]}"#;
        assert!(matches!(
            layer_from_str(bad, "x"),
            Err(GeoJsonError::InvalidPosition { index: 0 })
        ));
        let missing = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{},"geometry":null}]}"#;
        assert!(matches!(
            layer_from_str(missing, "x"),
            Err(GeoJsonError::MissingGeometry { index: 0 })
        ));
    }

    #[test]
    fn test_mixed_families_rejected() {
        let mixed = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{},"geometry":{"type":"Point","coordinates":[1,2]}},
            {"type":"Feature","properties":{},"geometry":{"type":"LineString","coordinates":[[0,0],[1,1]]}}]}"#;
        assert!(matches!(
            layer_from_str(mixed, "x"),
            Err(GeoJsonError::Layer(LayerError::GeometryKindMismatch { .. }))
        ));
    }

    #[test]
    fn test_write_then_read_preserves_layer() {
        let layer = layer_from_str(ROADS, "roads").unwrap();
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out").join("roads.geojson");
        write_layer(&layer, &path).unwrap();

        let back = read_layer(&path).unwrap();
        assert_eq!(back.name(), "roads");
        assert_eq!(back.crs(), layer.crs());
        assert_eq!(back.len(), layer.len());
        for (a, b) in layer.features().zip(back.features()) {
            assert_eq!(a.geometry(), b.geometry());
            assert_eq!(a.attributes(), b.attributes());
        }
    }

    #[test]
    fn test_normalize_crs() {
        assert_eq!(normalize_crs("EPSG:4326"), "EPSG:4326");
        assert_eq!(normalize_crs("urn:ogc:def:crs:EPSG::2056"), "EPSG:2056");
        assert_eq!(normalize_crs("urn:ogc:def:crs:OGC:1.3:CRS84"), "OGC:CRS84");
    }
}
