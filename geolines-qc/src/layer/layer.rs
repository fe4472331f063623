//! The [`Layer`] container.

use geo::Geometry;
use std::collections::BTreeSet;
use std::fmt;

use super::{AttributeValue, EditSession, Feature, FeatureId, Field, LayerError, Schema};

/// Coordinate reference system identifier (e.g. `EPSG:2056`).
///
/// The identifier is carried along and compared, never interpreted.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Crs(String);

impl Crs {
    /// Create a CRS from an authority identifier.
    pub fn new(authid: impl Into<String>) -> Self {
        Self(authid.into())
    }

    /// Authority identifier.
    pub fn authid(&self) -> &str {
        &self.0
    }
}

impl Default for Crs {
    fn default() -> Self {
        Self::new("EPSG:4326")
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Geometry family shared by every feature of a layer.
///
/// Single- and multi-part geometries belong to the same family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Point,
    Line,
    Polygon,
}

impl GeometryKind {
    /// Family of `geometry`, or `None` for collections.
    pub fn of(geometry: &Geometry<f64>) -> Option<Self> {
        match geometry {
            Geometry::Point(_) | Geometry::MultiPoint(_) => Some(Self::Point),
            Geometry::Line(_) | Geometry::LineString(_) | Geometry::MultiLineString(_) => {
                Some(Self::Line)
            }
            Geometry::Polygon(_)
            | Geometry::MultiPolygon(_)
            | Geometry::Rect(_)
            | Geometry::Triangle(_) => Some(Self::Polygon),
            Geometry::GeometryCollection(_) => None,
        }
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Point => "point",
            Self::Line => "line",
            Self::Polygon => "polygon",
        };
        f.write_str(label)
    }
}

/// Name of a geometry's concrete type, for error messages.
pub(crate) fn geometry_type_name(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
        Geometry::GeometryCollection(_) => "GeometryCollection",
    }
}

/// An in-memory vector layer.
///
/// Feature ids are assigned sequentially by [`Layer::add_feature`] and never
/// reused, so features stay sorted by id.
#[derive(Clone, Debug)]
pub struct Layer {
    name: String,
    crs: Crs,
    kind: GeometryKind,
    schema: Schema,
    features: Vec<Feature>,
    next_id: u64,
    selection: BTreeSet<FeatureId>,
}

impl Layer {
    /// Create an empty layer.
    pub fn new(name: impl Into<String>, crs: Crs, kind: GeometryKind) -> Self {
        Self::with_schema(name, crs, kind, Schema::new())
    }

    /// Create an empty layer with a predefined schema.
    pub fn with_schema(
        name: impl Into<String>,
        crs: Crs,
        kind: GeometryKind,
        schema: Schema,
    ) -> Self {
        Self {
            name: name.into(),
            crs,
            kind,
            schema,
            features: Vec::new(),
            next_id: 0,
            selection: BTreeSet::new(),
        }
    }

    /// Empty layer with the same CRS, geometry family and schema.
    pub fn empty_like(&self, name: impl Into<String>) -> Self {
        Self::with_schema(name, self.crs.clone(), self.kind, self.schema.clone())
    }

    /// Layer name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the layer.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Coordinate reference system.
    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    /// Geometry family.
    pub fn kind(&self) -> GeometryKind {
        self.kind
    }

    /// Attribute schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Returns true if the layer has no features.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Iterate features in insertion order.
    pub fn features(&self) -> impl ExactSizeIterator<Item = &Feature> {
        self.features.iter()
    }

    /// Look up a feature by id.
    pub fn feature(&self, id: FeatureId) -> Option<&Feature> {
        self.position(id).map(|pos| &self.features[pos])
    }

    fn position(&self, id: FeatureId) -> Option<usize> {
        self.features.binary_search_by_key(&id, |f| f.id).ok()
    }

    /// Append a feature.
    ///
    /// The geometry must belong to the layer's family and the attribute tuple
    /// must match the schema (integers widen into real fields).
    pub fn add_feature(
        &mut self,
        geometry: Geometry<f64>,
        attributes: Vec<AttributeValue>,
    ) -> Result<FeatureId, LayerError> {
        match GeometryKind::of(&geometry) {
            Some(kind) if kind == self.kind => {}
            Some(_) => {
                return Err(LayerError::GeometryKindMismatch {
                    layer: self.name.clone(),
                    expected: self.kind,
                    found: geometry_type_name(&geometry).to_string(),
                })
            }
            None => {
                return Err(LayerError::UnsupportedGeometry(
                    geometry_type_name(&geometry).to_string(),
                ))
            }
        }

        if attributes.len() != self.schema.len() {
            return Err(LayerError::AttributeCount {
                expected: self.schema.len(),
                found: attributes.len(),
            });
        }

        let attributes = attributes
            .into_iter()
            .enumerate()
            .map(|(index, value)| self.check_value(index, value))
            .collect::<Result<Vec<_>, _>>()?;

        let id = FeatureId(self.next_id);
        self.next_id += 1;
        self.features.push(Feature {
            id,
            geometry,
            attributes,
        });
        Ok(id)
    }

    /// Append a field; existing features receive `Null`.
    pub fn add_field(&mut self, field: Field) -> Result<usize, LayerError> {
        let index = self.schema.push(field)?;
        for feature in &mut self.features {
            feature.attributes.push(AttributeValue::Null);
        }
        Ok(index)
    }

    /// Index of a field named like `field`, adding it if absent.
    ///
    /// An existing field of another type is an error.
    pub fn ensure_field(&mut self, field: Field) -> Result<usize, LayerError> {
        match self.schema.index_of(field.name()) {
            Some(index) => {
                let existing = self.schema.field(index).map(Field::field_type);
                if existing == Some(field.field_type()) {
                    Ok(index)
                } else {
                    Err(LayerError::TypeMismatch {
                        field: field.name().to_string(),
                        expected: existing.unwrap_or(field.field_type()),
                        found: field.field_type().to_string(),
                    })
                }
            }
            None => self.add_field(field),
        }
    }

    /// Remove a field and its values from every feature.
    pub(crate) fn remove_field(&mut self, name: &str) -> Option<Field> {
        let index = self.schema.index_of(name)?;
        for feature in &mut self.features {
            feature.attributes.remove(index);
        }
        Some(self.schema.remove(index))
    }

    /// Set one attribute value directly (outside an edit session).
    pub fn set_attribute(
        &mut self,
        id: FeatureId,
        field: usize,
        value: AttributeValue,
    ) -> Result<(), LayerError> {
        let value = self.check_value(field, value)?;
        let pos = self.position(id).ok_or(LayerError::UnknownFeature(id))?;
        self.features[pos].attributes[field] = value;
        Ok(())
    }

    /// Validate `value` against the field at `index`.
    pub(crate) fn check_value(
        &self,
        index: usize,
        value: AttributeValue,
    ) -> Result<AttributeValue, LayerError> {
        let field = self
            .schema
            .field(index)
            .ok_or_else(|| LayerError::UnknownField(index.to_string()))?;
        value
            .coerce(field.field_type())
            .map_err(|value| LayerError::TypeMismatch {
                field: field.name().to_string(),
                expected: field.field_type(),
                found: value.type_name().to_string(),
            })
    }

    pub(crate) fn contains(&self, id: FeatureId) -> bool {
        self.position(id).is_some()
    }

    /// Write an already validated value. Unknown ids are ignored.
    pub(crate) fn write_unchecked(&mut self, id: FeatureId, field: usize, value: AttributeValue) {
        if let Some(pos) = self.position(id) {
            if let Some(slot) = self.features[pos].attributes.get_mut(field) {
                *slot = value;
            }
        }
    }

    /// Open an edit session. Edits stay invisible until committed.
    pub fn begin_edit(&mut self) -> EditSession<'_> {
        EditSession::new(self)
    }

    /// Replace the selection with `ids`.
    pub fn select<I>(&mut self, ids: I) -> Result<(), LayerError>
    where
        I: IntoIterator<Item = FeatureId>,
    {
        let mut selection = BTreeSet::new();
        for id in ids {
            if !self.contains(id) {
                return Err(LayerError::UnknownFeature(id));
            }
            selection.insert(id);
        }
        self.selection = selection;
        Ok(())
    }

    /// Clear the selection.
    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Returns true if at least one feature is selected.
    pub fn has_selection(&self) -> bool {
        !self.selection.is_empty()
    }

    /// Selected feature ids, ascending.
    pub fn selected_ids(&self) -> impl Iterator<Item = FeatureId> + '_ {
        self.selection.iter().copied()
    }

    /// Selected features, or every feature when nothing is selected.
    pub fn selected_or_all(&self) -> Vec<&Feature> {
        if self.selection.is_empty() {
            self.features.iter().collect()
        } else {
            self.features
                .iter()
                .filter(|f| self.selection.contains(&f.id))
                .collect()
        }
    }
}
