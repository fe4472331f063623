//! Features and attribute values.

use geo::Geometry;
use std::fmt;

use super::FieldType;

/// Identifier of a feature, stable within its layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FeatureId(pub u64);

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single attribute value.
#[derive(Clone, Debug, PartialEq)]
pub enum AttributeValue {
    /// Missing value; allowed in every field.
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Text(String),
}

impl AttributeValue {
    /// Field type this value naturally belongs to (`None` for `Null`).
    pub fn field_type(&self) -> Option<FieldType> {
        match self {
            Self::Null => None,
            Self::Boolean(_) => Some(FieldType::Boolean),
            Self::Integer(_) => Some(FieldType::Integer),
            Self::Real(_) => Some(FieldType::Real),
            Self::Text(_) => Some(FieldType::Text),
        }
    }

    /// Coerce the value into a field of type `target`.
    ///
    /// `Null` fits anywhere and integers widen to reals; everything else must
    /// match exactly.
    pub(crate) fn coerce(self, target: FieldType) -> Result<Self, Self> {
        match (self, target) {
            (Self::Null, _) => Ok(Self::Null),
            (Self::Integer(v), FieldType::Real) => Ok(Self::Real(v as f64)),
            (value, target) if value.field_type() == Some(target) => Ok(value),
            (value, _) => Err(value),
        }
    }

    /// Returns the boolean payload, if any.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the integer payload, if any.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Short type label used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Real(_) => "real",
            Self::Text(_) => "text",
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// One geometry plus its attribute tuple.
#[derive(Clone, Debug, PartialEq)]
pub struct Feature {
    pub(crate) id: FeatureId,
    pub(crate) geometry: Geometry<f64>,
    pub(crate) attributes: Vec<AttributeValue>,
}

impl Feature {
    /// Feature identifier.
    pub fn id(&self) -> FeatureId {
        self.id
    }

    /// Feature geometry.
    pub fn geometry(&self) -> &Geometry<f64> {
        &self.geometry
    }

    /// Attribute tuple, indexed like the layer's schema.
    pub fn attributes(&self) -> &[AttributeValue] {
        &self.attributes
    }

    /// Attribute at `index`.
    pub fn attribute(&self, index: usize) -> Option<&AttributeValue> {
        self.attributes.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_integer_widens_to_real() {
        assert_eq!(
            AttributeValue::Integer(3).coerce(FieldType::Real),
            Ok(AttributeValue::Real(3.0))
        );
    }

    #[test]
    fn test_coerce_null_fits_any_field() {
        for ty in [FieldType::Boolean, FieldType::Integer, FieldType::Real, FieldType::Text] {
            assert_eq!(AttributeValue::Null.coerce(ty), Ok(AttributeValue::Null));
        }
    }

    #[test]
    fn test_coerce_rejects_mismatch() {
        let result = AttributeValue::Text("yes".into()).coerce(FieldType::Boolean);
        assert_eq!(result, Err(AttributeValue::Text("yes".into())));
    }

    #[test]
    fn test_accessors() {
        assert_eq!(AttributeValue::from(true).as_bool(), Some(true));
        assert_eq!(AttributeValue::from(7i64).as_i64(), Some(7));
        assert_eq!(AttributeValue::from("a").as_bool(), None);
        assert_eq!(FeatureId(3).to_string(), "#3");
    }
}
