//! Layer schema: an ordered list of named, typed fields.

use std::fmt;

use super::LayerError;

/// Attribute field type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldType {
    Boolean,
    Integer,
    Real,
    Text,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Real => "real",
            Self::Text => "text",
        };
        f.write_str(label)
    }
}

/// A named, typed attribute field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    name: String,
    field_type: FieldType,
}

impl Field {
    /// Create a field.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }

    /// Boolean field.
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Boolean)
    }

    /// Integer field.
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Integer)
    }

    /// Real field.
    pub fn real(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Real)
    }

    /// Text field.
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Text)
    }

    /// Field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field type.
    pub fn field_type(&self) -> FieldType {
        self.field_type
    }
}

/// Ordered set of fields with unique names.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    /// Empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the schema has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate fields in order.
    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    /// Field at `index`.
    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    /// Position of the field called `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Append a field, rejecting duplicate names.
    pub(crate) fn push(&mut self, field: Field) -> Result<usize, LayerError> {
        if self.index_of(&field.name).is_some() {
            return Err(LayerError::DuplicateField(field.name));
        }
        self.fields.push(field);
        Ok(self.fields.len() - 1)
    }

    /// Remove the field at `index`.
    pub(crate) fn remove(&mut self, index: usize) -> Field {
        self.fields.remove(index)
    }
}

impl FromIterator<Field> for Schema {
    /// Builds a schema, keeping the first field of any duplicated name.
    fn from_iter<I: IntoIterator<Item = Field>>(iter: I) -> Self {
        let mut schema = Schema::new();
        for field in iter {
            let _ = schema.push(field);
        }
        schema
    }
}
