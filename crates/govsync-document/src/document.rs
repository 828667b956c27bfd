//! Whole-entity documents.

use govsync_pointer::{format_pointer, Path};

use crate::error::DocumentError;
use crate::kind::EntityKind;
use crate::shape::Shape;
use crate::value::{Fields, Value};

/// One entity's full server-side representation, tagged with its kind.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalDocument {
    kind: EntityKind,
    fields: Fields,
}

impl CanonicalDocument {
    pub fn new(kind: EntityKind, fields: Fields) -> Self {
        Self { kind, fields }
    }

    pub fn empty(kind: EntityKind) -> Self {
        Self::new(kind, Fields::new())
    }

    /// Parses a JSON object, using `shape` to tell sets from lists.
    pub fn from_json(
        kind: EntityKind,
        json: &serde_json::Value,
        shape: &Shape,
    ) -> Result<Self, DocumentError> {
        match Value::from_json_shaped(json, shape, &mut Vec::new()) {
            Value::Object(fields) => Ok(Self { kind, fields }),
            other => Err(DocumentError::NotAnObject {
                kind,
                found: other.type_name(),
            }),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        self.as_value().to_json()
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// The document as an object value rooted at `""`.
    pub fn as_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    /// The server-assigned identifier, if the document carries one.
    pub fn id(&self) -> Option<&str> {
        self.fields.get("id").and_then(Value::as_str)
    }

    pub fn same_shape(&self, other: &CanonicalDocument) -> bool {
        self.kind == other.kind
    }

    /// Looks up the value at `path`. The root path is not addressable as a
    /// field and yields `None`.
    pub fn get(&self, path: &[String]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        let mut current = self.fields.get(first)?;
        for step in rest {
            current = current.get(step)?;
        }
        Some(current)
    }

    pub fn get_mut(&mut self, path: &[String]) -> Option<&mut Value> {
        let (first, rest) = path.split_first()?;
        let mut current = self.fields.get_mut(first)?;
        for step in rest {
            current = current.get_mut(step)?;
        }
        Some(current)
    }

    /// Overwrites the value at an existing `path`.
    pub fn replace(&mut self, path: &[String], value: Value) -> Result<Value, DocumentError> {
        let slot = self.get_mut(path).ok_or_else(|| DocumentError::NotFound {
            path: format_pointer(path),
        })?;
        Ok(std::mem::replace(slot, value))
    }

    /// Inserts or overwrites a top-level field.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(key.into(), value)
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value.into());
        self
    }

    /// Every path present in the document, parents before children.
    pub fn paths(&self) -> Vec<Path> {
        let mut out = Vec::new();
        for (key, value) in &self.fields {
            value.walk(&[key.clone()], &mut |path, _| out.push(path.to_vec()));
        }
        out
    }
}
