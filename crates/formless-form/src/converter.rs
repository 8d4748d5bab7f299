//! # Converters
//!
//! The [`Converter`] capability: bidirectional mapping between JSON data
//! (`serde_json::Value`) and a typed object, plus validation of both sides
//! and a JSON Schema fragment describing the accepted data.
//!
//! Composite converters finish their work through two strategy traits:
//!
//! - [`Serializer`] turns the map of serialized children into the node's
//!   data. [`ObjectSerializer`] is the identity.
//! - [`Deserializer`] turns the [`Fields`] bag of deserialized children into
//!   the node's object.
//!
//! Both are implemented for plain closures.

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;

use formless_core::{ConstraintMap, ConvertError, DeserializationError, FieldPath, Keyed};
use serde_json::{Map, Value};

/// Serialize/deserialize capability, with validation and schema.
///
/// Every operation is read-only; a converter is built once and shared.
pub trait Converter: Keyed + Send + Sync {
    /// The typed object this converter produces and consumes.
    type Object: Clone + Send + Sync + 'static;

    /// Object to data. Total over valid objects.
    fn serialize(&self, obj: &Self::Object) -> Value;

    /// Data to object. `path` locates `data` in the root document and is
    /// used to qualify any errors this converter reports.
    fn deserialize(&self, data: &Value, path: &FieldPath) -> Result<Self::Object, ConvertError>;

    /// Evaluate data constraints for this node and its descendants.
    fn validate_data(&self, data: &Value) -> ConstraintMap;

    /// Evaluate object constraints for this node and its descendants.
    fn validate_object(&self, obj: &Self::Object) -> ConstraintMap;

    /// Object used when the key is absent from the parent's data.
    fn default_object(&self) -> Option<&Self::Object>;

    /// Cached serialization of [`Converter::default_object`].
    fn default_data(&self) -> Option<&Value>;

    /// Whether the parent's data must contain this node's key.
    fn required(&self) -> bool;

    /// Whether `null` is accepted on both sides.
    fn nullable(&self) -> bool {
        false
    }

    /// JSON Schema fragment for the data this node accepts.
    fn schema_fragment(&self) -> Value;

    /// Display document for renderers.
    fn display(&self) -> Value;
}

/// Final step of serialization: children's data to the node's data.
pub trait Serializer: Send + Sync {
    /// Build the node's data from its children's data, keyed by child key.
    fn serialize(&self, data: Map<String, Value>) -> Value;
}

/// Identity serializer: the children's map becomes a JSON object.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectSerializer;

impl Serializer for ObjectSerializer {
    fn serialize(&self, data: Map<String, Value>) -> Value {
        Value::Object(data)
    }
}

impl<F> Serializer for F
where
    F: Fn(Map<String, Value>) -> Value + Send + Sync,
{
    fn serialize(&self, data: Map<String, Value>) -> Value {
        self(data)
    }
}

/// Final step of deserialization: children's objects to the node's object.
pub trait Deserializer<T>: Send + Sync {
    /// Assemble the node's object. A failure here concerns the node as a
    /// whole (e.g. an invariant across several fields).
    fn deserialize(&self, fields: Fields) -> Result<T, DeserializationError>;
}

impl<T, F> Deserializer<T> for F
where
    F: Fn(Fields) -> Result<T, DeserializationError> + Send + Sync,
{
    fn deserialize(&self, fields: Fields) -> Result<T, DeserializationError> {
        self(fields)
    }
}

/// Deserialized children of one form, keyed by child key.
///
/// Each value has the `Object` type of the child that produced it. Keys of
/// optional children without defaults are absent when their data was.
#[derive(Default)]
pub struct Fields {
    values: HashMap<String, Box<dyn Any + Send>>,
}

impl Fields {
    /// An empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, key: &str, value: Box<dyn Any + Send>) {
        self.values.insert(key.to_string(), value);
    }

    /// Returns true if a value is present under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Number of values present.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no value is present.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Borrow the value under `key` as a `U`.
    pub fn get<U: 'static>(&self, key: &str) -> Option<&U> {
        self.values.get(key).and_then(|value| value.downcast_ref::<U>())
    }

    /// Remove and return the value under `key`.
    ///
    /// # Errors
    ///
    /// Fails if the key is absent or holds a type other than `U`.
    pub fn take<U: 'static>(&mut self, key: &str) -> Result<U, DeserializationError> {
        self.take_optional(key)?
            .ok_or_else(|| DeserializationError::invalid(format!("missing value for '{key}'")))
    }

    /// Remove and return the value under `key`, `None` if absent.
    ///
    /// # Errors
    ///
    /// Fails if the key holds a type other than `U`.
    pub fn take_optional<U: 'static>(
        &mut self,
        key: &str,
    ) -> Result<Option<U>, DeserializationError> {
        let Some(value) = self.values.remove(key) else {
            return Ok(None);
        };
        value.downcast::<U>().map(|value| Some(*value)).map_err(|_| {
            DeserializationError::invalid(format!(
                "value for '{key}' is not a {}",
                type_name::<U>()
            ))
        })
    }
}

impl fmt::Debug for Fields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.values.keys().collect();
        keys.sort();
        f.debug_struct("Fields").field("keys", &keys).finish()
    }
}
