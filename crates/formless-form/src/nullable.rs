//! # Nullable Converters
//!
//! [`Nullable<C>`] accepts `null` in addition to whatever `C` accepts. On
//! the object side the type becomes `Option<C::Object>`, with `None` as the
//! null object. Both constraints become `is_null OR <inner constraint>`:
//! a null value satisfies the node without visiting the inner converter.
//!
//! Converters that are not wrapped reject `null` data through their own
//! `not_null` constraint; on the object side a non-`Option` type cannot hold
//! a null at all.

use std::fmt;

use formless_core::constraint::is_null;
use formless_core::{Constraint, ConstraintMap, ConvertError, Evaluation, FieldPath, Keyed};
use serde_json::{json, Value};

use crate::converter::Converter;

/// `C`, or `null`.
pub struct Nullable<C: Converter> {
    inner: C,
    default: Option<Option<C::Object>>,
    default_data: Option<Value>,
    null_data: Constraint<Value>,
    null_object: Constraint<Option<C::Object>>,
}

impl<C: Converter> Nullable<C> {
    /// Wrap `inner`, keeping its default (if any).
    pub fn new(inner: C) -> Self {
        let default = inner.default_object().cloned().map(Some);
        let default_data = inner.default_data().cloned();
        Self {
            inner,
            default,
            default_data,
            null_data: is_null(),
            null_object: Constraint::new("must be null", Option::is_none),
        }
    }

    /// Use `null` as the default instead of the inner converter's default.
    pub fn default_null(mut self) -> Self {
        self.default = Some(None);
        self.default_data = Some(Value::Null);
        self
    }

    /// The wrapped converter.
    pub fn inner(&self) -> &C {
        &self.inner
    }
}

impl<C: Converter> Keyed for Nullable<C> {
    fn key(&self) -> &str {
        self.inner.key()
    }

    fn label(&self) -> &str {
        self.inner.label()
    }
}

impl<C: Converter> Converter for Nullable<C> {
    type Object = Option<C::Object>;

    fn serialize(&self, obj: &Self::Object) -> Value {
        match obj {
            Some(obj) => self.inner.serialize(obj),
            None => Value::Null,
        }
    }

    fn deserialize(&self, data: &Value, path: &FieldPath) -> Result<Self::Object, ConvertError> {
        if self.null_data.check(data) {
            return Ok(None);
        }
        self.inner.deserialize(data, path).map(Some)
    }

    fn validate_data(&self, data: &Value) -> ConstraintMap {
        if self.null_data.check(data) {
            return ConstraintMap::new(Evaluation::pass());
        }
        self.inner.validate_data(data)
    }

    fn validate_object(&self, obj: &Self::Object) -> ConstraintMap {
        match obj {
            Some(inner) => self.inner.validate_object(inner),
            None => ConstraintMap::new(self.null_object.evaluate(obj)),
        }
    }

    fn default_object(&self) -> Option<&Self::Object> {
        self.default.as_ref()
    }

    fn default_data(&self) -> Option<&Value> {
        self.default_data.as_ref()
    }

    fn required(&self) -> bool {
        self.inner.required()
    }

    fn nullable(&self) -> bool {
        true
    }

    fn schema_fragment(&self) -> Value {
        let inner = self.inner.schema_fragment();
        let widened = match inner.get("type") {
            Some(Value::String(name)) => Some(json!([name, "null"])),
            Some(Value::Array(names)) => {
                let mut names = names.clone();
                if !names.iter().any(|name| name == "null") {
                    names.push(json!("null"));
                }
                Some(Value::Array(names))
            }
            _ => None,
        };
        let mut schema = match widened {
            Some(widened) => {
                let mut schema = inner;
                if let Value::Object(map) = &mut schema {
                    map.insert("type".to_string(), widened);
                }
                schema
            }
            None => json!({"anyOf": [{"type": "null"}, inner]}),
        };
        if let (Value::Object(map), Some(default)) = (&mut schema, &self.default_data) {
            map.insert("default".to_string(), default.clone());
        }
        schema
    }

    fn display(&self) -> Value {
        let mut display = self.inner.display();
        if let Value::Object(map) = &mut display {
            map.insert("nullable".to_string(), Value::Bool(true));
        }
        display
    }
}

impl<C: Converter + fmt::Debug> fmt::Debug for Nullable<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Nullable")
            .field("inner", &self.inner)
            .field("has_default", &self.default.is_some())
            .finish()
    }
}
