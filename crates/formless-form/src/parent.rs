//! # Parents and Children
//!
//! A [`Parent`] owns an ordered, key-addressed set of children. Children are
//! heterogeneous converters, so each is stored behind the object-safe
//! [`Child<P>`] view, where `P` is the parent's object type.
//!
//! A child is bound to its parent together with an accessor that extracts
//! the child's sub-object from a parent object. The accessor is how a form
//! reaches into an arbitrary object shape (a struct field, an entry in a
//! map) without knowing that shape itself. Extraction on the object side
//! always succeeds; on the data side a child's key may be absent.

use std::any::Any;
use std::marker::PhantomData;

use formless_core::{ConstraintMap, ConvertError, FieldPath, Keyed};
use serde_json::Value;

use crate::converter::Converter;

/// Object-safe view of a converter bound into a parent with objects of
/// type `P`.
pub trait Child<P>: Keyed + Send + Sync {
    /// Whether the parent's data must contain this child's key.
    fn required(&self) -> bool;

    /// Whether a default object is configured.
    fn has_default(&self) -> bool;

    /// A fresh copy of the default object, type-erased.
    fn default_boxed(&self) -> Option<Box<dyn Any + Send>>;

    /// Deserialize this child's slice of the parent's data, type-erased.
    fn deserialize_boxed(
        &self,
        data: &Value,
        path: &FieldPath,
    ) -> Result<Box<dyn Any + Send>, ConvertError>;

    /// Extract the sub-object from `parent`, type-erased.
    fn sub_object<'a>(&self, parent: &'a P) -> &'a dyn Any;

    /// Extract the sub-object from `parent` and serialize it.
    fn serialize_from(&self, parent: &P) -> Value;

    /// Validate this child's slice of the parent's data.
    fn validate_data(&self, data: &Value) -> ConstraintMap;

    /// Extract the sub-object from `parent` and validate it.
    fn validate_from(&self, parent: &P) -> ConstraintMap;

    /// The child's schema fragment.
    fn schema_fragment(&self) -> Value;

    /// The child's display document.
    fn display(&self) -> Value;
}

/// A converter plus the accessor locating its object inside a parent.
pub(crate) struct Bound<P, C, F> {
    converter: C,
    access: F,
    parent: PhantomData<fn(&P)>,
}

impl<P, C, F> Bound<P, C, F>
where
    C: Converter,
    F: Fn(&P) -> &C::Object + Send + Sync,
{
    pub(crate) fn new(converter: C, access: F) -> Self {
        Self {
            converter,
            access,
            parent: PhantomData,
        }
    }
}

impl<P, C, F> Keyed for Bound<P, C, F>
where
    C: Converter,
{
    fn key(&self) -> &str {
        self.converter.key()
    }

    fn label(&self) -> &str {
        self.converter.label()
    }
}

impl<P, C, F> Child<P> for Bound<P, C, F>
where
    C: Converter,
    F: Fn(&P) -> &C::Object + Send + Sync,
{
    fn required(&self) -> bool {
        self.converter.required()
    }

    fn has_default(&self) -> bool {
        self.converter.default_object().is_some()
    }

    fn default_boxed(&self) -> Option<Box<dyn Any + Send>> {
        self.converter
            .default_object()
            .map(|obj| Box::new(obj.clone()) as Box<dyn Any + Send>)
    }

    fn deserialize_boxed(
        &self,
        data: &Value,
        path: &FieldPath,
    ) -> Result<Box<dyn Any + Send>, ConvertError> {
        let obj = self.converter.deserialize(data, path)?;
        Ok(Box::new(obj))
    }

    fn sub_object<'a>(&self, parent: &'a P) -> &'a dyn Any {
        (self.access)(parent)
    }

    fn serialize_from(&self, parent: &P) -> Value {
        self.converter.serialize((self.access)(parent))
    }

    fn validate_data(&self, data: &Value) -> ConstraintMap {
        self.converter.validate_data(data)
    }

    fn validate_from(&self, parent: &P) -> ConstraintMap {
        self.converter.validate_object((self.access)(parent))
    }

    fn schema_fragment(&self) -> Value {
        self.converter.schema_fragment()
    }

    fn display(&self) -> Value {
        self.converter.display()
    }
}

/// Capability of owning keyed children.
pub trait Parent<P> {
    /// Children in registry order.
    fn children(&self) -> &[Box<dyn Child<P>>];

    /// The child registered under `key`.
    fn child(&self, key: &str) -> Option<&dyn Child<P>> {
        self.children()
            .iter()
            .find(|child| child.key() == key)
            .map(|child| &**child)
    }

    /// Keys of required children, in registry order.
    fn required_keys(&self) -> Vec<String> {
        self.children()
            .iter()
            .filter(|child| child.required())
            .map(|child| child.key().to_string())
            .collect()
    }

    /// Pair each child with its slice of `data`. The slice is `None` when
    /// the key is absent or `data` is not an object.
    fn converter_to_sub_data<'a>(
        &'a self,
        data: &'a Value,
    ) -> Vec<(&'a dyn Child<P>, Option<&'a Value>)> {
        let map = data.as_object();
        self.children()
            .iter()
            .map(|child| {
                let sub = map.and_then(|map| map.get(child.key()));
                (&**child, sub)
            })
            .collect()
    }

    /// Pair each child with its sub-object of `obj`. Extraction always
    /// succeeds; callers downcast to the child's object type.
    fn converter_to_sub_object<'a>(&'a self, obj: &'a P) -> Vec<(&'a dyn Child<P>, &'a dyn Any)> {
        self.children()
            .iter()
            .map(|child| (&**child, child.sub_object(obj)))
            .collect()
    }
}
