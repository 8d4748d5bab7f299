//! # Forms
//!
//! A [`Form`] is a converter that is also a parent: it owns keyed children
//! and converts whole subtrees. [`BasicForm<T>`] is the concrete form.
//!
//! ## Deserialization
//!
//! Deserialization fails slow. Every child is visited before anything is
//! reported, so a document with five bad fields yields a five-entry
//! [`FormErrors`]:
//!
//! 1. For each child, in registry order, take its slice of the data.
//! 2. Absent with a default: use a copy of the default object.
//!    Absent, required, no default: record [`DeserializationError::Missing`]
//!    at the child's path. Absent, optional, no default: skip the key.
//! 3. Present: deserialize the child. A report is merged as is; a single
//!    error is recorded at the child's path.
//! 4. If anything failed, return the report. Otherwise pass the assembled
//!    [`Fields`] to the form's [`Deserializer`]; a failure there is reported
//!    at the form's own path.
//!
//! ## Schema
//!
//! [`Converter::schema_fragment`] and the validators are driven by the same
//! child registry and the same [`Parent::required_keys`], so the schema
//! cannot drift from what validation and deserialization accept.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use formless_core::constraint::{has_keys, is_object, not_null};
use formless_core::{
    key_and_label, BuildError, Constraint, ConstraintMap, ConvertError, DeserializationError,
    DisplayInfo, ErrorCollector, FieldPath, FormErrors, Keyed,
};
use serde_json::{json, Map, Value};

use crate::converter::{Converter, Deserializer, Fields, ObjectSerializer, Serializer};
use crate::parent::{Bound, Child, Parent};
use crate::settings::FormSettings;

/// JSON Schema dialect declared by [`Form::data_schema`].
pub const SCHEMA_DIALECT: &str = "http://json-schema.org/draft-07/schema#";

/// A converter that owns keyed children.
pub trait Form<T>: Converter<Object = T> + Parent<T> {
    /// Root schema document: the schema fragment plus the dialect tag.
    fn data_schema(&self) -> Value {
        let mut schema = self.schema_fragment();
        if let Value::Object(map) = &mut schema {
            map.insert("$schema".to_string(), Value::String(SCHEMA_DIALECT.to_string()));
        }
        schema
    }
}

/// Data constraints every [`BasicForm`] carries.
fn default_data_constraints() -> Vec<Constraint<Value>> {
    vec![is_object()]
}

/// Composite node converting a JSON object to and from a `T`.
///
/// Built once with [`BasicForm::builder`]; immutable afterwards.
pub struct BasicForm<T> {
    key: String,
    label: String,
    description: Option<String>,
    required: bool,
    serializer: Box<dyn Serializer>,
    deserializer: Box<dyn Deserializer<T>>,
    children: Vec<Box<dyn Child<T>>>,
    default: Option<T>,
    default_data: Option<Value>,
    data_constraint: Constraint<Value>,
    object_constraint: Constraint<T>,
    display_info: DisplayInfo,
}

impl<T> BasicForm<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Start building a form. `assemble` builds a `T` from the
    /// deserialized children.
    pub fn builder<F>(key: impl Into<String>, assemble: F) -> BasicFormBuilder<T>
    where
        F: Fn(Fields) -> Result<T, DeserializationError> + Send + Sync + 'static,
    {
        Self::builder_with(key, assemble)
    }

    /// Start building a form with a [`Deserializer`] strategy value.
    pub fn builder_with<D>(key: impl Into<String>, deserializer: D) -> BasicFormBuilder<T>
    where
        D: Deserializer<T> + 'static,
    {
        BasicFormBuilder {
            key: key.into(),
            label: None,
            description: None,
            collapsable: false,
            collapsed: false,
            required: true,
            default: None,
            extra_data_constraints: Vec::new(),
            extra_object_constraints: Vec::new(),
            serializer: None,
            deserializer: Box::new(deserializer),
            children: Vec::new(),
        }
    }

    /// The data constraint assembled at build time.
    pub fn data_constraint(&self) -> &Constraint<Value> {
        &self.data_constraint
    }

    /// The object constraint assembled at build time.
    pub fn object_constraint(&self) -> &Constraint<T> {
        &self.object_constraint
    }

    /// Presentation metadata for this node alone.
    pub fn display_info(&self) -> &DisplayInfo {
        &self.display_info
    }

    /// Deserialize a root document, reporting every failure as a report.
    ///
    /// # Errors
    ///
    /// Returns the aggregated [`FormErrors`] for the whole document.
    pub fn deserialize_root(&self, data: &Value) -> Result<T, FormErrors> {
        let root = FieldPath::root();
        self.deserialize(data, &root)
            .map_err(|error| error.into_report(&root))
    }
}

impl<T> Keyed for BasicForm<T> {
    fn key(&self) -> &str {
        &self.key
    }

    fn label(&self) -> &str {
        &self.label
    }
}

impl<T> Parent<T> for BasicForm<T> {
    fn children(&self) -> &[Box<dyn Child<T>>] {
        &self.children
    }
}

impl<T> Converter for BasicForm<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Object = T;

    fn serialize(&self, obj: &T) -> Value {
        let mut data = Map::new();
        for child in &self.children {
            data.insert(child.key().to_string(), child.serialize_from(obj));
        }
        self.serializer.serialize(data)
    }

    fn deserialize(&self, data: &Value, path: &FieldPath) -> Result<T, ConvertError> {
        if !data.is_object() {
            return Err(FormErrors::single(
                path.clone(),
                DeserializationError::type_mismatch("object", data),
            )
            .into());
        }

        let mut fields = Fields::new();
        let mut errors = ErrorCollector::new();

        for (child, sub_data) in self.converter_to_sub_data(data) {
            let child_path = path.child(child.key());
            match sub_data {
                None => {
                    if let Some(default) = child.default_boxed() {
                        tracing::trace!(form = %self.key, child = child.key(), "using default");
                        fields.insert(child.key(), default);
                    } else if child.required() {
                        errors.record(child_path, DeserializationError::Missing);
                    }
                }
                Some(sub_data) => match child.deserialize_boxed(sub_data, &child_path) {
                    Ok(value) => fields.insert(child.key(), value),
                    Err(error) => errors.absorb(error, &child_path),
                },
            }
        }

        if let Err(report) = errors.finish() {
            tracing::debug!(
                form = %self.key,
                path = %path,
                errors = report.len(),
                "form deserialization failed"
            );
            return Err(report.into());
        }

        self.deserializer
            .deserialize(fields)
            .map_err(|error| FormErrors::single(path.clone(), error).into())
    }

    fn validate_data(&self, data: &Value) -> ConstraintMap {
        let mut children = BTreeMap::new();
        for (child, sub_data) in self.converter_to_sub_data(data) {
            if let Some(sub_data) = sub_data {
                children.insert(child.key().to_string(), child.validate_data(sub_data));
            }
        }
        ConstraintMap::new(self.data_constraint.evaluate(data))
            & ConstraintMap::with_children(children)
    }

    fn validate_object(&self, obj: &T) -> ConstraintMap {
        let children = self
            .children
            .iter()
            .map(|child| (child.key().to_string(), child.validate_from(obj)))
            .collect();
        ConstraintMap::new(self.object_constraint.evaluate(obj))
            & ConstraintMap::with_children(children)
    }

    fn default_object(&self) -> Option<&T> {
        self.default.as_ref()
    }

    fn default_data(&self) -> Option<&Value> {
        self.default_data.as_ref()
    }

    fn required(&self) -> bool {
        self.required
    }

    fn schema_fragment(&self) -> Value {
        let properties: Map<String, Value> = self
            .children
            .iter()
            .map(|child| (child.key().to_string(), child.schema_fragment()))
            .collect();

        let mut schema = json!({
            "type": "object",
            "properties": properties,
            "required": self.required_keys(),
            "unevaluatedProperties": false,
        });
        if let Value::Object(map) = &mut schema {
            map.insert("title".to_string(), Value::String(self.label.clone()));
            if let Some(description) = &self.description {
                map.insert("description".to_string(), Value::String(description.clone()));
            }
            if let Some(default) = &self.default_data {
                map.insert("default".to_string(), default.clone());
            }
        }
        schema
    }

    fn display(&self) -> Value {
        let mut display = self.display_info.as_map().clone();
        let contents = self.children.iter().map(|child| child.display()).collect();
        display.insert("contents".to_string(), Value::Array(contents));
        Value::Object(display)
    }
}

impl<T> Form<T> for BasicForm<T> where T: Clone + Send + Sync + 'static {}

impl<T> fmt::Debug for BasicForm<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let children: Vec<&str> = self.children.iter().map(|child| child.key()).collect();
        f.debug_struct("BasicForm")
            .field("key", &self.key)
            .field("required", &self.required)
            .field("children", &children)
            .field("data_constraint", &self.data_constraint)
            .finish_non_exhaustive()
    }
}

/// Configuration phase of a [`BasicForm`].
pub struct BasicFormBuilder<T> {
    key: String,
    label: Option<String>,
    description: Option<String>,
    collapsable: bool,
    collapsed: bool,
    required: bool,
    default: Option<T>,
    extra_data_constraints: Vec<Constraint<Value>>,
    extra_object_constraints: Vec<Constraint<T>>,
    serializer: Option<Box<dyn Serializer>>,
    deserializer: Box<dyn Deserializer<T>>,
    children: Vec<Box<dyn Child<T>>>,
}

impl<T> BasicFormBuilder<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Display name; derived from the key when not set.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Longer explanation shown to users and emitted in the schema.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Whether renderers may collapse this form.
    pub fn collapsable(mut self, collapsable: bool) -> Self {
        self.collapsable = collapsable;
        self
    }

    /// Whether renderers start with this form collapsed.
    pub fn collapsed(mut self, collapsed: bool) -> Self {
        self.collapsed = collapsed;
        self
    }

    /// Whether a parent's data must contain this form's key. Defaults to true.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Shorthand for `required(false)`.
    pub fn optional(self) -> Self {
        self.required(false)
    }

    /// Object used when this form's key is absent from a parent's data.
    pub fn default(mut self, default: T) -> Self {
        self.default = Some(default);
        self
    }

    /// Additional constraint on the data.
    pub fn data_constraint(mut self, constraint: Constraint<Value>) -> Self {
        self.extra_data_constraints.push(constraint);
        self
    }

    /// Additional constraint on the object.
    pub fn object_constraint(mut self, constraint: Constraint<T>) -> Self {
        self.extra_object_constraints.push(constraint);
        self
    }

    /// Replace the identity [`ObjectSerializer`].
    pub fn serializer<S>(mut self, serializer: S) -> Self
    where
        S: Serializer + 'static,
    {
        self.serializer = Some(Box::new(serializer));
        self
    }

    /// Apply loaded settings over the current configuration.
    pub fn settings(mut self, settings: &FormSettings) -> Self {
        if let Some(label) = &settings.label {
            self.label = Some(label.clone());
        }
        if let Some(description) = &settings.description {
            self.description = Some(description.clone());
        }
        self.required = settings.required;
        self.collapsable = settings.collapsable;
        self.collapsed = settings.collapsed;
        self
    }

    /// Add a child. `access` extracts the child's object from a `T`.
    pub fn child<C, F>(mut self, converter: C, access: F) -> Self
    where
        C: Converter + 'static,
        F: Fn(&T) -> &C::Object + Send + Sync + 'static,
    {
        self.children.push(Box::new(Bound::new(converter, access)));
        self
    }

    /// Freeze the configuration into a form.
    ///
    /// # Errors
    ///
    /// - [`BuildError::EmptyKey`] if neither key nor label is usable.
    /// - [`BuildError::DuplicateKey`] if two children share a key.
    /// - [`BuildError::RequiredWithDefault`] if a required child has a default.
    /// - [`BuildError::InvalidDefault`] if the default violates the object
    ///   constraint.
    pub fn build(self) -> Result<BasicForm<T>, BuildError> {
        let (key, label) = key_and_label(Some(&self.key), self.label.as_deref())?;

        let mut seen = HashSet::new();
        for child in &self.children {
            if !seen.insert(child.key()) {
                return Err(BuildError::DuplicateKey {
                    form: key,
                    key: child.key().to_string(),
                });
            }
            if child.required() && child.has_default() {
                return Err(BuildError::RequiredWithDefault {
                    form: key,
                    key: child.key().to_string(),
                });
            }
        }

        let required_keys: Vec<String> = self
            .children
            .iter()
            .filter(|child| child.required())
            .map(|child| child.key().to_string())
            .collect();

        let mut data_constraint = Constraint::always();
        data_constraint &= Constraint::all(
            default_data_constraints()
                .into_iter()
                .chain(self.extra_data_constraints)
                .chain([has_keys(required_keys.iter().cloned())]),
        );
        data_constraint &= not_null();

        let mut object_constraint = Constraint::always();
        object_constraint &= Constraint::all(self.extra_object_constraints);

        let display_info = DisplayInfo::from_entries([
            ("type", json!("form")),
            ("label", json!(label)),
            ("description", json!(self.description)),
            ("collapsable", json!(self.collapsable)),
            ("collapsed", json!(self.collapsed)),
        ]);

        let mut form = BasicForm {
            key,
            label,
            description: self.description,
            required: self.required,
            serializer: self
                .serializer
                .unwrap_or_else(|| Box::new(ObjectSerializer)),
            deserializer: self.deserializer,
            children: self.children,
            default: None,
            default_data: None,
            data_constraint,
            object_constraint,
            display_info,
        };

        if let Some(default) = self.default {
            let evaluation = form.object_constraint.evaluate(&default);
            if !evaluation.is_satisfied() {
                return Err(BuildError::InvalidDefault {
                    key: form.key,
                    reason: evaluation.violations().join("; "),
                });
            }
            form.default_data = Some(form.serialize(&default));
            form.default = Some(default);
        }

        tracing::debug!(
            form = %form.key,
            children = form.children.len(),
            required = ?required_keys,
            "form built"
        );
        Ok(form)
    }
}
