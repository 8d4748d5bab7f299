//! # Fields
//!
//! [`BasicField<T>`] is the generic leaf converter: a JSON primitive on the
//! data side, a `T` on the object side, and a pair of conversion functions.
//! Stock constructors cover the JSON primitives and ISO-8601 dates; anything
//! else goes through [`BasicField::custom`].
//!
//! Deserialization checks, in order: the JSON type (via the conversion
//! function), extra data constraints, extra object constraints. The first
//! stage that fails is reported as a single [`DeserializationError`].

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use formless_core::constraint::{json_type, not_null};
use formless_core::{
    key_and_label, BuildError, Constraint, ConstraintMap, ConvertError, DeserializationError,
    DisplayInfo, FieldPath, Keyed,
};
use serde_json::{json, Map, Value};

use crate::converter::Converter;

type ToData<T> = Arc<dyn Fn(&T) -> Value + Send + Sync>;
type FromData<T> = Arc<dyn Fn(&Value) -> Result<T, DeserializationError> + Send + Sync>;

const DATE_FORMAT: &str = "%Y-%m-%d";
const I64_RANGE: &str = "must be between -9223372036854775808 and 9223372036854775807";

/// Leaf converter between a JSON primitive and a `T`.
pub struct BasicField<T> {
    key: String,
    label: String,
    description: Option<String>,
    kind: &'static str,
    json_type: &'static str,
    schema_extra: Map<String, Value>,
    required: bool,
    default: Option<T>,
    default_data: Option<Value>,
    data_constraint: Constraint<Value>,
    object_constraint: Constraint<T>,
    to_data: ToData<T>,
    from_data: FromData<T>,
}

impl BasicField<String> {
    /// A JSON string.
    pub fn text(key: impl Into<String>) -> FieldBuilder<String> {
        FieldBuilder::new(
            key,
            "text",
            "string",
            |s: &String| Value::String(s.clone()),
            |data: &Value| {
                data.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| DeserializationError::type_mismatch("string", data))
            },
        )
    }
}

impl BasicField<i64> {
    /// A JSON integer that fits in an `i64`.
    ///
    /// Integers outside the `i64` range fail the data constraint and the
    /// schema's `minimum`/`maximum`, as well as deserialization.
    pub fn integer(key: impl Into<String>) -> FieldBuilder<i64> {
        FieldBuilder::new(
            key,
            "integer",
            "integer",
            |n: &i64| Value::from(*n),
            |data: &Value| match data.as_i64() {
                Some(n) => Ok(n),
                None if data.is_u64() => {
                    Err(DeserializationError::Constraint(I64_RANGE.to_string()))
                }
                None => Err(DeserializationError::type_mismatch("integer", data)),
            },
        )
        .data_constraint(Constraint::new(I64_RANGE, |data: &Value| {
            !data.is_u64() || data.is_i64()
        }))
        .schema_keyword("minimum", json!(i64::MIN))
        .schema_keyword("maximum", json!(i64::MAX))
    }
}

impl BasicField<f64> {
    /// A JSON number.
    pub fn number(key: impl Into<String>) -> FieldBuilder<f64> {
        FieldBuilder::new(
            key,
            "number",
            "number",
            |n: &f64| Value::from(*n),
            |data: &Value| {
                data.as_f64()
                    .ok_or_else(|| DeserializationError::type_mismatch("number", data))
            },
        )
        // JSON has no encoding for NaN or the infinities.
        .object_constraint(Constraint::new("must be finite", |n: &f64| n.is_finite()))
    }
}

impl BasicField<bool> {
    /// A JSON boolean.
    pub fn boolean(key: impl Into<String>) -> FieldBuilder<bool> {
        FieldBuilder::new(
            key,
            "checkbox",
            "boolean",
            |b: &bool| Value::Bool(*b),
            |data: &Value| {
                data.as_bool()
                    .ok_or_else(|| DeserializationError::type_mismatch("boolean", data))
            },
        )
    }
}

impl BasicField<NaiveDate> {
    /// A calendar date carried as a `YYYY-MM-DD` string.
    pub fn date(key: impl Into<String>) -> FieldBuilder<NaiveDate> {
        let mut builder = FieldBuilder::new(
            key,
            "date",
            "string",
            |date: &NaiveDate| Value::String(date.format(DATE_FORMAT).to_string()),
            |data: &Value| {
                let text = data
                    .as_str()
                    .ok_or_else(|| DeserializationError::type_mismatch("string", data))?;
                NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(|_| {
                    DeserializationError::invalid(format!("'{text}' is not a date (YYYY-MM-DD)"))
                })
            },
        );
        builder
            .schema_extra
            .insert("format".to_string(), json!("date"));
        builder
    }
}

impl<T> BasicField<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// A field with caller-supplied conversions. `kind` is the display type
    /// tag; `json_type` is the JSON Schema type of the data.
    pub fn custom<S, D>(
        key: impl Into<String>,
        kind: &'static str,
        json_type: &'static str,
        to_data: S,
        from_data: D,
    ) -> FieldBuilder<T>
    where
        S: Fn(&T) -> Value + Send + Sync + 'static,
        D: Fn(&Value) -> Result<T, DeserializationError> + Send + Sync + 'static,
    {
        FieldBuilder::new(key, kind, json_type, to_data, from_data)
    }

    /// The data constraint assembled at build time.
    pub fn data_constraint(&self) -> &Constraint<Value> {
        &self.data_constraint
    }

    /// Presentation metadata.
    pub fn display_info(&self) -> DisplayInfo {
        DisplayInfo::from_entries([
            ("type", json!(self.kind)),
            ("label", json!(self.label)),
            ("description", json!(self.description)),
            ("required", json!(self.required)),
        ])
    }
}

impl<T> Keyed for BasicField<T> {
    fn key(&self) -> &str {
        &self.key
    }

    fn label(&self) -> &str {
        &self.label
    }
}

impl<T> Converter for BasicField<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Object = T;

    fn serialize(&self, obj: &T) -> Value {
        (self.to_data)(obj)
    }

    fn deserialize(&self, data: &Value, _path: &FieldPath) -> Result<T, ConvertError> {
        let obj = (self.from_data)(data)?;

        let evaluation = self.data_constraint.evaluate(data);
        if !evaluation.is_satisfied() {
            return Err(DeserializationError::Constraint(evaluation.violations().join("; ")).into());
        }

        let evaluation = self.object_constraint.evaluate(&obj);
        if !evaluation.is_satisfied() {
            return Err(DeserializationError::Constraint(evaluation.violations().join("; ")).into());
        }

        Ok(obj)
    }

    fn validate_data(&self, data: &Value) -> ConstraintMap {
        ConstraintMap::new(self.data_constraint.evaluate(data))
    }

    fn validate_object(&self, obj: &T) -> ConstraintMap {
        ConstraintMap::new(self.object_constraint.evaluate(obj))
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
        let mut schema = self.schema_extra.clone();
        schema.insert("type".to_string(), json!(self.json_type));
        schema.insert("title".to_string(), json!(self.label));
        if let Some(description) = &self.description {
            schema.insert("description".to_string(), json!(description));
        }
        if let Some(default) = &self.default_data {
            schema.insert("default".to_string(), default.clone());
        }
        Value::Object(schema)
    }

    fn display(&self) -> Value {
        self.display_info().to_value()
    }
}

impl<T> fmt::Debug for BasicField<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicField")
            .field("key", &self.key)
            .field("kind", &self.kind)
            .field("required", &self.required)
            .field("data_constraint", &self.data_constraint)
            .finish_non_exhaustive()
    }
}

/// Configuration phase of a [`BasicField`].
pub struct FieldBuilder<T> {
    key: String,
    label: Option<String>,
    description: Option<String>,
    kind: &'static str,
    json_type: &'static str,
    schema_extra: Map<String, Value>,
    required: bool,
    default: Option<T>,
    extra_data_constraints: Vec<Constraint<Value>>,
    extra_object_constraints: Vec<Constraint<T>>,
    to_data: ToData<T>,
    from_data: FromData<T>,
}

impl<T> FieldBuilder<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn new<S, D>(
        key: impl Into<String>,
        kind: &'static str,
        json_type: &'static str,
        to_data: S,
        from_data: D,
    ) -> Self
    where
        S: Fn(&T) -> Value + Send + Sync + 'static,
        D: Fn(&Value) -> Result<T, DeserializationError> + Send + Sync + 'static,
    {
        Self {
            key: key.into(),
            label: None,
            description: None,
            kind,
            json_type,
            schema_extra: Map::new(),
            required: true,
            default: None,
            extra_data_constraints: Vec::new(),
            extra_object_constraints: Vec::new(),
            to_data: Arc::new(to_data),
            from_data: Arc::new(from_data),
        }
    }

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

    /// Whether a parent's data must contain this key. Defaults to true.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Shorthand for `required(false)`.
    pub fn optional(self) -> Self {
        self.required(false)
    }

    /// Object used when the key is absent.
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

    /// Extra JSON Schema keyword emitted in the fragment (e.g. `minLength`).
    pub fn schema_keyword(mut self, name: impl Into<String>, value: Value) -> Self {
        self.schema_extra.insert(name.into(), value);
        self
    }

    /// Freeze the configuration into a field.
    ///
    /// # Errors
    ///
    /// [`BuildError::EmptyKey`] if neither key nor label is usable;
    /// [`BuildError::InvalidDefault`] if the default violates the object
    /// constraint.
    pub fn build(self) -> Result<BasicField<T>, BuildError> {
        let (key, label) = key_and_label(Some(&self.key), self.label.as_deref())?;

        let mut data_constraint = json_type(self.json_type);
        data_constraint &= Constraint::all(self.extra_data_constraints);
        data_constraint &= not_null();

        let object_constraint = Constraint::all(self.extra_object_constraints);

        let default_data = match &self.default {
            Some(default) => {
                let evaluation = object_constraint.evaluate(default);
                if !evaluation.is_satisfied() {
                    return Err(BuildError::InvalidDefault {
                        key,
                        reason: evaluation.violations().join("; "),
                    });
                }
                Some((self.to_data)(default))
            }
            None => None,
        };

        Ok(BasicField {
            key,
            label,
            description: self.description,
            kind: self.kind,
            json_type: self.json_type,
            schema_extra: self.schema_extra,
            required: self.required,
            default: self.default,
            default_data,
            data_constraint,
            object_constraint,
            to_data: self.to_data,
            from_data: self.from_data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_text() -> BasicField<String> {
        BasicField::text("code")
            .data_constraint(Constraint::new("must be at most 3 characters", |v: &Value| {
                v.as_str().is_some_and(|s| s.chars().count() <= 3)
            }))
            .build()
            .unwrap()
    }

    #[test]
    fn test_text_round_trip() {
        let field = BasicField::text("name").build().unwrap();
        let data = field.serialize(&"Ann".to_string());
        assert_eq!(data, json!("Ann"));
        assert_eq!(field.deserialize(&data, &FieldPath::root()).unwrap(), "Ann");
    }

    #[test]
    fn test_type_mismatch_reported() {
        let field = BasicField::integer("age").build().unwrap();
        let err = field
            .deserialize(&json!("x"), &FieldPath::from(["age"]))
            .unwrap_err();
        assert_eq!(
            err,
            ConvertError::Field(DeserializationError::TypeMismatch {
                expected: "integer".to_string(),
                found: "string".to_string(),
            })
        );
    }

    #[test]
    fn test_extra_data_constraint_enforced() {
        let field = short_text();
        assert!(field.deserialize(&json!("abc"), &FieldPath::root()).is_ok());
        let err = field.deserialize(&json!("abcd"), &FieldPath::root()).unwrap_err();
        assert_eq!(
            err,
            ConvertError::Field(DeserializationError::Constraint(
                "must be at most 3 characters".to_string()
            ))
        );
    }

    #[test]
    fn test_validate_data_rejects_null_and_wrong_type() {
        let field = BasicField::text("name").build().unwrap();
        assert!(field.validate_data(&json!("x")).satisfied());
        let null = field.validate_data(&Value::Null);
        assert_eq!(
            null.result().violations(),
            &["must be of type string", "must not be null"]
        );
    }

    #[test]
    fn test_object_constraint_enforced() {
        let field = BasicField::integer("age")
            .object_constraint(Constraint::new("must not be negative", |n: &i64| *n >= 0))
            .build()
            .unwrap();
        assert!(!field.validate_object(&-1).satisfied());
        assert!(field.deserialize(&json!(-1), &FieldPath::root()).is_err());
    }

    #[test]
    fn test_default_cached_as_data() {
        let field = BasicField::integer("age").optional().default(0).build().unwrap();
        assert_eq!(field.default_object(), Some(&0));
        assert_eq!(field.default_data(), Some(&json!(0)));
        assert_eq!(field.schema_fragment()["default"], json!(0));
    }

    #[test]
    fn test_invalid_default_rejected_at_build() {
        let err = BasicField::integer("age")
            .optional()
            .default(-5)
            .object_constraint(Constraint::new("must not be negative", |n: &i64| *n >= 0))
            .build()
            .unwrap_err();
        assert!(matches!(err, BuildError::InvalidDefault { ref key, .. } if key == "age"));
    }

    #[test]
    fn test_date_parses_iso_format() {
        let field = BasicField::date("born").build().unwrap();
        let date = field.deserialize(&json!("1990-04-17"), &FieldPath::root()).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(1990, 4, 17).unwrap());
        assert_eq!(field.serialize(&date), json!("1990-04-17"));
        assert!(field.deserialize(&json!("17/04/1990"), &FieldPath::root()).is_err());
        assert_eq!(field.schema_fragment()["format"], json!("date"));
    }

    #[test]
    fn test_schema_fragment_shape() {
        let field = BasicField::number("ratio")
            .label("Ratio")
            .description("Between zero and one")
            .schema_keyword("maximum", json!(1))
            .build()
            .unwrap();
        assert_eq!(
            field.schema_fragment(),
            json!({
                "type": "number",
                "title": "Ratio",
                "description": "Between zero and one",
                "maximum": 1,
            })
        );
    }

    #[test]
    fn test_display_envelope() {
        let field = BasicField::boolean("agree").optional().build().unwrap();
        assert_eq!(
            field.display(),
            json!({"type": "checkbox", "label": "Agree", "required": false})
        );
    }

    #[test]
    fn test_integer_beyond_i64_rejected_on_every_path() {
        let field = BasicField::integer("n").build().unwrap();
        let too_big = json!(i64::MAX as u64 + 1);

        assert_eq!(field.validate_data(&too_big).result().violations(), &[I64_RANGE]);
        assert_eq!(
            field.deserialize(&too_big, &FieldPath::root()).unwrap_err(),
            ConvertError::Field(DeserializationError::Constraint(I64_RANGE.to_string()))
        );
        let schema = field.schema_fragment();
        assert_eq!(schema["minimum"], json!(i64::MIN));
        assert_eq!(schema["maximum"], json!(i64::MAX));

        let edge = json!(i64::MAX);
        assert!(field.validate_data(&edge).satisfied());
        assert_eq!(field.deserialize(&edge, &FieldPath::root()).unwrap(), i64::MAX);
        assert!(field.validate_data(&json!(i64::MIN)).satisfied());
    }

    #[test]
    fn test_integer_range_check_adds_nothing_for_other_types() {
        let field = BasicField::integer("n").build().unwrap();
        assert_eq!(
            field.validate_data(&json!("7")).result().violations(),
            &["must be of type integer"]
        );
    }

    #[test]
    fn test_number_rejects_non_finite_objects() {
        let field = BasicField::number("ratio").build().unwrap();
        assert!(field.validate_object(&0.5).satisfied());
        for n in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            assert_eq!(field.validate_object(&n).result().violations(), &["must be finite"]);
        }
        let err = BasicField::number("ratio")
            .optional()
            .default(f64::NAN)
            .build()
            .unwrap_err();
        assert!(matches!(err, BuildError::InvalidDefault { .. }));
    }

    #[test]
    fn test_custom_field() {
        let field = BasicField::custom(
            "tags",
            "tags",
            "string",
            |tags: &Vec<String>| json!(tags.join(",")),
            |data: &Value| {
                data.as_str()
                    .map(|s| s.split(',').map(str::to_string).collect())
                    .ok_or_else(|| DeserializationError::type_mismatch("string", data))
            },
        )
        .build()
        .unwrap();
        let tags = field.deserialize(&json!("a,b"), &FieldPath::root()).unwrap();
        assert_eq!(tags, vec!["a".to_string(), "b".to_string()]);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Every number the object constraint accepts survives a round trip;
        /// the rest are exactly the non-finite values.
        #[test]
        fn number_round_trip(n in any::<f64>()) {
            let field = BasicField::number("ratio").build().unwrap();
            if field.validate_object(&n).satisfied() {
                let data = field.serialize(&n);
                prop_assert!(field.validate_data(&data).satisfied());
                prop_assert_eq!(field.deserialize(&data, &FieldPath::root()), Ok(n));
            } else {
                prop_assert!(!n.is_finite());
            }
        }

        /// Integer data is accepted by `validate_data` exactly when it
        /// deserializes.
        #[test]
        fn integer_validation_matches_deserialize(n in prop_oneof![
            any::<i64>().prop_map(|n| json!(n)),
            any::<u64>().prop_map(|n| json!(n)),
        ]) {
            let field = BasicField::integer("n").build().unwrap();
            prop_assert_eq!(
                field.validate_data(&n).satisfied(),
                field.deserialize(&n, &FieldPath::root()).is_ok()
            );
        }
    }
}
