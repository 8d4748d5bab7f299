//! # Error Types — Structured Error Hierarchy
//!
//! Defines the error types used throughout formless. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - [`DeserializationError`] is one leaf failure: a single value could not
//!   be converted.
//! - [`FormErrors`] is the aggregated report: every leaf failure found in one
//!   traversal, keyed by the [`FieldPath`] where it happened. It is never
//!   empty.
//! - [`ConvertError`] is what a converter returns; either kind may surface.
//! - [`BuildError`] is a programmer error detected while assembling a tree.
//!
//! Aggregation is explicit: [`ErrorCollector::absorb`] records single
//! errors under the child's path and merges reports as they are, so paths
//! qualified deeper in the tree are never rewritten.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

use crate::constraint::json_type_name;
use crate::path::FieldPath;

/// A single value failed to convert.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeserializationError {
    /// A required key was absent and no default was configured.
    #[error("missing required value")]
    Missing,

    /// The value has the wrong JSON type.
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        /// JSON type the converter accepts.
        expected: String,
        /// JSON type actually supplied.
        found: String,
    },

    /// The value has the right type but violates a constraint.
    #[error("{0}")]
    Constraint(String),

    /// Any other conversion failure, described for the end user.
    #[error("{0}")]
    Invalid(String),
}

impl DeserializationError {
    /// Conversion failure with a free-form description.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }

    /// Type mismatch between the expected JSON type and the supplied value.
    pub fn type_mismatch(expected: &str, found: &Value) -> Self {
        Self::TypeMismatch {
            expected: expected.to_string(),
            found: json_type_name(found).to_string(),
        }
    }
}

/// Aggregated, path-qualified deserialization failures.
///
/// # Invariants
///
/// - Contains at least one issue. The only constructors are
///   [`FormErrors::single`] and [`ErrorCollector::finish`].
/// - Paths are root-relative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormErrors {
    issues: BTreeMap<FieldPath, DeserializationError>,
}

impl FormErrors {
    /// A report with exactly one issue.
    pub fn single(path: FieldPath, error: DeserializationError) -> Self {
        let mut issues = BTreeMap::new();
        issues.insert(path, error);
        Self { issues }
    }

    /// All issues, ordered by path.
    pub fn issues(&self) -> &BTreeMap<FieldPath, DeserializationError> {
        &self.issues
    }

    /// The issue recorded at `path`, if any.
    pub fn get(&self, path: &FieldPath) -> Option<&DeserializationError> {
        self.issues.get(path)
    }

    /// Number of issues.
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Always false for a report obtained through the public constructors.
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Paths that failed, ordered.
    pub fn paths(&self) -> impl Iterator<Item = &FieldPath> {
        self.issues.keys()
    }

    /// Iterate over `(path, error)` pairs.
    pub fn iter(&self) -> btree_map::Iter<'_, FieldPath, DeserializationError> {
        self.issues.iter()
    }

    /// Union with another report. An issue already recorded at a path wins
    /// over a later one at the same path.
    pub fn merge(&mut self, other: FormErrors) {
        for (path, error) in other.issues {
            self.issues.entry(path).or_insert(error);
        }
    }

    /// Render as `{"<json pointer>": "<message>"}` for end users.
    pub fn to_json(&self) -> Value {
        let map = self
            .issues
            .iter()
            .map(|(path, error)| (path.to_pointer(), Value::String(error.to_string())))
            .collect();
        Value::Object(map)
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} field error(s):", self.issues.len())?;
        for (path, error) in &self.issues {
            write!(f, "\n  {path}: {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for FormErrors {}

impl Serialize for FormErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.issues.len()))?;
        for (path, error) in &self.issues {
            map.serialize_entry(path, &error.to_string())?;
        }
        map.end()
    }
}

impl IntoIterator for FormErrors {
    type Item = (FieldPath, DeserializationError);
    type IntoIter = btree_map::IntoIter<FieldPath, DeserializationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.issues.into_iter()
    }
}

/// Failure returned by a converter's `deserialize`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    /// A leaf failed; the caller decides which path it belongs to.
    #[error(transparent)]
    Field(#[from] DeserializationError),

    /// A subtree failed; paths are already qualified.
    #[error(transparent)]
    Form(#[from] FormErrors),
}

impl ConvertError {
    /// Convert into a report, placing a single error at `path`.
    pub fn into_report(self, path: &FieldPath) -> FormErrors {
        match self {
            Self::Field(error) => FormErrors::single(path.clone(), error),
            Self::Form(report) => report,
        }
    }
}

/// Accumulates failures across one traversal.
#[derive(Debug, Default)]
pub struct ErrorCollector {
    issues: BTreeMap<FieldPath, DeserializationError>,
}

impl ErrorCollector {
    /// An empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a single error at `path`.
    pub fn record(&mut self, path: FieldPath, error: DeserializationError) {
        self.issues.entry(path).or_insert(error);
    }

    /// Record a child's failure. Single errors land at `path`; reports are
    /// merged with their paths untouched.
    pub fn absorb(&mut self, error: ConvertError, path: &FieldPath) {
        match error {
            ConvertError::Field(error) => self.record(path.clone(), error),
            ConvertError::Form(report) => {
                for (path, error) in report.issues {
                    self.record(path, error);
                }
            }
        }
    }

    /// Number of failures so far.
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Returns true while nothing has failed.
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// `Ok(())` if nothing failed, otherwise the report.
    pub fn finish(self) -> Result<(), FormErrors> {
        if self.issues.is_empty() {
            Ok(())
        } else {
            Err(FormErrors {
                issues: self.issues,
            })
        }
    }
}

/// A form tree was assembled incorrectly.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// Neither a key nor a usable label was supplied.
    #[error("a node needs a non-empty key or a label to derive one from")]
    EmptyKey,

    /// Two children of the same form share a key.
    #[error("duplicate child key '{key}' in form '{form}'")]
    DuplicateKey {
        /// Key of the parent form.
        form: String,
        /// The repeated child key.
        key: String,
    },

    /// A child is marked required yet declares a default, so its default
    /// could never apply without contradicting the required-key check.
    #[error("child '{key}' of form '{form}' is required but declares a default")]
    RequiredWithDefault {
        /// Key of the parent form.
        form: String,
        /// Key of the offending child.
        key: String,
    },

    /// The configured default fails the node's own object constraint.
    #[error("default for '{key}' is invalid: {reason}")]
    InvalidDefault {
        /// Key of the node.
        key: String,
        /// Violated constraints.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_collector_empty_finishes_ok() {
        assert!(ErrorCollector::new().finish().is_ok());
    }

    #[test]
    fn test_collector_absorbs_single_at_child_path() {
        let mut collector = ErrorCollector::new();
        let path = FieldPath::from(["age"]);
        collector.absorb(DeserializationError::invalid("bad").into(), &path);
        let report = collector.finish().unwrap_err();
        assert_eq!(report.get(&path), Some(&DeserializationError::invalid("bad")));
    }

    #[test]
    fn test_collector_merges_report_without_requalifying() {
        let nested = FormErrors::single(
            FieldPath::from(["address", "city"]),
            DeserializationError::Missing,
        );
        let mut collector = ErrorCollector::new();
        collector.record(FieldPath::from(["name"]), DeserializationError::Missing);
        collector.absorb(nested.into(), &FieldPath::from(["address"]));
        let report = collector.finish().unwrap_err();
        assert_eq!(report.len(), 2);
        assert!(report.get(&FieldPath::from(["address", "city"])).is_some());
        assert!(report.get(&FieldPath::from(["address"])).is_none());
    }

    #[test]
    fn test_merge_keeps_first_issue_per_path() {
        let path = FieldPath::from(["x"]);
        let mut report = FormErrors::single(path.clone(), DeserializationError::Missing);
        report.merge(FormErrors::single(path.clone(), DeserializationError::invalid("later")));
        assert_eq!(report.len(), 1);
        assert_eq!(report.get(&path), Some(&DeserializationError::Missing));
    }

    #[test]
    fn test_into_report_places_single_error() {
        let report = ConvertError::from(DeserializationError::Missing).into_report(&FieldPath::root());
        assert_eq!(report.paths().collect::<Vec<_>>(), vec![&FieldPath::root()]);
    }

    #[test]
    fn test_report_json_rendering() {
        let mut report = FormErrors::single(FieldPath::root(), DeserializationError::invalid("nope"));
        report.merge(FormErrors::single(
            FieldPath::from(["age"]),
            DeserializationError::type_mismatch("integer", &json!("x")),
        ));
        assert_eq!(
            report.to_json(),
            json!({"": "nope", "/age": "expected integer, found string"})
        );
        assert_eq!(serde_json::to_value(&report).unwrap(), report.to_json());
    }

    #[test]
    fn test_report_display_lists_every_issue() {
        let mut report = FormErrors::single(FieldPath::from(["a"]), DeserializationError::Missing);
        report.merge(FormErrors::single(FieldPath::root(), DeserializationError::invalid("whole")));
        let text = report.to_string();
        assert!(text.starts_with("2 field error(s):"));
        assert!(text.contains("(root): whole"));
        assert!(text.contains("/a: missing required value"));
    }
}
