//! # Schema Conformance
//!
//! Compiles a derived data schema with the `jsonschema` crate and validates
//! documents against it.
//!
//! ## Dialect
//!
//! Schemas are compiled as draft-07, the dialect forms declare in
//! `$schema`. Under draft-07 the `unevaluatedProperties` keyword carries no
//! assertion, so the compiled schema accepts undeclared keys exactly as a
//! form's `validate_data` does. [`audit_closed_objects`] is the place to
//! look for nodes that do or do not declare closure.
//!
//! [`audit_closed_objects`]: crate::audit::audit_closed_objects
//!
//! ## Agreement
//!
//! A form's schema and its data validator are derived from the same child
//! registry. [`check_agreement`] runs one document through both and reports
//! the two verdicts side by side, which is what the integration tests use
//! to hold them together.

use std::collections::BTreeMap;
use std::fmt;

use formless_form::{Converter, Form};
use jsonschema::Validator;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Error from compiling a schema or validating a document.
#[derive(Error, Debug)]
pub enum SchemaCheckError {
    /// The schema could not be compiled.
    #[error("schema '{schema_name}' does not compile: {reason}")]
    ValidatorBuild {
        /// Title of the schema, or `(untitled)`.
        schema_name: String,
        /// Compiler message.
        reason: String,
    },

    /// The document did not conform to the schema.
    #[error("document does not conform to schema '{schema_name}': {report}")]
    ValidationFailed {
        /// Title of the schema, or `(untitled)`.
        schema_name: String,
        /// Every violation found in the document.
        report: SchemaReport,
    },
}

/// One rejected keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// JSON Pointer to the schema keyword that rejected the value.
    pub schema_path: String,
    /// Validator message.
    pub message: String,
}

/// Schema violations keyed by the JSON Pointer of the rejected value,
/// the same locations a form's error report uses. The document root is
/// the empty pointer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SchemaReport {
    by_pointer: BTreeMap<String, Vec<Violation>>,
}

impl SchemaReport {
    fn push(&mut self, pointer: String, violation: Violation) {
        self.by_pointer.entry(pointer).or_default().push(violation);
    }

    /// True if the document conformed.
    pub fn is_empty(&self) -> bool {
        self.by_pointer.is_empty()
    }

    /// Rejected locations, sorted.
    pub fn pointers(&self) -> Vec<&str> {
        self.by_pointer.keys().map(String::as_str).collect()
    }

    /// Violations at `pointer`; empty if that location conformed.
    pub fn at(&self, pointer: &str) -> &[Violation] {
        self.by_pointer
            .get(pointer)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Total number of violations.
    pub fn violation_count(&self) -> usize {
        self.by_pointer.values().map(Vec::len).sum()
    }
}

impl fmt::Display for SchemaReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (pointer, violations) in &self.by_pointer {
            for violation in violations {
                if !first {
                    f.write_str("; ")?;
                }
                first = false;
                let location = if pointer.is_empty() { "/" } else { pointer };
                write!(f, "{location} {}", violation.message)?;
            }
        }
        Ok(())
    }
}

/// A compiled schema.
///
/// `Send + Sync`; compile once and share.
pub struct SchemaChecker {
    schema_name: String,
    schema: Value,
    validator: Validator,
}

impl SchemaChecker {
    /// Compile the root data schema of `form`.
    ///
    /// # Errors
    ///
    /// [`SchemaCheckError::ValidatorBuild`] if the derived schema does not
    /// compile.
    pub fn for_form<T, F>(form: &F) -> Result<Self, SchemaCheckError>
    where
        F: Form<T> + ?Sized,
    {
        Self::from_schema(form.data_schema())
    }

    /// Compile an arbitrary schema document as draft-07.
    ///
    /// # Errors
    ///
    /// [`SchemaCheckError::ValidatorBuild`] if the schema does not compile.
    pub fn from_schema(schema: Value) -> Result<Self, SchemaCheckError> {
        let schema_name = schema
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or("(untitled)")
            .to_string();

        let mut opts = jsonschema::options();
        opts.with_draft(jsonschema::Draft::Draft7);
        let validator = opts
            .build(&schema)
            .map_err(|e| SchemaCheckError::ValidatorBuild {
                schema_name: schema_name.clone(),
                reason: e.to_string(),
            })?;

        tracing::debug!(schema = %schema_name, "schema compiled");
        Ok(Self {
            schema_name,
            schema,
            validator,
        })
    }

    /// The schema document that was compiled.
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// Title of the schema, or `(untitled)`.
    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }

    /// True if `instance` conforms.
    pub fn is_valid(&self, instance: &Value) -> bool {
        self.validator.is_valid(instance)
    }

    /// Every violation in `instance`; empty if it conforms.
    pub fn report(&self, instance: &Value) -> SchemaReport {
        let mut report = SchemaReport::default();
        for error in self.validator.iter_errors(instance) {
            report.push(
                error.instance_path.to_string(),
                Violation {
                    schema_path: error.schema_path.to_string(),
                    message: error.to_string(),
                },
            );
        }
        report
    }

    /// Validate `instance`.
    ///
    /// # Errors
    ///
    /// [`SchemaCheckError::ValidationFailed`] with every violation found.
    pub fn validate_document(&self, instance: &Value) -> Result<(), SchemaCheckError> {
        let report = self.report(instance);
        if report.is_empty() {
            return Ok(());
        }
        tracing::debug!(
            schema = %self.schema_name,
            violations = report.violation_count(),
            "document rejected"
        );
        Err(SchemaCheckError::ValidationFailed {
            schema_name: self.schema_name.clone(),
            report,
        })
    }

    /// Run `instance` through both this schema and `converter`'s data
    /// validator.
    pub fn agreement<C>(&self, converter: &C, instance: &Value) -> Agreement
    where
        C: Converter + ?Sized,
    {
        let agreement = Agreement {
            schema_valid: self.is_valid(instance),
            constraints_satisfied: converter.validate_data(instance).satisfied(),
        };
        if !agreement.agrees() {
            tracing::warn!(
                schema = %self.schema_name,
                converter = converter.key(),
                schema_valid = agreement.schema_valid,
                constraints_satisfied = agreement.constraints_satisfied,
                "schema and data constraints disagree"
            );
        }
        agreement
    }
}

impl fmt::Debug for SchemaChecker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaChecker")
            .field("schema_name", &self.schema_name)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

/// The two verdicts on one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Agreement {
    /// The compiled schema accepted the document.
    pub schema_valid: bool,
    /// `validate_data` was satisfied.
    pub constraints_satisfied: bool,
}

impl Agreement {
    /// True if both verdicts are the same.
    pub fn agrees(&self) -> bool {
        self.schema_valid == self.constraints_satisfied
    }
}

/// Compile `form`'s data schema and compare its verdict on `instance` with
/// the form's own data validator.
///
/// # Errors
///
/// [`SchemaCheckError::ValidatorBuild`] if the derived schema does not
/// compile.
pub fn check_agreement<T, F>(form: &F, instance: &Value) -> Result<Agreement, SchemaCheckError>
where
    F: Form<T>,
{
    let checker = SchemaChecker::for_form(form)?;
    Ok(checker.agreement(form, instance))
}
