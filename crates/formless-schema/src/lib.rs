//! # formless-schema — Schema Conformance & Audit
//!
//! Checks the JSON Schema that a form derives for itself against real
//! documents, and audits schemas for object nodes that accept undeclared
//! properties.
//!
//! ## Conformance (`check`)
//!
//! [`SchemaChecker`] compiles a schema once (draft-07, matching
//! [`formless_form::SCHEMA_DIALECT`]) and validates documents against it,
//! returning a [`SchemaReport`] of violations keyed by document pointer.
//! [`check_agreement`] runs a document through both the compiled schema and
//! the form's own [`validate_data`](formless_form::Converter::validate_data)
//! and reports
//! whether they reach the same verdict.
//!
//! ## Audit (`audit`)
//!
//! [`audit_closed_objects`] walks a schema and reports every object node
//! that is not closed with `unevaluatedProperties: false` or
//! `additionalProperties: false`.
//!
//! ## Crate Policy
//!
//! - Depends only on `formless-core` and `formless-form` internally.
//! - Compiled validators are `Send + Sync` and built once per schema.

pub mod audit;
pub mod check;

pub use audit::{audit_closed_objects, OpenObjectFinding};
pub use check::{
    check_agreement, Agreement, SchemaCheckError, SchemaChecker, SchemaReport, Violation,
};
