//! # formless-core — Foundational Types for formless
//!
//! This crate defines the vocabulary shared by every node in a form tree.
//! It knows nothing about how a node converts data; it only describes how
//! nodes are named, where in a tree a value lives, what a constraint is, and
//! how failures are reported.
//!
//! ## Key Design Principles
//!
//! 1. **Absent is not null.** Missing data is `None`; JSON `null` is
//!    `Some(Value::Null)`. A node that accepts null never confuses the two.
//!
//! 2. **Validation is data.** Constraint evaluation returns an
//!    [`Evaluation`] and a tree of them, the [`ConstraintMap`]. Nothing in
//!    the validation path returns `Err`.
//!
//! 3. **Deserialization fails slow.** [`FormErrors`] is a non-empty map from
//!    [`FieldPath`] to [`DeserializationError`]. Reports from subtrees merge
//!    into their parent's report instead of being wrapped.
//!
//! 4. **Misconfiguration fails at build time.** [`BuildError`] is returned
//!    when a tree is assembled, never while it serves requests.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `formless-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod constraint;
pub mod constraint_map;
pub mod display;
pub mod error;
pub mod keyed;
pub mod path;

// Re-export primary types for ergonomic imports.
pub use constraint::{json_type_name, predicate, Constraint, Evaluation};
pub use constraint_map::ConstraintMap;
pub use display::{remove_null_values, DisplayInfo};
pub use error::{BuildError, ConvertError, DeserializationError, ErrorCollector, FormErrors};
pub use keyed::{humanize, key_and_label, keyify, Keyed};
pub use path::FieldPath;
