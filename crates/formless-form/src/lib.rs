//! # formless-form — Composite Converters
//!
//! Builds converter trees that turn JSON data into typed objects and back,
//! validate both sides, and describe the accepted data as JSON Schema.
//!
//! ## Capabilities
//!
//! - [`Converter`]: serialize, deserialize, validate, describe.
//! - [`Parent`]: own keyed children and split data across them.
//! - [`Form`]: both at once. [`BasicForm`] is the concrete form.
//!
//! ## Example
//!
//! ```
//! use formless_form::{BasicField, BasicForm, Fields, Form};
//! use serde_json::json;
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Person {
//!     name: String,
//!     age: i64,
//! }
//!
//! let form = BasicForm::builder("person", |mut fields: Fields| {
//!     Ok(Person {
//!         name: fields.take("name")?,
//!         age: fields.take("age")?,
//!     })
//! })
//! .child(BasicField::text("name").build()?, |p: &Person| &p.name)
//! .child(BasicField::integer("age").optional().default(0).build()?, |p: &Person| &p.age)
//! .build()?;
//!
//! let person = form.deserialize_root(&json!({"name": "Ann"})).unwrap();
//! assert_eq!(person, Person { name: "Ann".into(), age: 0 });
//! assert_eq!(form.data_schema()["required"], json!(["name"]));
//! # Ok::<(), formless_core::BuildError>(())
//! ```
//!
//! ## Crate Policy
//!
//! - Trees are built once and shared; every operation takes `&self`.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod converter;
pub mod field;
pub mod form;
pub mod nullable;
pub mod parent;
pub mod settings;

pub use converter::{Converter, Deserializer, Fields, ObjectSerializer, Serializer};
pub use field::{BasicField, FieldBuilder};
pub use form::{BasicForm, BasicFormBuilder, Form, SCHEMA_DIALECT};
pub use nullable::Nullable;
pub use parent::{Child, Parent};
pub use settings::FormSettings;
