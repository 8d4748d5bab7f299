//! # Constraint Algebra
//!
//! A [`Constraint<T>`] is a described predicate over a value of type `T`:
//! `Constraint<Value>` for the data side, `Constraint<Obj>` for an object
//! type. Constraints compose with `&` (all must hold) and `|` (at least one
//! must hold). Composition flattens, so `(a & b) & c` and `a & (b & c)` are
//! the same three-way conjunction.
//!
//! ## Identities
//!
//! - The empty conjunction ([`Constraint::always`], also `Default`) is
//!   satisfied by everything and is the identity for `&=`.
//! - The empty disjunction ([`Constraint::never`]) is satisfied by nothing
//!   and is the identity for `|=`.
//!
//! ## Checking vs evaluating
//!
//! [`Constraint::check`] short-circuits and answers yes or no.
//! [`Constraint::evaluate`] visits every branch of a conjunction and
//! returns an [`Evaluation`] naming each violated part, so a caller can
//! show all problems at once.

use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// A described predicate, composable with `&` and `|`.
pub struct Constraint<T> {
    kind: Kind<T>,
}

enum Kind<T> {
    Check {
        description: String,
        test: Predicate<T>,
    },
    All(Vec<Constraint<T>>),
    Any(Vec<Constraint<T>>),
}

impl<T> Constraint<T> {
    /// A leaf constraint. `description` states the requirement
    /// ("must be a string") and is reported verbatim when it fails.
    pub fn new<F>(description: impl Into<String>, test: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            kind: Kind::Check {
                description: description.into(),
                test: Arc::new(test),
            },
        }
    }

    /// Conjunction of `parts`.
    pub fn all(parts: impl IntoIterator<Item = Constraint<T>>) -> Self {
        parts.into_iter().fold(Self::always(), |acc, part| acc & part)
    }

    /// Disjunction of `parts`.
    pub fn any(parts: impl IntoIterator<Item = Constraint<T>>) -> Self {
        parts.into_iter().fold(Self::never(), |acc, part| acc | part)
    }

    /// Satisfied by every value.
    pub fn always() -> Self {
        Self {
            kind: Kind::All(Vec::new()),
        }
    }

    /// Satisfied by no value.
    pub fn never() -> Self {
        Self {
            kind: Kind::Any(Vec::new()),
        }
    }

    /// Short-circuiting yes/no answer.
    pub fn check(&self, value: &T) -> bool {
        match &self.kind {
            Kind::Check { test, .. } => test(value),
            Kind::All(parts) => parts.iter().all(|part| part.check(value)),
            Kind::Any(parts) => parts.iter().any(|part| part.check(value)),
        }
    }

    /// Full evaluation naming every violated part of a conjunction.
    ///
    /// A failed disjunction is reported as one violation describing all of
    /// its alternatives.
    pub fn evaluate(&self, value: &T) -> Evaluation {
        match &self.kind {
            Kind::Check { description, test } => {
                if test(value) {
                    Evaluation::pass()
                } else {
                    Evaluation::fail(description.clone())
                }
            }
            Kind::All(parts) => parts
                .iter()
                .fold(Evaluation::pass(), |acc, part| acc.and(part.evaluate(value))),
            Kind::Any(parts) => {
                if parts.iter().any(|part| part.check(value)) {
                    Evaluation::pass()
                } else {
                    Evaluation::fail(self.description())
                }
            }
        }
    }

    /// Human-readable statement of the whole constraint.
    pub fn description(&self) -> String {
        match &self.kind {
            Kind::Check { description, .. } => description.clone(),
            Kind::All(parts) if parts.is_empty() => "always holds".to_string(),
            Kind::Any(parts) if parts.is_empty() => "never holds".to_string(),
            Kind::All(parts) => join_parts(parts, " and "),
            Kind::Any(parts) => join_parts(parts, " or "),
        }
    }

    fn into_conjuncts(self) -> Vec<Self> {
        match self.kind {
            Kind::All(parts) => parts,
            kind => vec![Self { kind }],
        }
    }

    fn into_disjuncts(self) -> Vec<Self> {
        match self.kind {
            Kind::Any(parts) => parts,
            kind => vec![Self { kind }],
        }
    }

    fn is_compound(&self) -> bool {
        match &self.kind {
            Kind::Check { .. } => false,
            Kind::All(parts) | Kind::Any(parts) => parts.len() > 1,
        }
    }
}

fn join_parts<T>(parts: &[Constraint<T>], separator: &str) -> String {
    if parts.len() == 1 {
        return parts[0].description();
    }
    parts
        .iter()
        .map(|part| {
            if part.is_compound() {
                format!("({})", part.description())
            } else {
                part.description()
            }
        })
        .collect::<Vec<_>>()
        .join(separator)
}

impl<T> Clone for Constraint<T> {
    fn clone(&self) -> Self {
        let kind = match &self.kind {
            Kind::Check { description, test } => Kind::Check {
                description: description.clone(),
                test: Arc::clone(test),
            },
            Kind::All(parts) => Kind::All(parts.clone()),
            Kind::Any(parts) => Kind::Any(parts.clone()),
        };
        Self { kind }
    }
}

impl<T> Default for Constraint<T> {
    fn default() -> Self {
        Self::always()
    }
}

impl<T> fmt::Debug for Constraint<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Constraint").field(&self.description()).finish()
    }
}

impl<T> BitAnd for Constraint<T> {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        let mut parts = self.into_conjuncts();
        parts.extend(rhs.into_conjuncts());
        Self {
            kind: Kind::All(parts),
        }
    }
}

impl<T> BitOr for Constraint<T> {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        let mut parts = self.into_disjuncts();
        parts.extend(rhs.into_disjuncts());
        Self {
            kind: Kind::Any(parts),
        }
    }
}

impl<T> BitAndAssign for Constraint<T> {
    fn bitand_assign(&mut self, rhs: Self) {
        *self = std::mem::take(self) & rhs;
    }
}

impl<T> BitOrAssign for Constraint<T> {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = std::mem::replace(self, Self::never()) | rhs;
    }
}

/// Outcome of [`Constraint::evaluate`]: satisfied iff no violations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Evaluation {
    violations: Vec<String>,
}

impl Evaluation {
    /// A satisfied outcome.
    pub fn pass() -> Self {
        Self::default()
    }

    /// A violated outcome with one description.
    pub fn fail(description: impl Into<String>) -> Self {
        Self {
            violations: vec![description.into()],
        }
    }

    /// Returns true when nothing was violated.
    pub fn is_satisfied(&self) -> bool {
        self.violations.is_empty()
    }

    /// Descriptions of every violated constraint.
    pub fn violations(&self) -> &[String] {
        &self.violations
    }

    /// Conjunction of two outcomes.
    pub fn and(mut self, other: Evaluation) -> Self {
        self.violations.extend(other.violations);
        self
    }
}

/// JSON type name as used by JSON Schema's `type` keyword.
///
/// Numbers representable as `i64`/`u64` are `"integer"`.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Data is JSON `null`.
pub fn is_null() -> Constraint<Value> {
    Constraint::new("must be null", Value::is_null)
}

/// Data is anything but JSON `null`.
pub fn not_null() -> Constraint<Value> {
    Constraint::new("must not be null", |value: &Value| !value.is_null())
}

/// Data is a JSON object.
pub fn is_object() -> Constraint<Value> {
    Constraint::new("must be an object", Value::is_object)
}

/// Data has the JSON type `name`; integers also count as numbers.
pub fn json_type(name: &'static str) -> Constraint<Value> {
    Constraint::new(format!("must be of type {name}"), move |value: &Value| {
        let actual = json_type_name(value);
        actual == name || (name == "number" && actual == "integer")
    })
}

/// Arbitrary described predicate; shorthand for [`Constraint::new`].
pub fn predicate<T, F>(description: impl Into<String>, test: F) -> Constraint<T>
where
    F: Fn(&T) -> bool + Send + Sync + 'static,
{
    Constraint::new(description, test)
}

/// Data is an object containing every key in `keys`, one constraint per key
/// so each missing key is reported on its own.
pub fn has_keys<I, S>(keys: I) -> Constraint<Value>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Constraint::all(keys.into_iter().map(|key| {
        let key: String = key.into();
        Constraint::new(format!("must have key '{key}'"), move |value: &Value| {
            value.as_object().is_some_and(|map| map.contains_key(&key))
        })
    }))
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn threshold(min: i64) -> Constraint<i64> {
        Constraint::new(format!("must be at least {min}"), move |n: &i64| *n >= min)
    }

    fn modulus(m: i64) -> Constraint<i64> {
        Constraint::new(format!("must be divisible by {m}"), move |n: &i64| n % m == 0)
    }

    proptest! {
        /// `evaluate` is satisfied exactly when `check` holds.
        #[test]
        fn evaluate_agrees_with_check(
            value in -100i64..100,
            min in -50i64..50,
            m in 1i64..7,
            disjoin in any::<bool>(),
        ) {
            let c = if disjoin {
                threshold(min) | modulus(m)
            } else {
                threshold(min) & modulus(m)
            };
            prop_assert_eq!(c.evaluate(&value).is_satisfied(), c.check(&value));
        }

        /// `&` and `|` behave as boolean and/or over the parts.
        #[test]
        fn operators_are_boolean(value in -100i64..100, min in -50i64..50, m in 1i64..7) {
            let a = threshold(min).check(&value);
            let b = modulus(m).check(&value);
            prop_assert_eq!((threshold(min) & modulus(m)).check(&value), a && b);
            prop_assert_eq!((threshold(min) | modulus(m)).check(&value), a || b);
        }

        /// A conjunction reports one violation per failed part.
        #[test]
        fn conjunction_reports_each_failure(value in -100i64..100, mins in prop::collection::vec(-50i64..50, 0..6)) {
            let c = Constraint::all(mins.iter().copied().map(threshold));
            let failed = mins.iter().filter(|min| value < **min).count();
            prop_assert_eq!(c.evaluate(&value).violations().len(), failed);
        }
    }
}
