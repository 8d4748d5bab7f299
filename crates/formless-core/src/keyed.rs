//! # Keys and Labels
//!
//! Every node in a form tree is addressed by a key that is unique among its
//! siblings, and shown to people under a label. A node may be configured
//! with either one and the other is derived:
//!
//! - key → label: separators (`_`, `-`) become spaces, each word is
//!   capitalized (`date_of_birth` → `Date Of Birth`).
//! - label → key: lowercased, every run of non-alphanumeric characters
//!   becomes a single `_` (`Date of birth?` → `date_of_birth`).

use crate::error::BuildError;

/// Capability of an entity with a stable identifying key and a label.
///
/// The key is fixed when the entity is constructed.
pub trait Keyed {
    /// Identifier, unique among siblings.
    fn key(&self) -> &str;

    /// Human-readable name.
    fn label(&self) -> &str;
}

/// Resolve a `(key, label)` pair, deriving whichever is absent.
///
/// Empty strings count as absent.
///
/// # Errors
///
/// Returns [`BuildError::EmptyKey`] when neither is given, or when the
/// label contains no character a key could be derived from.
pub fn key_and_label(
    key: Option<&str>,
    label: Option<&str>,
) -> Result<(String, String), BuildError> {
    let key = key.filter(|k| !k.is_empty());
    let label = label.filter(|l| !l.trim().is_empty());

    match (key, label) {
        (Some(key), Some(label)) => Ok((key.to_string(), label.to_string())),
        (Some(key), None) => Ok((key.to_string(), humanize(key))),
        (None, Some(label)) => {
            let key = keyify(label);
            if key.is_empty() {
                return Err(BuildError::EmptyKey);
            }
            Ok((key, label.to_string()))
        }
        (None, None) => Err(BuildError::EmptyKey),
    }
}

/// Turn a key into a display label.
pub fn humanize(key: &str) -> String {
    key.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Turn a display label into a key.
pub fn keyify(label: &str) -> String {
    let mut key = String::with_capacity(label.len());
    for c in label.chars() {
        if c.is_alphanumeric() {
            key.extend(c.to_lowercase());
        } else if !key.is_empty() && !key.ends_with('_') {
            key.push('_');
        }
    }
    while key.ends_with('_') {
        key.pop();
    }
    key
}
