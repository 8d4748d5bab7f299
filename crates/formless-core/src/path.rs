//! # Field Paths
//!
//! A [`FieldPath`] locates a value inside a form tree as the sequence of
//! child keys walked from the root. The empty path is the root itself.
//!
//! Paths render as JSON Pointers (RFC 6901) so they line up with the
//! `instance_path` reported by JSON Schema validators.

use std::fmt;

use serde::{Serialize, Serializer};

/// Root-relative sequence of keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// The empty path.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Returns true for the empty path.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// A new path one level below this one.
    pub fn child(&self, key: &str) -> Self {
        let mut segments = Vec::with_capacity(self.0.len() + 1);
        segments.extend(self.0.iter().cloned());
        segments.push(key.to_string());
        Self(segments)
    }

    /// The keys making up the path, outermost first.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Number of keys in the path.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true for the empty path.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// JSON Pointer form: `""` for the root, `/a/b` otherwise.
    pub fn to_pointer(&self) -> String {
        let mut pointer = String::new();
        for segment in &self.0 {
            pointer.push('/');
            pointer.push_str(&segment.replace('~', "~0").replace('/', "~1"));
        }
        pointer
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            write!(f, "(root)")
        } else {
            write!(f, "{}", self.to_pointer())
        }
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_pointer())
    }
}

impl From<Vec<String>> for FieldPath {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

impl<const N: usize> From<[&str; N]> for FieldPath {
    fn from(segments: [&str; N]) -> Self {
        Self(segments.iter().map(|s| s.to_string()).collect())
    }
}

impl<S: Into<String>> FromIterator<S> for FieldPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}
