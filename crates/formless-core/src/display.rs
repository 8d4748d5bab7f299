//! # Display Envelope
//!
//! Presentation metadata a node exposes to whatever renders it: a type tag,
//! a label, an optional description and collapse flags. Entries whose value
//! is `null` are dropped before the envelope is exposed; `false` is kept.

use serde::Serialize;
use serde_json::{Map, Value};

/// Drop every entry whose value is JSON `null`.
pub fn remove_null_values(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter().filter(|(_, value)| !value.is_null()).collect()
}

/// Null-free presentation metadata for one node.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DisplayInfo(Map<String, Value>);

impl DisplayInfo {
    /// Build from `(name, value)` entries, dropping nulls.
    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Value)>,
    {
        let map = entries
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect();
        Self(remove_null_values(map))
    }

    /// Look up one entry.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// The entries.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Copy of the entries as a JSON object.
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nulls_dropped_false_kept() {
        let info = DisplayInfo::from_entries([
            ("type", json!("form")),
            ("label", json!("Person")),
            ("description", Value::Null),
            ("collapsed", json!(false)),
        ]);
        assert_eq!(
            info.to_value(),
            json!({"type": "form", "label": "Person", "collapsed": false})
        );
        assert!(info.get("description").is_none());
    }
}
