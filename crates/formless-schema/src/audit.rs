//! # Closed-Object Audit
//!
//! Walks a schema and reports every object node that accepts undeclared
//! properties. A node counts as closed when it sets
//! `unevaluatedProperties: false` or `additionalProperties: false`; a
//! schema value for either keyword restricts rather than opens, and is also
//! accepted.
//!
//! The walk descends through `properties/*`, `items`, and the branches of
//! `anyOf`/`oneOf`/`allOf`, so nullable wrappers and nested forms are
//! covered. Forms derived by `formless-form` are always closed; the audit
//! is meant for hand-written or post-processed schemas.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

const CLOSING_KEYWORDS: [&str; 2] = ["unevaluatedProperties", "additionalProperties"];
const BRANCH_KEYWORDS: [&str; 3] = ["anyOf", "oneOf", "allOf"];

/// Audit `schema` for object nodes that accept undeclared properties.
///
/// Findings are returned in walk order (parents before children).
pub fn audit_closed_objects(schema: &Value) -> Vec<OpenObjectFinding> {
    let mut findings = Vec::new();
    audit_node(schema, "", &mut findings);
    findings
}

fn audit_node(schema: &Value, path: &str, findings: &mut Vec<OpenObjectFinding>) {
    if is_object_schema(schema) {
        check_closed(schema, path, findings);
    }

    if let Some(Value::Object(properties)) = schema.get("properties") {
        for (name, property) in properties {
            let property_path = format!("{path}/properties/{}", escape_pointer(name));
            audit_node(property, &property_path, findings);
        }
    }

    if let Some(items) = schema.get("items") {
        audit_node(items, &format!("{path}/items"), findings);
    }

    for keyword in BRANCH_KEYWORDS {
        if let Some(Value::Array(branches)) = schema.get(keyword) {
            for (i, branch) in branches.iter().enumerate() {
                audit_node(branch, &format!("{path}/{keyword}/{i}"), findings);
            }
        }
    }
}

/// True for `type: "object"`, a type list containing `"object"`, or an
/// untyped node that declares `properties` or `required`.
fn is_object_schema(schema: &Value) -> bool {
    match schema.get("type") {
        Some(Value::String(name)) => name == "object",
        Some(Value::Array(names)) => names.iter().any(|name| name == "object"),
        _ => schema.get("properties").is_some() || schema.get("required").is_some(),
    }
}

fn check_closed(schema: &Value, path: &str, findings: &mut Vec<OpenObjectFinding>) {
    let mut current = None;
    for keyword in CLOSING_KEYWORDS {
        match schema.get(keyword) {
            Some(Value::Bool(false)) | Some(Value::Object(_)) => return,
            Some(other) if current.is_none() => current = Some((keyword, other.to_string())),
            _ => {}
        }
    }

    let (keyword, current_value) = current.unwrap_or((
        CLOSING_KEYWORDS[0],
        "(absent, defaults to true)".to_string(),
    ));
    let finding = OpenObjectFinding {
        json_path: format!("{path}/{keyword}"),
        current_value,
        recommendation: "Set unevaluatedProperties to false".to_string(),
    };
    tracing::warn!(
        path = %finding.json_path,
        current = %finding.current_value,
        "object schema accepts undeclared properties"
    );
    findings.push(finding);
}

fn escape_pointer(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// An object node that accepts undeclared properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenObjectFinding {
    /// JSON Pointer to the keyword that should close the node.
    pub json_path: String,
    /// Current value of that keyword.
    pub current_value: String,
    /// Recommended action.
    pub recommendation: String,
}

impl fmt::Display for OpenObjectFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "  {}: {} -> {}",
            self.json_path, self.current_value, self.recommendation
        )
    }
}
