//! # Constraint Maps
//!
//! A [`ConstraintMap`] is the result of validating a value against a node
//! tree. It mirrors the tree: each level holds the node's own
//! [`Evaluation`] plus one map per child that was visited.
//!
//! ## Invariant
//!
//! A map is satisfied iff its own evaluation is satisfied and every child
//! map is satisfied.
//!
//! ## Merge
//!
//! Two maps merge by unioning their children key-wise (recursively merging
//! a key present in both) and ANDing their own evaluations. `&` is merge.

use std::collections::BTreeMap;
use std::ops::BitAnd;

use serde::Serialize;

use crate::constraint::Evaluation;
use crate::path::FieldPath;

/// Tree of constraint outcomes mirroring a node tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConstraintMap {
    #[serde(rename = "violations", skip_serializing_if = "Evaluation::is_satisfied")]
    result: Evaluation,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    children: BTreeMap<String, ConstraintMap>,
}

impl ConstraintMap {
    /// A leaf map holding one node's own outcome.
    pub fn new(result: Evaluation) -> Self {
        Self {
            result,
            children: BTreeMap::new(),
        }
    }

    /// A map with a satisfied own outcome and the given children.
    pub fn with_children(children: BTreeMap<String, ConstraintMap>) -> Self {
        Self {
            result: Evaluation::pass(),
            children,
        }
    }

    /// The node's own outcome.
    pub fn result(&self) -> &Evaluation {
        &self.result
    }

    /// Child maps by key.
    pub fn children(&self) -> &BTreeMap<String, ConstraintMap> {
        &self.children
    }

    /// The map for one child, if it was visited.
    pub fn child(&self, key: &str) -> Option<&ConstraintMap> {
        self.children.get(key)
    }

    /// Returns true when this node and every descendant are satisfied.
    pub fn satisfied(&self) -> bool {
        self.result.is_satisfied() && self.children.values().all(ConstraintMap::satisfied)
    }

    /// Merge two maps.
    pub fn merge(mut self, other: ConstraintMap) -> Self {
        self.result = self.result.and(other.result);
        for (key, theirs) in other.children {
            let merged = match self.children.remove(&key) {
                Some(ours) => ours.merge(theirs),
                None => theirs,
            };
            self.children.insert(key, merged);
        }
        self
    }

    /// Every violation with the path of the node that reported it,
    /// depth-first with a node before its children.
    pub fn failures(&self) -> Vec<(FieldPath, String)> {
        let mut out = Vec::new();
        self.collect_failures(&FieldPath::root(), &mut out);
        out
    }

    fn collect_failures(&self, path: &FieldPath, out: &mut Vec<(FieldPath, String)>) {
        for violation in self.result.violations() {
            out.push((path.clone(), violation.clone()));
        }
        for (key, child) in &self.children {
            child.collect_failures(&path.child(key), out);
        }
    }
}

impl BitAnd for ConstraintMap {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        self.merge(rhs)
    }
}
