//! # Form Settings
//!
//! Presentation and requirement settings for a form, in a shape that can be
//! loaded from JSON or YAML by the caller and applied with
//! [`BasicFormBuilder::settings`](crate::form::BasicFormBuilder::settings).
//! Unknown keys are rejected so a typo does not silently fall back to a
//! default.

use serde::{Deserialize, Serialize};

/// Loadable settings for one form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormSettings {
    /// Display name; the form's key is humanized when absent.
    pub label: Option<String>,
    /// Longer explanation.
    pub description: Option<String>,
    /// Whether a parent's data must contain the form's key.
    pub required: bool,
    /// Whether renderers may collapse the form.
    pub collapsable: bool,
    /// Whether renderers start with the form collapsed.
    pub collapsed: bool,
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            label: None,
            description: None,
            required: true,
            collapsable: false,
            collapsed: false,
        }
    }
}
