//! Index configuration
//!
//! Built once at startup and handed to the controller and trigger.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{IndexError, Result};

/// Default number of raw items considered per rebuild
pub const DEFAULT_RESULTS_LIMIT: usize = 500;

/// Status an item carries before its first real save
pub const DEFAULT_PLACEHOLDER_STATUS: &str = "auto-draft";

pub const DEFAULT_EDIT_URL_TEMPLATE: &str = "/admin/content/{id}/edit";

/// Keyboard shortcut handed to the navigation widget
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Shortcut {
    pub code: u32,
    pub label: String,
}

impl Shortcut {
    pub fn new(code: u32, label: impl Into<String>) -> Self {
        Self {
            code,
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Maximum number of raw items fetched per rebuild
    pub results_limit: usize,
    pub shortcuts: BTreeMap<String, Shortcut>,
    /// Leaving this status is what counts as a content creation
    pub placeholder_status: String,
    /// Edit URL with `{id}` and `{type}` placeholders
    pub edit_url_template: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            results_limit: DEFAULT_RESULTS_LIMIT,
            shortcuts: default_shortcuts(),
            placeholder_status: DEFAULT_PLACEHOLDER_STATUS.to_string(),
            edit_url_template: DEFAULT_EDIT_URL_TEMPLATE.to_string(),
        }
    }
}

impl IndexConfig {
    pub fn with_results_limit(mut self, limit: usize) -> Self {
        self.results_limit = limit;
        self
    }

    /// Merge shortcuts parsed from a JSON object over the defaults
    ///
    /// # Example
    ///
    /// ```
    /// use content_index::IndexConfig;
    ///
    /// let config = IndexConfig::default()
    ///     .with_shortcuts_json(r#"{"open": {"code": 75, "label": "k"}}"#)
    ///     .unwrap();
    /// assert_eq!(config.shortcuts["open"].code, 75);
    /// assert!(config.shortcuts.contains_key("close"));
    /// ```
    pub fn with_shortcuts_json(mut self, raw: &str) -> Result<Self> {
        let overrides: BTreeMap<String, Shortcut> = serde_json::from_str(raw)
            .map_err(|e| IndexError::Configuration(format!("invalid shortcut map: {}", e)))?;
        self.shortcuts.extend(overrides);
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.results_limit == 0 {
            return Err(IndexError::Configuration(
                "results_limit must be greater than zero".to_string(),
            ));
        }
        if self.placeholder_status.trim().is_empty() {
            return Err(IndexError::Configuration(
                "placeholder_status must not be empty".to_string(),
            ));
        }
        if !self.edit_url_template.contains("{id}") {
            return Err(IndexError::Configuration(format!(
                "edit_url_template '{}' has no {{id}} placeholder",
                self.edit_url_template
            )));
        }
        Ok(())
    }
}

fn default_shortcuts() -> BTreeMap<String, Shortcut> {
    BTreeMap::from([
        ("open".to_string(), Shortcut::new(191, "/")),
        ("close".to_string(), Shortcut::new(27, "Esc")),
        ("up".to_string(), Shortcut::new(38, "↑")),
        ("down".to_string(), Shortcut::new(40, "↓")),
        ("select".to_string(), Shortcut::new(13, "Enter")),
    ])
}
