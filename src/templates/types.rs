//! Template records, match results, and store errors.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Known document boilerplate used as a similarity reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Template {
    /// Display name, usually the file the template was harvested from.
    pub template_name: String,
    /// Reference text.
    pub content: String,
}

impl Template {
    /// Build a template from its name and content.
    pub fn new(template_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            template_name: template_name.into(),
            content: content.into(),
        }
    }
}

/// Outcome of comparing one chunk against a template set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchResult {
    /// Whether the best score cleared the threshold.
    pub is_match: bool,
    /// Best similarity score in `[0, 1]`.
    pub score: f64,
    /// Name of the first template that reached the best score; empty when none scored.
    pub template_name: String,
}

/// Whether a missing template store is acceptable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorePresence {
    /// Missing store means "no templates yet".
    #[default]
    Optional,
    /// Missing store is an error.
    Required,
}

/// Errors raised while reading or writing the template store.
#[derive(Debug, Error)]
pub enum TemplateStoreError {
    /// Store is required but does not exist.
    #[error("Template store not found: {}", path.display())]
    NotFound {
        /// Location that was looked up.
        path: PathBuf,
    },
    /// Store exists but is not a list of `{template_name, content}` records.
    #[error("Template store {} is malformed: {source}", path.display())]
    DataFormat {
        /// Location of the malformed store.
        path: PathBuf,
        /// Decoder error describing the first mismatch.
        #[source]
        source: serde_json::Error,
    },
    /// Filesystem failure while accessing the store.
    #[error("Template store I/O failed for {}: {source}", path.display())]
    Io {
        /// Location being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
