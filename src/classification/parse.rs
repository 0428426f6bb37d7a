//! Strict parsing of the classifier's JSON answer.
//!
//! The model is asked to answer with a single JSON object. The response is accepted only when
//! the whole (trimmed) text is that object, optionally wrapped in one Markdown code fence.
//! Anything else, including prose around the object, is a [`ParseError`] rather than a best-effort
//! substring search.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fields extracted from a document excerpt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedFields {
    /// One of the configured categories, in its configured spelling.
    pub category: String,
    /// Product names mentioned in the excerpt.
    pub products: Vec<String>,
    /// Client names mentioned in the excerpt.
    pub clients: Vec<String>,
    /// Document creator, empty when not mentioned.
    pub creator: String,
}

/// Reasons a classifier response is rejected.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Response is not a JSON object (or a fenced JSON object).
    #[error("response does not consist of a JSON object")]
    NoJson,
    /// Response looked like JSON but did not match the expected schema.
    #[error("response JSON does not match the expected schema: {0}")]
    InvalidJson(#[from] serde_json::Error),
    /// Category outside the configured set.
    #[error("unknown category '{category}'")]
    UnknownCategory {
        /// Category reported by the model.
        category: String,
    },
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawExtraction {
    category: String,
    #[serde(default)]
    products: Option<Vec<String>>,
    #[serde(default)]
    clients: Option<Vec<String>>,
    #[serde(default)]
    creator: Option<String>,
}

/// Parse and validate a classifier response against `categories`.
///
/// Category comparison ignores case and surrounding whitespace. Product and client names are
/// trimmed; blank entries are dropped. Missing or `null` lists and creator become empty.
pub fn parse(raw: &str, categories: &[String]) -> Result<ExtractedFields, ParseError> {
    let body = json_body(raw)?;
    let extraction: RawExtraction = serde_json::from_str(body)?;

    let reported = extraction.category.trim();
    let category = categories
        .iter()
        .find(|known| known.eq_ignore_ascii_case(reported))
        .cloned()
        .ok_or_else(|| ParseError::UnknownCategory {
            category: reported.to_string(),
        })?;

    Ok(ExtractedFields {
        category,
        products: clean_names(extraction.products),
        clients: clean_names(extraction.clients),
        creator: extraction
            .creator
            .map(|creator| creator.trim().to_string())
            .unwrap_or_default(),
    })
}

fn json_body(raw: &str) -> Result<&str, ParseError> {
    let trimmed = raw.trim();
    let body = match trimmed.strip_prefix("```") {
        Some(fenced) => {
            let (language, rest) = fenced.split_once('\n').ok_or(ParseError::NoJson)?;
            let language = language.trim();
            if !language.is_empty() && !language.eq_ignore_ascii_case("json") {
                return Err(ParseError::NoJson);
            }
            rest.trim_end()
                .strip_suffix("```")
                .ok_or(ParseError::NoJson)?
                .trim()
        }
        None => trimmed,
    };

    if body.starts_with('{') {
        Ok(body)
    } else {
        Err(ParseError::NoJson)
    }
}

fn clean_names(names: Option<Vec<String>>) -> Vec<String> {
    names
        .unwrap_or_default()
        .into_iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}
