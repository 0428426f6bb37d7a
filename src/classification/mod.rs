//! LLM-assisted extraction of category, products, clients, and creator from excerpts.

pub mod metadata;
pub mod parse;
pub mod prompt;

pub use metadata::flatten_into_metadata;
pub use parse::{ExtractedFields, ParseError, parse};
pub use prompt::{EXTRACTION_SYSTEM_PROMPT, build_extraction_prompt};

use crate::llm::{CompletionClient, CompletionRequest};
use crate::processing::ClassificationError;

/// Ask `client` to classify `excerpt` and validate its answer.
pub async fn classify_excerpt(
    client: &dyn CompletionClient,
    model: &str,
    excerpt: &str,
    categories: &[String],
) -> Result<ExtractedFields, ClassificationError> {
    let request = CompletionRequest {
        model: model.to_string(),
        system: Some(EXTRACTION_SYSTEM_PROMPT.to_string()),
        prompt: build_extraction_prompt(excerpt, categories),
    };
    let raw = client.complete(request).await?;
    Ok(parse(&raw, categories)?)
}
