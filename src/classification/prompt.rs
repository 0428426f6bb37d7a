//! Prompt assembly for excerpt classification.

/// System instructions sent alongside every extraction prompt.
pub const EXTRACTION_SYSTEM_PROMPT: &str =
    "You extract structured facts from business documents and answer with JSON only.";

/// Build the user prompt asking the model to classify `excerpt` into one of `categories`.
pub fn build_extraction_prompt(excerpt: &str, categories: &[String]) -> String {
    let category_list = categories.join(", ");
    format!(
        "Document excerpt:\n\n{excerpt}\n\n\
         Read the excerpt and report:\n\
         - category: exactly one of {category_list}\n\
         - products: product names mentioned in the excerpt ([] if none)\n\
         - clients: client or customer names mentioned in the excerpt ([] if none)\n\
         - creator: the author of the document if stated (\"\" if not)\n\n\
         Respond with a single JSON object and nothing else, for example:\n\
         {{\"category\": \"{example}\", \"products\": [\"Product A\"], \
         \"clients\": [\"Client B\"], \"creator\": \"\"}}",
        example = categories.first().map(String::as_str).unwrap_or("Other"),
    )
}
