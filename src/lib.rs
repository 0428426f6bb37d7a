#![deny(missing_docs)]

//! Core library for doctriage: document chunking, template boilerplate detection, and
//! LLM-assisted categorization.

/// Extraction prompts, response parsing, and metadata flattening.
pub mod classification;
/// Environment-driven configuration management.
pub mod config;
/// Completion client abstraction and adapters.
pub mod llm;
/// Structured logging and tracing setup.
pub mod logging;
/// Run metrics helpers.
pub mod metrics;
/// Document processing pipeline utilities.
pub mod processing;
/// Template store, harvesting, and similarity matching.
pub mod templates;
