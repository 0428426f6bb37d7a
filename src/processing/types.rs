//! Core data types and error definitions for the processing pipeline.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::classification::ParseError;
use crate::config::ConfigError;
use crate::llm::CompletionClientError;

/// Errors produced while configuring the chunker.
#[derive(Debug, Error)]
pub enum ChunkingError {
    /// Window parameters would never advance through the text.
    #[error(
        "invalid chunking configuration: chunk_size={chunk_size}, overlap={overlap} \
         (overlap must be smaller than a non-zero chunk size)"
    )]
    InvalidConfiguration {
        /// Requested window size.
        chunk_size: usize,
        /// Requested overlap.
        overlap: usize,
    },
}

/// Errors emitted while classifying a single chunk.
#[derive(Debug, Error)]
pub enum ClassificationError {
    /// Completion backend failed to answer.
    #[error("Completion request failed: {0}")]
    Completion(#[from] CompletionClientError),
    /// Completion answered with something that is not a valid extraction.
    #[error("Unusable classification response: {0}")]
    Parse(#[from] ParseError),
}

/// Errors raised by [`DocumentProcessor`](super::DocumentProcessor) operations.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// Chunking parameters were rejected.
    #[error(transparent)]
    Chunking(#[from] ChunkingError),
    /// Configuration needed by the operation is missing or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Categorization was requested but no completion provider is configured.
    #[error("No completion provider configured; set LLM_PROVIDER to enable categorization")]
    ClassifierUnavailable,
}

/// A contiguous window of a source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Offset of the first character, counted in characters from the start of the source.
    pub start: usize,
    /// Window contents.
    pub text: String,
}

/// Chunk plus the metadata that travels with it to the vector store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkRecord {
    /// Position of the chunk within its document.
    pub chunk_id: usize,
    /// Character offset of the chunk within its document.
    pub start: usize,
    /// File name component of the source path.
    pub file_name: String,
    /// Full source path as supplied by the caller.
    pub source: String,
    /// SHA-256 digest of the chunk text, hex encoded.
    pub chunk_hash: String,
    /// Client folder derived from the document's location, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    /// Year folder derived from the document's location, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    /// Project folder derived from the document's location, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_title: Option<String>,
    /// Chunk contents.
    pub text: String,
}

/// Result of running the template matcher over one chunk, tagged with its position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkMatch {
    /// Position of the chunk within its document.
    pub chunk_id: usize,
    /// Character offset of the chunk within its document.
    pub start: usize,
    /// Whether the best template cleared the threshold.
    pub is_match: bool,
    /// Best similarity score observed.
    pub score: f64,
    /// Name of the best-scoring template (empty when none were loaded).
    pub template_name: String,
}

/// Summary of a completed `categorize` run over one document.
///
/// Every chunk lands in exactly one bucket, so `chunk_count` equals the sum of the other fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategorizeOutcome {
    /// Chunks produced for the document.
    pub chunk_count: usize,
    /// Chunks dropped because they duplicated an earlier chunk of the same document.
    pub skipped_duplicates: usize,
    /// Chunks dropped because they contained only whitespace.
    pub skipped_blank: usize,
    /// Chunks skipped because they matched a known template.
    pub template_matches: usize,
    /// Chunks classified successfully.
    pub classified: usize,
    /// Chunks whose classification failed.
    pub failed: usize,
}

impl CategorizeOutcome {
    /// Add the counters of `other` to `self`, for run-wide totals.
    pub fn accumulate(&mut self, other: &CategorizeOutcome) {
        self.chunk_count += other.chunk_count;
        self.skipped_duplicates += other.skipped_duplicates;
        self.skipped_blank += other.skipped_blank;
        self.template_matches += other.template_matches;
        self.classified += other.classified;
        self.failed += other.failed;
    }
}

/// Chunk record enriched with the classifier's metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorizedRecord {
    /// Chunk and its document metadata.
    #[serde(flatten)]
    pub record: ChunkRecord,
    /// Flattened classification fields (`category`, `products_str`, ...).
    pub metadata: Map<String, Value>,
}
