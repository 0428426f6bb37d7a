//! Document processing pipeline: discovery, chunking, record preparation, and categorization.

pub mod chunking;
pub mod discovery;
pub mod folder_meta;
pub mod records;
mod service;
pub mod types;

pub use chunking::{ChunkingConfig, chunk_text};
pub use discovery::{DiscoveryError, DocumentSelection, discover_documents};
pub use folder_meta::{FolderMetadata, extract_folder_metadata};
pub use service::DocumentProcessor;
pub use types::{
    CategorizeOutcome, CategorizedRecord, Chunk, ChunkMatch, ChunkRecord, ChunkingError,
    ClassificationError, ProcessingError,
};
