//! Chunk record preparation: hashing, per-document metadata, and dedupe.

use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::Path;

use super::folder_meta::FolderMetadata;
use super::types::{Chunk, ChunkRecord};

/// Compute a deterministic hash for chunk text.
pub fn compute_chunk_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)
}

/// Attach document metadata to every chunk of `source`.
///
/// `chunk_id` is the chunk's position in `chunks`, so ids stay stable across reruns with the
/// same chunking parameters.
pub fn build_chunk_records(
    source: &Path,
    chunks: Vec<Chunk>,
    folder: &FolderMetadata,
) -> Vec<ChunkRecord> {
    let file_name = source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let source = source.to_string_lossy().into_owned();

    chunks
        .into_iter()
        .enumerate()
        .map(|(chunk_id, chunk)| ChunkRecord {
            chunk_id,
            start: chunk.start,
            file_name: file_name.clone(),
            source: source.clone(),
            chunk_hash: compute_chunk_hash(&chunk.text),
            client_name: folder.client_name.clone(),
            year: folder.year.clone(),
            project_title: folder.project_title.clone(),
            text: chunk.text,
        })
        .collect()
}

/// Records removed by [`dedupe_records`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DedupeSummary {
    /// Records whose text repeated an earlier record.
    pub duplicates: usize,
    /// Records containing only whitespace.
    pub blank: usize,
}

/// Remove records whose text repeats an earlier record, keeping the first occurrence.
///
/// Whitespace-only records are dropped too and counted separately from duplicates.
pub fn dedupe_records(records: Vec<ChunkRecord>) -> (Vec<ChunkRecord>, DedupeSummary) {
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(records.len());
    let mut summary = DedupeSummary::default();

    for record in records {
        if record.text.trim().is_empty() {
            summary.blank += 1;
        } else if seen.insert(record.chunk_hash.clone()) {
            kept.push(record);
        } else {
            summary.duplicates += 1;
        }
    }

    (kept, summary)
}
