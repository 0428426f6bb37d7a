use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing triage activity.
#[derive(Default)]
pub struct RunMetrics {
    documents_processed: AtomicU64,
    chunks_produced: AtomicU64,
    duplicate_chunks: AtomicU64,
    template_matches: AtomicU64,
    chunks_classified: AtomicU64,
    classification_failures: AtomicU64,
}

impl RunMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a processed document and the number of chunks produced for it.
    pub fn record_document(&self, chunk_count: u64) {
        self.documents_processed.fetch_add(1, Ordering::Relaxed);
        self.chunks_produced
            .fetch_add(chunk_count, Ordering::Relaxed);
    }

    /// Record chunks dropped as in-document duplicates.
    pub fn record_duplicates(&self, count: u64) {
        self.duplicate_chunks.fetch_add(count, Ordering::Relaxed);
    }

    /// Record a chunk skipped because it matched a template.
    pub fn record_template_match(&self) {
        self.template_matches.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful classification.
    pub fn record_classified(&self) {
        self.chunks_classified.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a classification that failed.
    pub fn record_failure(&self) {
        self.classification_failures
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_processed: self.documents_processed.load(Ordering::Relaxed),
            chunks_produced: self.chunks_produced.load(Ordering::Relaxed),
            duplicate_chunks: self.duplicate_chunks.load(Ordering::Relaxed),
            template_matches: self.template_matches.load(Ordering::Relaxed),
            chunks_classified: self.chunks_classified.load(Ordering::Relaxed),
            classification_failures: self.classification_failures.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of triage counters used for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Documents chunked since startup.
    pub documents_processed: u64,
    /// Chunks produced across all documents.
    pub chunks_produced: u64,
    /// Chunks dropped as duplicates within their document.
    pub duplicate_chunks: u64,
    /// Chunks skipped as template boilerplate.
    pub template_matches: u64,
    /// Chunks classified successfully.
    pub chunks_classified: u64,
    /// Chunks whose classification failed.
    pub classification_failures: u64,
}
