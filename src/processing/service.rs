//! Document processor coordinating chunking, template matching, and classification.

use crate::{
    classification::{classify_excerpt, flatten_into_metadata},
    config::Config,
    llm::CompletionClient,
    metrics::{MetricsSnapshot, RunMetrics},
    processing::{
        chunking::{ChunkingConfig, chunk_text},
        folder_meta::extract_folder_metadata,
        records::{build_chunk_records, dedupe_records},
        types::{CategorizeOutcome, CategorizedRecord, ChunkMatch, ChunkRecord, ProcessingError},
    },
    templates::{SimilarityOptions, Template, best_match_with},
};
use serde_json::Map;
use std::path::Path;
use std::sync::Arc;

/// Runs the triage pipeline over individual documents.
///
/// The processor owns the loaded template set, the optional completion client, and the metrics
/// registry. Build it once per run and feed it documents one at a time.
pub struct DocumentProcessor {
    chunking: ChunkingConfig,
    threshold: f64,
    similarity: SimilarityOptions,
    categories: Vec<String>,
    model: String,
    templates: Vec<Template>,
    completion_client: Option<Box<dyn CompletionClient + Send + Sync>>,
    metrics: Arc<RunMetrics>,
}

impl DocumentProcessor {
    /// Build a processor from configuration, a template set, and an optional completion client.
    pub fn new(
        config: &Config,
        templates: Vec<Template>,
        completion_client: Option<Box<dyn CompletionClient + Send + Sync>>,
    ) -> Result<Self, ProcessingError> {
        let chunking = ChunkingConfig::new(config.chunk_size, config.chunk_overlap)?;
        let model = match completion_client {
            Some(_) => config.require_llm_model()?.to_string(),
            None => config.llm_model.clone(),
        };
        tracing::debug!(
            chunk_size = chunking.chunk_size(),
            overlap = chunking.overlap(),
            templates = templates.len(),
            classifier = completion_client.is_some(),
            "Initialized document processor"
        );

        Ok(Self {
            chunking,
            threshold: config.template_threshold,
            similarity: SimilarityOptions {
                autojunk: config.template_autojunk,
            },
            categories: config.categories.clone(),
            model,
            templates,
            completion_client,
            metrics: Arc::new(RunMetrics::new()),
        })
    }

    /// Share an existing metrics registry instead of the processor's own.
    pub fn with_metrics(mut self, metrics: Arc<RunMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Templates used for boilerplate detection.
    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    /// Split `text` into chunk records tagged with `source` and, when `root` is given, the
    /// folder metadata of `source` relative to it.
    pub fn chunk_document(
        &self,
        source: &Path,
        text: &str,
        root: Option<&Path>,
    ) -> Vec<ChunkRecord> {
        let chunks = chunk_text(text, self.chunking);
        let folder = root
            .map(|root| extract_folder_metadata(source, root))
            .unwrap_or_default();
        let records = build_chunk_records(source, chunks, &folder);

        self.metrics.record_document(records.len() as u64);
        tracing::debug!(
            source = %source.display(),
            chunks = records.len(),
            client = ?folder.client_name,
            year = ?folder.year,
            project = ?folder.project_title,
            "Chunked document"
        );
        records
    }

    /// Score every chunk of `text` against the template set.
    pub fn match_chunks(&self, text: &str) -> Vec<ChunkMatch> {
        chunk_text(text, self.chunking)
            .into_iter()
            .enumerate()
            .map(|(chunk_id, chunk)| {
                let result =
                    best_match_with(&chunk.text, &self.templates, self.threshold, self.similarity);
                ChunkMatch {
                    chunk_id,
                    start: chunk.start,
                    is_match: result.is_match,
                    score: result.score,
                    template_name: result.template_name,
                }
            })
            .collect()
    }

    /// Chunk `source`, drop duplicates and template boilerplate, and classify what remains.
    ///
    /// A chunk whose classification fails is logged, counted in the outcome, and left out of the
    /// returned records; it does not abort the document.
    pub async fn categorize(
        &self,
        source: &Path,
        text: &str,
        root: Option<&Path>,
    ) -> Result<(Vec<CategorizedRecord>, CategorizeOutcome), ProcessingError> {
        let client = self
            .completion_client
            .as_deref()
            .ok_or(ProcessingError::ClassifierUnavailable)?;

        let records = self.chunk_document(source, text, root);
        let chunk_count = records.len();
        let (records, dropped) = dedupe_records(records);
        self.metrics.record_duplicates(dropped.duplicates as u64);
        if dropped.blank > 0 {
            tracing::debug!(
                source = %source.display(),
                blank = dropped.blank,
                "Dropped whitespace-only chunks"
            );
        }

        let mut outcome = CategorizeOutcome {
            chunk_count,
            skipped_duplicates: dropped.duplicates,
            skipped_blank: dropped.blank,
            ..CategorizeOutcome::default()
        };
        let mut categorized = Vec::with_capacity(records.len());

        for record in records {
            let matched = best_match_with(
                &record.text,
                &self.templates,
                self.threshold,
                self.similarity,
            );
            if matched.is_match {
                tracing::debug!(
                    chunk_id = record.chunk_id,
                    template = %matched.template_name,
                    score = matched.score,
                    "Skipping template chunk"
                );
                outcome.template_matches += 1;
                self.metrics.record_template_match();
                continue;
            }

            match classify_excerpt(client, &self.model, &record.text, &self.categories).await {
                Ok(fields) => {
                    let mut metadata = Map::new();
                    flatten_into_metadata(&fields, &mut metadata);
                    tracing::debug!(
                        chunk_id = record.chunk_id,
                        category = %fields.category,
                        products = fields.products.len(),
                        clients = fields.clients.len(),
                        "Classified chunk"
                    );
                    outcome.classified += 1;
                    self.metrics.record_classified();
                    categorized.push(CategorizedRecord { record, metadata });
                }
                Err(error) => {
                    tracing::warn!(
                        source = %source.display(),
                        chunk_id = record.chunk_id,
                        %error,
                        "Classification failed"
                    );
                    outcome.failed += 1;
                    self.metrics.record_failure();
                }
            }
        }

        tracing::info!(
            source = %source.display(),
            chunks = outcome.chunk_count,
            skipped_duplicates = outcome.skipped_duplicates,
            skipped_blank = outcome.skipped_blank,
            template_matches = outcome.template_matches,
            classified = outcome.classified,
            failed = outcome.failed,
            "Document categorized"
        );
        Ok((categorized, outcome))
    }

    /// Retrieve the current metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{CompletionClientError, CompletionRequest};
    use async_trait::async_trait;
    use std::sync::Mutex;

    type Answer = Result<String, CompletionClientError>;

    /// Answers from a queue and records every prompt it receives.
    struct ScriptedClient {
        answers: Mutex<Vec<Answer>>,
        prompts: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedClient {
        fn new(mut answers: Vec<Answer>) -> (Self, Arc<Mutex<Vec<String>>>) {
            let prompts = Arc::new(Mutex::new(Vec::new()));
            answers.reverse();
            (
                Self {
                    answers: Mutex::new(answers),
                    prompts: prompts.clone(),
                },
                prompts,
            )
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        async fn complete(&self, request: CompletionRequest) -> Answer {
            self.prompts.lock().expect("lock").push(request.prompt);
            let next = self.answers.lock().expect("lock").pop();
            next.unwrap_or_else(|| Err(CompletionClientError::GenerationFailed("empty".into())))
        }
    }

    fn config(chunk_size: usize, overlap: usize) -> Config {
        Config {
            chunk_size,
            chunk_overlap: overlap,
            ..Config::default()
        }
    }

    fn bucket_total(outcome: &CategorizeOutcome) -> usize {
        outcome.skipped_duplicates
            + outcome.skipped_blank
            + outcome.template_matches
            + outcome.classified
            + outcome.failed
    }

    #[test]
    fn rejects_invalid_chunking_configuration() {
        let result = DocumentProcessor::new(&config(4, 4), Vec::new(), None);
        assert!(matches!(result, Err(ProcessingError::Chunking(_))));
    }

    #[test]
    fn chunk_document_attaches_folder_metadata() {
        let processor = DocumentProcessor::new(&config(4, 2), Vec::new(), None).expect("processor");
        let root = Path::new("/archive");
        let source = Path::new("/archive/Acme/2023/Migration/plan.txt");

        let records = processor.chunk_document(source, "abcdef", Some(root));

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].text, "abcd");
        assert_eq!(records[1].text, "cdef");
        assert_eq!(records[1].start, 2);
        assert_eq!(records[0].file_name, "plan.txt");
        assert_eq!(records[0].client_name.as_deref(), Some("Acme"));
        assert_eq!(records[0].year.as_deref(), Some("2023"));
        assert_eq!(records[0].project_title.as_deref(), Some("Migration"));

        let snapshot = processor.metrics_snapshot();
        assert_eq!(snapshot.documents_processed, 1);
        assert_eq!(snapshot.chunks_produced, 2);
    }

    #[test]
    fn shared_metrics_accumulate_across_processors() {
        let metrics = Arc::new(RunMetrics::new());
        let first = DocumentProcessor::new(&config(4, 0), Vec::new(), None)
            .expect("processor")
            .with_metrics(Arc::clone(&metrics));
        let second = DocumentProcessor::new(&config(2, 0), Vec::new(), None)
            .expect("processor")
            .with_metrics(Arc::clone(&metrics));

        first.chunk_document(Path::new("a.txt"), "abcdefgh", None);
        second.chunk_document(Path::new("b.txt"), "abcd", None);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.documents_processed, 2);
        assert_eq!(snapshot.chunks_produced, 4);
        assert_eq!(first.metrics_snapshot(), snapshot);
    }

    #[test]
    fn match_chunks_reports_best_template_per_chunk() {
        let templates = vec![
            Template::new("greeting", "hello world"),
            Template::new("other", "zzzzzzzzzzz"),
        ];
        let processor = DocumentProcessor::new(&config(11, 0), templates, None).expect("processor");
        assert_eq!(processor.templates().len(), 2);
        assert_eq!(processor.templates()[0].template_name, "greeting");

        let matches = processor.match_chunks("hello worldqqqqqqqqqqq");

        assert_eq!(matches.len(), 2);
        assert!(matches[0].is_match);
        assert_eq!(matches[0].template_name, "greeting");
        assert!((matches[0].score - 1.0).abs() < f64::EPSILON);
        assert!(!matches[1].is_match);
        assert_eq!(matches[1].start, 11);
    }

    #[tokio::test]
    async fn categorize_requires_a_classifier() {
        let processor = DocumentProcessor::new(&config(4, 0), Vec::new(), None).expect("processor");
        let error = processor
            .categorize(Path::new("doc.txt"), "abcdefgh", None)
            .await
            .expect_err("no classifier");
        assert!(matches!(error, ProcessingError::ClassifierUnavailable));
    }

    #[tokio::test]
    async fn categorize_skips_duplicates_and_templates_and_counts_failures() {
        let (client, prompts) = ScriptedClient::new(vec![
            Ok(r#"{"category": "Legal", "clients": ["Acme"]}"#.to_string()),
            Ok("not json".to_string()),
        ]);
        let templates = vec![Template::new("boiler", "BOILERPL")];
        let processor = DocumentProcessor::new(&config(8, 0), templates, Some(Box::new(client)))
            .expect("processor");

        // Chunks: "Acme NDA", "BOILERPL", "Acme NDA" (duplicate), "Widgets!"
        let text = "Acme NDABOILERPLAcme NDAWidgets!";
        let (records, outcome) = processor
            .categorize(Path::new("contracts/nda.txt"), text, None)
            .await
            .expect("categorize");

        assert_eq!(
            outcome,
            CategorizeOutcome {
                chunk_count: 4,
                skipped_duplicates: 1,
                skipped_blank: 0,
                template_matches: 1,
                classified: 1,
                failed: 1,
            }
        );
        assert_eq!(bucket_total(&outcome), outcome.chunk_count);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].record.text, "Acme NDA");
        assert_eq!(records[0].metadata["category"], "Legal");
        assert_eq!(records[0].metadata["client_1"], "Acme");

        let prompts = prompts.lock().expect("lock");
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("Acme NDA"));
        assert!(prompts[1].contains("Widgets!"));

        let snapshot = processor.metrics_snapshot();
        assert_eq!(snapshot.duplicate_chunks, 1);
        assert_eq!(snapshot.template_matches, 1);
        assert_eq!(snapshot.chunks_classified, 1);
        assert_eq!(snapshot.classification_failures, 1);
    }

    #[tokio::test]
    async fn categorize_accounts_for_blank_chunks() {
        let (client, prompts) =
            ScriptedClient::new(vec![Ok(r#"{"category": "Other"}"#.to_string())]);
        let processor = DocumentProcessor::new(&config(4, 0), Vec::new(), Some(Box::new(client)))
            .expect("processor");

        // Chunks: "memo", "    ", "\n\n\t "
        let (records, outcome) = processor
            .categorize(Path::new("memo.txt"), "memo    \n\n\t ", None)
            .await
            .expect("categorize");

        assert_eq!(outcome.chunk_count, 3);
        assert_eq!(outcome.skipped_blank, 2);
        assert_eq!(outcome.classified, 1);
        assert_eq!(bucket_total(&outcome), outcome.chunk_count);
        assert_eq!(records.len(), 1);
        assert_eq!(prompts.lock().expect("lock").len(), 1);
    }

    #[test]
    fn outcomes_accumulate_field_by_field() {
        let mut total = CategorizeOutcome::default();
        let document = CategorizeOutcome {
            chunk_count: 5,
            skipped_duplicates: 1,
            skipped_blank: 1,
            template_matches: 1,
            classified: 1,
            failed: 1,
        };
        total.accumulate(&document);
        total.accumulate(&document);
        assert_eq!(total.chunk_count, 10);
        assert_eq!(total.failed, 2);
        assert_eq!(bucket_total(&total), total.chunk_count);
    }

    #[test]
    fn classifier_requires_a_model_name() {
        let (client, _) = ScriptedClient::new(Vec::new());
        let config = Config {
            llm_model: String::new(),
            ..Config::default()
        };
        let result = DocumentProcessor::new(&config, Vec::new(), Some(Box::new(client)));
        assert!(matches!(result, Err(ProcessingError::Config(_))));
    }
}
