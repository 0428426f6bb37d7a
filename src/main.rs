use std::{
    fs,
    io::{self, BufWriter, StdoutLock, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use doctriage::{
    config::{self, Config},
    llm::get_completion_client,
    logging,
    metrics::RunMetrics,
    processing::{
        CategorizeOutcome, ChunkMatch, DocumentProcessor, DocumentSelection, discover_documents,
    },
    templates::{StorePresence, harvest_templates, load_templates, save_templates},
};
use serde::Serialize;

#[derive(Parser)]
#[command(
    name = "doctriage",
    version,
    about = "Chunk documents, filter template boilerplate, and categorize what remains"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the chunk records of documents as JSON lines.
    Chunk {
        #[command(flatten)]
        documents: DocumentArgs,
        #[arg(long)]
        chunk_size: Option<usize>,
        #[arg(long)]
        overlap: Option<usize>,
        /// Archive root used to derive client, year, and project from the file's folders.
        #[arg(long)]
        root: Option<PathBuf>,
    },
    /// Manage the template store.
    Templates {
        #[command(subcommand)]
        command: TemplatesCommand,
    },
    /// Print the best template match of every chunk as JSON lines.
    Match {
        #[command(flatten)]
        documents: DocumentArgs,
        #[arg(long)]
        store: Option<PathBuf>,
        #[arg(long)]
        threshold: Option<f64>,
    },
    /// Classify the non-template chunks of documents and print enriched records.
    Categorize {
        #[command(flatten)]
        documents: DocumentArgs,
        #[arg(long)]
        store: Option<PathBuf>,
        #[arg(long)]
        threshold: Option<f64>,
        #[arg(long)]
        root: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum TemplatesCommand {
    /// Replace the store with the `.txt`/`.md` files found in a directory.
    Import {
        dir: PathBuf,
        #[arg(long)]
        store: Option<PathBuf>,
    },
    /// List stored templates.
    List {
        #[arg(long)]
        store: Option<PathBuf>,
    },
}

/// A document, or a folder of `.txt`/`.md` documents.
#[derive(Args)]
struct DocumentArgs {
    path: PathBuf,
    /// Include documents in subfolders.
    #[arg(short, long)]
    recursive: bool,
    /// Only process files whose name contains this text (case-insensitive).
    #[arg(short, long)]
    filter: Option<String>,
}

impl DocumentArgs {
    fn resolve(self) -> Result<Vec<PathBuf>> {
        let selection = DocumentSelection {
            recursive: self.recursive,
            name_filter: self.filter,
        };
        let documents = discover_documents(&self.path, &selection)?;
        if documents.is_empty() {
            tracing::warn!(path = %self.path.display(), "No documents selected");
        }
        Ok(documents)
    }
}

#[derive(Serialize)]
struct TemplateListing<'a> {
    template_name: &'a str,
    chars: usize,
}

#[derive(Serialize)]
struct ImportSummary<'a> {
    store: &'a Path,
    imported: usize,
}

#[derive(Serialize)]
struct SourcedMatch<'a> {
    source: &'a Path,
    #[serde(flatten)]
    result: ChunkMatch,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing();
    let mut config = config::load().context("failed to load configuration")?;

    match cli.command {
        Command::Chunk {
            documents,
            chunk_size,
            overlap,
            root,
        } => {
            if let Some(chunk_size) = chunk_size {
                config.chunk_size = chunk_size;
            }
            if let Some(overlap) = overlap {
                config.chunk_overlap = overlap;
            }
            chunk_documents(&config, &documents.resolve()?, root.as_deref())
        }
        Command::Templates { command } => match command {
            TemplatesCommand::Import { dir, store } => {
                import_templates(&dir, &store.unwrap_or(config.template_db))
            }
            TemplatesCommand::List { store } => {
                list_templates(&store.unwrap_or(config.template_db))
            }
        },
        Command::Match {
            documents,
            store,
            threshold,
        } => {
            apply_store_overrides(&mut config, store, threshold)?;
            match_documents(&config, &documents.resolve()?)
        }
        Command::Categorize {
            documents,
            store,
            threshold,
            root,
        } => {
            apply_store_overrides(&mut config, store, threshold)?;
            categorize_documents(&config, &documents.resolve()?, root.as_deref()).await
        }
    }
}

fn apply_store_overrides(
    config: &mut Config,
    store: Option<PathBuf>,
    threshold: Option<f64>,
) -> Result<()> {
    if let Some(store) = store {
        config.template_db = store;
    }
    if let Some(threshold) = threshold {
        if !(0.0..=1.0).contains(&threshold) {
            bail!("--threshold must be between 0 and 1, got {threshold}");
        }
        config.template_threshold = threshold;
    }
    Ok(())
}

fn chunk_documents(config: &Config, documents: &[PathBuf], root: Option<&Path>) -> Result<()> {
    let processor = DocumentProcessor::new(config, Vec::new(), None)?;
    let mut out = stdout_lines();
    for document in documents {
        let Some(text) = read_document(document, documents.len())? else {
            continue;
        };
        emit_lines(&mut out, &processor.chunk_document(document, &text, root))?;
    }
    out.flush()?;

    let snapshot = processor.metrics_snapshot();
    tracing::info!(
        documents = snapshot.documents_processed,
        chunks = snapshot.chunks_produced,
        "Chunking complete"
    );
    Ok(())
}

fn import_templates(dir: &Path, store: &Path) -> Result<()> {
    let templates = harvest_templates(dir)
        .with_context(|| format!("failed to harvest templates from {}", dir.display()))?;
    save_templates(&templates, store)?;
    tracing::info!(
        dir = %dir.display(),
        store = %store.display(),
        count = templates.len(),
        "Imported templates"
    );
    let mut out = stdout_lines();
    emit_lines(
        &mut out,
        &[ImportSummary {
            store,
            imported: templates.len(),
        }],
    )?;
    out.flush()?;
    Ok(())
}

fn list_templates(store: &Path) -> Result<()> {
    let templates = load_templates(store, StorePresence::Required)?;
    let listings: Vec<TemplateListing<'_>> = templates
        .iter()
        .map(|template| TemplateListing {
            template_name: &template.template_name,
            chars: template.content.chars().count(),
        })
        .collect();
    let mut out = stdout_lines();
    emit_lines(&mut out, &listings)?;
    out.flush()?;
    Ok(())
}

fn match_documents(config: &Config, documents: &[PathBuf]) -> Result<()> {
    let templates = load_templates(&config.template_db, StorePresence::Optional)?;
    let processor = DocumentProcessor::new(config, templates, None)?;
    if processor.templates().is_empty() {
        tracing::warn!(
            store = %config.template_db.display(),
            "No templates loaded; nothing can match"
        );
    }

    let mut out = stdout_lines();
    for document in documents {
        let Some(text) = read_document(document, documents.len())? else {
            continue;
        };
        let matches: Vec<SourcedMatch<'_>> = processor
            .match_chunks(&text)
            .into_iter()
            .map(|result| SourcedMatch {
                source: document,
                result,
            })
            .collect();
        emit_lines(&mut out, &matches)?;
    }
    out.flush()?;
    Ok(())
}

async fn categorize_documents(
    config: &Config,
    documents: &[PathBuf],
    root: Option<&Path>,
) -> Result<()> {
    let templates = load_templates(&config.template_db, StorePresence::Optional)?;
    let client = get_completion_client(config)?;
    let metrics = Arc::new(RunMetrics::new());
    let processor =
        DocumentProcessor::new(config, templates, client)?.with_metrics(Arc::clone(&metrics));

    let mut out = stdout_lines();
    let mut totals = CategorizeOutcome::default();
    for document in documents {
        let Some(text) = read_document(document, documents.len())? else {
            continue;
        };
        let (records, outcome) = processor.categorize(document, &text, root).await?;
        emit_lines(&mut out, &records)?;
        totals.accumulate(&outcome);
    }
    out.flush()?;

    let snapshot = metrics.snapshot();
    tracing::info!(
        documents = snapshot.documents_processed,
        chunks = snapshot.chunks_produced,
        duplicates = snapshot.duplicate_chunks,
        template_matches = snapshot.template_matches,
        classified = snapshot.chunks_classified,
        failures = snapshot.classification_failures,
        "Run complete"
    );
    if totals.classified == 0 && totals.failed > 0 {
        bail!(
            "classification failed for all {} candidate chunks",
            totals.failed
        );
    }
    Ok(())
}

/// Read a document as UTF-8, replacing invalid sequences.
///
/// In a multi-document run an unreadable file is logged and skipped (`Ok(None)`).
fn read_document(path: &Path, batch_size: usize) -> Result<Option<String>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
        Err(error) if batch_size > 1 => {
            tracing::warn!(path = %path.display(), %error, "Skipping unreadable document");
            Ok(None)
        }
        Err(error) => Err(error).with_context(|| format!("failed to read {}", path.display())),
    }
}

fn stdout_lines() -> BufWriter<StdoutLock<'static>> {
    BufWriter::new(io::stdout().lock())
}

fn emit_lines<T: Serialize>(out: &mut impl Write, items: &[T]) -> Result<()> {
    for item in items {
        serde_json::to_writer(&mut *out, item).context("failed to serialize output")?;
        out.write_all(b"\n")?;
    }
    Ok(())
}
