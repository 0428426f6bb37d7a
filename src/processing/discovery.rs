//! Locate the documents a run should process.

use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Extensions read as plain-text documents.
pub const DOCUMENT_EXTENSIONS: &[&str] = &["txt", "md"];

/// Which files below a folder take part in a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentSelection {
    /// Descend into subfolders instead of only listing the folder itself.
    pub recursive: bool,
    /// Keep only files whose name contains this text, ignoring case.
    pub name_filter: Option<String>,
}

/// Errors raised while listing documents.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Path does not exist.
    #[error("Document path not found: {}", path.display())]
    NotFound {
        /// Requested path.
        path: PathBuf,
    },
    /// Folder traversal failed.
    #[error("Failed to list documents under {}: {source}", path.display())]
    Walk {
        /// Entry being visited when the failure occurred.
        path: PathBuf,
        /// Underlying traversal error.
        #[source]
        source: walkdir::Error,
    },
}

/// Expand `path` into the documents to process, in a stable order.
///
/// A file is returned as-is, whatever its extension. A folder yields its `.txt`/`.md` files
/// depth first in file-name order, filtered by `selection`.
pub fn discover_documents(
    path: &Path,
    selection: &DocumentSelection,
) -> Result<Vec<PathBuf>, DiscoveryError> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(DiscoveryError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let filter = selection
        .name_filter
        .as_deref()
        .map(str::to_lowercase)
        .filter(|filter| !filter.is_empty());
    let mut walker = WalkDir::new(path).min_depth(1).sort_by_file_name();
    if !selection.recursive {
        walker = walker.max_depth(1);
    }

    let mut documents = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|source| DiscoveryError::Walk {
            path: source
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| path.to_path_buf()),
            source,
        })?;
        if !entry.file_type().is_file() || !is_document(entry.path()) {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_lowercase();
        if filter.as_deref().is_some_and(|filter| !name.contains(filter)) {
            continue;
        }
        documents.push(entry.into_path());
    }

    tracing::debug!(
        path = %path.display(),
        recursive = selection.recursive,
        documents = documents.len(),
        "Discovered documents"
    );
    Ok(documents)
}

fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            DOCUMENT_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}
