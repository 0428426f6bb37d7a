//! Metadata derived from where a document sits in the archive tree.
//!
//! Archives are laid out as `<root>/<client>/[<year>/]<project>/.../<file>`. Only directory
//! components are considered; the file name itself never becomes a client or project.

use serde::Serialize;
use std::path::{Component, Path};

/// Client, year, and project inferred from a document's folder path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FolderMetadata {
    /// First directory below the root.
    pub client_name: Option<String>,
    /// First directory whose name is exactly four ASCII digits.
    pub year: Option<String>,
    /// Directory after the year, or the second directory when there is no year.
    pub project_title: Option<String>,
}

/// Derive [`FolderMetadata`] for `file` relative to `root`.
///
/// Returns empty metadata when `file` is not located under `root`.
pub fn extract_folder_metadata(file: &Path, root: &Path) -> FolderMetadata {
    let Ok(relative) = file.strip_prefix(root) else {
        tracing::trace!(file = %file.display(), root = %root.display(), "File outside root");
        return FolderMetadata::default();
    };

    let mut parts: Vec<String> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    // Drop the file name; only folders carry metadata.
    parts.pop();

    let mut metadata = FolderMetadata {
        client_name: parts.first().cloned(),
        ..FolderMetadata::default()
    };

    if let Some(index) = parts.iter().position(|part| is_year(part)) {
        metadata.year = Some(parts[index].clone());
        metadata.project_title = parts.get(index + 1).cloned();
    } else {
        metadata.project_title = parts.get(1).cloned();
    }

    metadata
}

fn is_year(part: &str) -> bool {
    part.len() == 4 && part.bytes().all(|byte| byte.is_ascii_digit())
}
