//! Build a template set from a directory of plain-text boilerplate documents.

use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use super::types::{Template, TemplateStoreError};

const TEMPLATE_EXTENSIONS: &[&str] = &["txt", "md"];

/// Read every `.txt`/`.md` file directly inside `dir` as a template, ordered by file name.
///
/// Each template is named after its file. Its content keeps only non-blank lines, trimmed and
/// joined with `\n`, so layout noise does not affect similarity scores.
pub fn harvest_templates(dir: &Path) -> Result<Vec<Template>, TemplateStoreError> {
    let mut templates = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|error| TemplateStoreError::Io {
            path: error
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| dir.to_path_buf()),
            source: error.into(),
        })?;
        if !entry.file_type().is_file() || !has_template_extension(entry.path()) {
            continue;
        }

        let bytes = fs::read(entry.path()).map_err(|source| TemplateStoreError::Io {
            path: entry.path().to_path_buf(),
            source,
        })?;
        let content = normalize_template_text(&String::from_utf8_lossy(&bytes));
        let template_name = entry.file_name().to_string_lossy().into_owned();
        tracing::debug!(
            template = %template_name,
            chars = content.chars().count(),
            "Harvested template"
        );
        templates.push(Template::new(template_name, content));
    }

    Ok(templates)
}

/// Keep non-blank lines, trimmed, joined with `\n`.
pub fn normalize_template_text(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn has_template_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            TEMPLATE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}
