//! JSON persistence for the template set.
//!
//! The store is a single JSON array of `{ "template_name": ..., "content": ... }` records, in
//! matching order. Saves write a sibling temp file and rename it over the destination, so a
//! crash leaves either the previous contents or the new ones, never a truncated file.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::types::{StorePresence, Template, TemplateStoreError};

/// Read the template set from `path`.
///
/// A missing file yields an empty set unless `presence` is [`StorePresence::Required`].
pub fn load_templates(
    path: &Path,
    presence: StorePresence,
) -> Result<Vec<Template>, TemplateStoreError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == ErrorKind::NotFound => {
            return match presence {
                StorePresence::Optional => {
                    tracing::debug!(
                        path = %path.display(),
                        "Template store absent; starting empty"
                    );
                    Ok(Vec::new())
                }
                StorePresence::Required => Err(TemplateStoreError::NotFound {
                    path: path.to_path_buf(),
                }),
            };
        }
        Err(source) => {
            return Err(TemplateStoreError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let templates: Vec<Template> =
        serde_json::from_str(&raw).map_err(|source| TemplateStoreError::DataFormat {
            path: path.to_path_buf(),
            source,
        })?;
    tracing::debug!(path = %path.display(), count = templates.len(), "Loaded templates");
    Ok(templates)
}

/// Replace the contents of `path` with `templates`.
pub fn save_templates(templates: &[Template], path: &Path) -> Result<(), TemplateStoreError> {
    let body = serde_json::to_string_pretty(templates).map_err(|source| {
        TemplateStoreError::DataFormat {
            path: path.to_path_buf(),
            source,
        }
    })?;

    let tmp_path = temp_path_for(path);
    let io_error = |source: std::io::Error| TemplateStoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Err(source) = fs::write(&tmp_path, body).and_then(|()| fs::rename(&tmp_path, path)) {
        let _ = fs::remove_file(&tmp_path);
        return Err(io_error(source));
    }

    tracing::debug!(path = %path.display(), count = templates.len(), "Saved templates");
    Ok(())
}

/// Unique temp file next to `path`, so the final rename stays on one filesystem.
fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "templates".to_string());
    path.with_file_name(format!(".{file_name}.tmp.{}", uuid::Uuid::new_v4()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Template> {
        vec![
            Template::new("sow.txt", "This Scope of Work outlines the responsibilities"),
            Template::new("nda.txt", "Mutual non-disclosure\nagreement"),
        ]
    }

    #[test]
    fn round_trip_preserves_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("template_db.json");
        save_templates(&sample(), &path).expect("save");
        let loaded = load_templates(&path, StorePresence::Required).expect("load");
        assert_eq!(loaded, sample());
    }

    #[test]
    fn save_overwrites_previous_contents_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("template_db.json");
        save_templates(&sample(), &path).expect("first save");
        let replacement = vec![Template::new("only", "one")];
        save_templates(&replacement, &path).expect("second save");

        assert_eq!(
            load_templates(&path, StorePresence::Optional).expect("load"),
            replacement
        );
        let entries: Vec<_> = fs::read_dir(dir.path())
            .expect("read dir")
            .filter_map(Result::ok)
            .collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn saved_file_is_pretty_json_array() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("store.json");
        save_templates(&sample()[..1], &path).expect("save");
        let raw = fs::read_to_string(&path).expect("read");
        assert!(raw.starts_with("[\n  {\n    \"template_name\": \"sow.txt\""));
    }

    #[test]
    fn failed_save_leaves_no_temp_file_behind() {
        let dir = tempfile::tempdir().expect("tempdir");
        // A directory at the destination makes the final rename fail after the write succeeded.
        let path = dir.path().join("template_db.json");
        fs::create_dir(&path).expect("mkdir");
        fs::write(path.join("occupant"), "x").expect("write");

        let error = save_templates(&sample(), &path).expect_err("rename over directory");
        assert!(matches!(error, TemplateStoreError::Io { .. }));

        let names: Vec<_> = fs::read_dir(dir.path())
            .expect("read dir")
            .filter_map(Result::ok)
            .map(|entry| entry.file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("template_db.json")]);
    }

    #[test]
    fn failed_write_leaves_no_temp_file_behind() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing_parent").join("template_db.json");

        let error = save_templates(&sample(), &path).expect_err("parent missing");
        assert!(matches!(error, TemplateStoreError::Io { .. }));
        assert_eq!(fs::read_dir(dir.path()).expect("read dir").count(), 0);
    }

    #[test]
    fn missing_optional_store_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("absent.json");
        let loaded = load_templates(&path, StorePresence::Optional).expect("load");
        assert!(loaded.is_empty());
    }

    #[test]
    fn missing_required_store_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("absent.json");
        let error = load_templates(&path, StorePresence::Required).expect_err("missing");
        assert!(matches!(error, TemplateStoreError::NotFound { .. }));
    }

    #[test]
    fn malformed_store_is_data_format_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.json");
        for body in [
            "{\"template_name\": \"a\", \"content\": \"b\"}",
            "[\"just a string\"]",
            "[{\"name\": \"a\", \"content\": \"b\"}]",
            "[{\"template_name\": \"a\"}]",
            "not json",
        ] {
            fs::write(&path, body).expect("write");
            let error = load_templates(&path, StorePresence::Optional).expect_err(body);
            assert!(
                matches!(error, TemplateStoreError::DataFormat { .. }),
                "{body}"
            );
        }
    }

    #[test]
    fn empty_array_is_a_valid_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("empty.json");
        fs::write(&path, "[]").expect("write");
        assert!(
            load_templates(&path, StorePresence::Required)
                .expect("load")
                .is_empty()
        );
    }
}
