//! Uploaded file ownership.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, error};
use uuid::Uuid;

use crate::extract::DocumentFormat;

/// Longest sanitized name kept in a stored file name, in chars.
const MAX_STORED_NAME_CHARS: usize = 100;

/// A stored upload, owned by one analysis request.
///
/// The file is deleted when the artifact is dropped, so it is removed on
/// every exit path of the request that owns it.
#[derive(Debug)]
pub struct UploadedArtifact {
    path: PathBuf,
    original_name: String,
    format: DocumentFormat,
}

impl UploadedArtifact {
    /// Take ownership of the file at `path`, uploaded as `original_name`.
    pub fn new(path: impl Into<PathBuf>, original_name: impl Into<String>) -> Self {
        let original_name = original_name.into();
        let format = DocumentFormat::from_file_name(&original_name);
        Self {
            path: path.into(),
            original_name,
            format,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }
}

/// Unique on-disk name for an upload: `<millis>-<uuid>-<sanitized name>`.
///
/// The sanitized name keeps only ASCII alphanumerics, `.`, `-` and `_`, and
/// lowercases the extension so spreadsheet readers recognize it.
pub fn stored_file_name(original_name: &str) -> String {
    format!(
        "{}-{}-{}",
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple(),
        sanitize_file_name(original_name)
    )
}

fn sanitize_file_name(original_name: &str) -> String {
    let base = original_name
        .rsplit(&['/', '\\'][..])
        .next()
        .unwrap_or(original_name);

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    let (stem, extension) = match cleaned.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext.to_ascii_lowercase())),
        _ => (cleaned, None),
    };
    let stem: String = stem.chars().take(MAX_STORED_NAME_CHARS).collect();
    let stem = if stem.is_empty() { "upload".to_string() } else { stem };

    match extension {
        Some(ext) if !ext.is_empty() => format!("{}.{}", stem, ext),
        _ => stem,
    }
}

impl Drop for UploadedArtifact {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed uploaded file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Uploaded file already gone")
            }
            Err(e) => error!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove uploaded file"
            ),
        }
    }
}
