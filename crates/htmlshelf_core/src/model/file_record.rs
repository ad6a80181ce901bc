//! Uploaded document record.
//!
//! # Invariants
//! - `id` is generated once at ingestion and never changes afterwards.
//! - `content` is stored verbatim; nothing here sanitizes HTML.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

static HTML_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.html?$").expect("valid html extension regex"));

const ID_SUFFIX_LEN: usize = 9;

/// Opaque identifier of one uploaded file.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type FileId = String;

/// One uploaded HTML document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: FileId,
    /// Original file name as supplied by the uploader.
    pub name: String,
    pub content: String,
    /// Byte length reported by the upload source.
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
    /// Task-completion flag, the only field mutated after creation.
    #[serde(default)]
    pub completed: bool,
}

impl FileRecord {
    /// Creates a record for the `index`-th file of an upload batch.
    ///
    /// The id combines `uploaded_at`, the batch index and a random suffix so
    /// records from the same batch and millisecond stay distinct.
    pub fn ingested(
        index: usize,
        name: impl Into<String>,
        content: impl Into<String>,
        size: u64,
        uploaded_at: DateTime<Utc>,
    ) -> Self {
        Self::with_id(
            generate_file_id(uploaded_at, index),
            name,
            content,
            size,
            uploaded_at,
        )
    }

    /// Creates a record with a caller-provided id.
    ///
    /// Used when identity already exists, e.g. in tests and restores.
    pub fn with_id(
        id: impl Into<FileId>,
        name: impl Into<String>,
        content: impl Into<String>,
        size: u64,
        uploaded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            content: content.into(),
            size,
            uploaded_at,
            completed: false,
        }
    }

    /// Returns a copy with the completion flag set.
    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }
}

/// Returns whether `name` carries an `.html` or `.htm` extension
/// (case-insensitive).
pub fn is_html_name(name: &str) -> bool {
    HTML_NAME_RE.is_match(name)
}

/// Builds an id of the form `<epoch millis>-<index>-<random suffix>`.
pub fn generate_file_id(uploaded_at: DateTime<Utc>, index: usize) -> FileId {
    let random = Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}-{}",
        uploaded_at.timestamp_millis(),
        index,
        &random[..ID_SUFFIX_LEN]
    )
}

#[cfg(test)]
mod tests {
    use super::{generate_file_id, is_html_name, FileRecord};
    use chrono::Utc;

    #[test]
    fn html_names_are_matched_case_insensitively() {
        assert!(is_html_name("index.html"));
        assert!(is_html_name("INDEX.HTM"));
        assert!(is_html_name("report.v2.Html"));
        assert!(!is_html_name("notes.txt"));
        assert!(!is_html_name("page.html.bak"));
        assert!(!is_html_name("html"));
    }

    #[test]
    fn generated_ids_share_prefix_but_differ() {
        let now = Utc::now();
        let first = generate_file_id(now, 0);
        let second = generate_file_id(now, 0);
        let prefix = format!("{}-0-", now.timestamp_millis());

        assert!(first.starts_with(&prefix));
        assert_eq!(first.len(), prefix.len() + 9);
        assert_ne!(first, second);
    }

    #[test]
    fn ingested_record_starts_incomplete() {
        let record = FileRecord::ingested(3, "a.html", "<p>a</p>", 8, Utc::now());
        assert!(!record.completed);
        assert!(record.id.contains("-3-"));
    }
}
