//! Persisted snapshot format.
//!
//! # Responsibility
//! - Define the single durable record written under [`SNAPSHOT_KEY`].
//! - Coerce raw stored JSON into typed records at the load boundary.
//!
//! # Invariants
//! - Written documents always use the current field names and RFC 3339
//!   timestamps.
//! - Decoding never yields duplicate ids; later duplicates are dropped.
//! - Malformed documents fail decoding as a whole; callers degrade to
//!   [`PersistedSnapshot::empty`].

use crate::model::file_record::{FileId, FileRecord};
use chrono::{DateTime, NaiveDateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Fixed record key inside the object store.
pub const SNAPSHOT_KEY: &str = "state";

const NAIVE_TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

/// Complete durable representation of files, selection and the UI flag.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSnapshot {
    pub files: Vec<FileRecord>,
    pub selected_file_id: Option<FileId>,
    pub hide_aside: bool,
}

/// Failure to turn a stored document into a [`PersistedSnapshot`].
#[derive(Debug, thiserror::Error)]
pub enum SnapshotDecodeError {
    #[error("snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("file #{index}: field `{field}` is invalid: {reason}")]
    InvalidField {
        index: usize,
        field: &'static str,
        reason: String,
    },
}

impl PersistedSnapshot {
    /// Snapshot used when nothing is stored or storage cannot be read.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Decodes a stored document, tolerating older and looser layouts.
    ///
    /// Accepted variations:
    /// - `files` or `selectedFileId` missing or `null`.
    /// - `hideAside` spelled `hideAsideFlag`, or missing (defaults to `false`).
    /// - `completed` missing (older records default to `false`).
    /// - `uploadedAt` as RFC 3339, a zone-less date-time (read as UTC), or
    ///   epoch milliseconds.
    /// - An empty `selectedFileId` string, read as no selection.
    pub fn from_json(raw: &str) -> Result<Self, SnapshotDecodeError> {
        let stored: StoredSnapshot = serde_json::from_str(raw)?;

        let mut seen = HashSet::new();
        let mut files = Vec::new();
        for (index, file) in stored.files.unwrap_or_default().into_iter().enumerate() {
            let record = file.into_record(index)?;
            if !seen.insert(record.id.clone()) {
                warn!(
                    "event=snapshot_decode module=model status=duplicate_dropped index={} id={}",
                    index, record.id
                );
                continue;
            }
            files.push(record);
        }

        Ok(Self {
            files,
            selected_file_id: stored.selected_file_id.filter(|id| !id.is_empty()),
            hide_aside: stored.hide_aside.unwrap_or(false),
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSnapshot {
    #[serde(default)]
    files: Option<Vec<StoredFile>>,
    #[serde(default)]
    selected_file_id: Option<String>,
    #[serde(default, alias = "hideAsideFlag")]
    hide_aside: Option<bool>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredFile {
    id: String,
    name: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    size: Option<Value>,
    uploaded_at: Value,
    #[serde(default)]
    completed: Option<bool>,
}

impl StoredFile {
    fn into_record(self, index: usize) -> Result<FileRecord, SnapshotDecodeError> {
        if self.id.trim().is_empty() {
            return Err(invalid(index, "id", "empty id"));
        }

        let size = match self.size {
            None | Some(Value::Null) => self.content.len() as u64,
            Some(value) => parse_size(&value)
                .ok_or_else(|| invalid(index, "size", format!("unsupported value {value}")))?,
        };

        let uploaded_at = parse_timestamp(&self.uploaded_at).ok_or_else(|| {
            invalid(
                index,
                "uploadedAt",
                format!("unsupported value {}", self.uploaded_at),
            )
        })?;

        Ok(FileRecord {
            id: self.id,
            name: self.name,
            content: self.content,
            size,
            uploaded_at,
            completed: self.completed.unwrap_or(false),
        })
    }
}

fn invalid(index: usize, field: &'static str, reason: impl Into<String>) -> SnapshotDecodeError {
    SnapshotDecodeError::InvalidField {
        index,
        field,
        reason: reason.into(),
    }
}

fn parse_size(value: &Value) -> Option<u64> {
    if let Some(size) = value.as_u64() {
        return Some(size);
    }
    // JSON numbers written by other producers may carry a fraction part.
    value
        .as_f64()
        .filter(|size| size.is_finite() && *size >= 0.0 && size.fract() == 0.0)
        .map(|size| size as u64)
}

/// Reconstructs a point in time from a stored timestamp value.
fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(text) => parse_timestamp_text(text.trim()),
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|millis| millis as i64))
            .and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

fn parse_timestamp_text(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| naive.and_utc())
}
