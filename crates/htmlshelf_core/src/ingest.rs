//! Upload ingestion boundary.
//!
//! # Responsibility
//! - Read a batch of upload sources into [`FileRecord`]s.
//! - Reject non-HTML names and unreadable content per file, without
//!   aborting the rest of the batch.
//! - Derive user-facing notices for a finished batch.
//!
//! # Invariants
//! - Sources are read sequentially, in input order; accepted records keep
//!   that order.
//! - Nothing in this module touches container state.

use crate::model::file_record::{is_html_name, FileId, FileRecord};
use async_trait::async_trait;
use chrono::Utc;
use std::io;
use std::path::{Path, PathBuf};

/// One file handed over by a selection or drop surface.
#[async_trait]
pub trait UploadSource: Send + Sync {
    fn name(&self) -> &str;
    /// Byte length as reported by the source.
    fn size(&self) -> u64;
    /// Reads the full body as UTF-8 text.
    async fn read_text(&self) -> io::Result<String>;
}

#[async_trait]
impl<T: UploadSource + ?Sized> UploadSource for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn size(&self) -> u64 {
        (**self).size()
    }

    async fn read_text(&self) -> io::Result<String> {
        (**self).read_text().await
    }
}

/// Upload backed by a file on the local file system.
#[derive(Debug, Clone)]
pub struct LocalFile {
    path: PathBuf,
    name: String,
    size: u64,
}

impl LocalFile {
    /// Captures name and size from file metadata.
    pub fn new(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let metadata = std::fs::metadata(&path)?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            path,
            name,
            size: metadata.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl UploadSource for LocalFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.size
    }

    async fn read_text(&self) -> io::Result<String> {
        tokio::fs::read_to_string(&self.path).await
    }
}

/// Upload whose bytes are already in memory.
#[derive(Debug, Clone)]
pub struct InMemoryUpload {
    name: String,
    bytes: Vec<u8>,
}

impl InMemoryUpload {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

#[async_trait]
impl UploadSource for InMemoryUpload {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    async fn read_text(&self) -> io::Result<String> {
        String::from_utf8(self.bytes.clone())
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
    }
}

/// Per-file rejection reported to the user.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("{name}: Invalid file type. Only .html and .htm files are allowed.")]
    InvalidExtension { name: String },
    #[error("{name}: Failed to read file content.")]
    Unreadable {
        name: String,
        #[source]
        source: io::Error,
    },
}

impl IngestError {
    pub fn file_name(&self) -> &str {
        match self {
            Self::InvalidExtension { name } | Self::Unreadable { name, .. } => name,
        }
    }
}

/// Result of reading one batch, before anything is added to a store.
#[derive(Debug)]
pub struct IngestBatch {
    pub accepted: Vec<FileRecord>,
    pub rejected: Vec<IngestError>,
    pub total: usize,
}

impl IngestBatch {
    /// Splits into the records to add and the report for the caller.
    pub fn into_parts(self) -> (Vec<FileRecord>, IngestReport) {
        let added = self.accepted.iter().map(|file| file.id.clone()).collect();
        let report = IngestReport {
            added,
            rejected: self.rejected,
            total: self.total,
        };
        (self.accepted, report)
    }
}

/// Outcome of an ingestion as seen by the caller.
#[derive(Debug)]
pub struct IngestReport {
    /// Ids of records added, in input order.
    pub added: Vec<FileId>,
    pub rejected: Vec<IngestError>,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Discrete user notification produced by an ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub description: String,
}

impl IngestReport {
    /// One error notice per rejected file, then a success notice when
    /// anything was added.
    pub fn notices(&self) -> Vec<Notice> {
        let mut notices: Vec<Notice> = self
            .rejected
            .iter()
            .map(|err| Notice {
                kind: NoticeKind::Error,
                title: "Upload Error".to_string(),
                description: err.to_string(),
            })
            .collect();

        let added = self.added.len();
        if added > 0 {
            notices.push(Notice {
                kind: NoticeKind::Success,
                title: "Files Uploaded".to_string(),
                description: format!(
                    "{added} file{} uploaded successfully.",
                    if added > 1 { "s" } else { "" }
                ),
            });
        }
        notices
    }
}

/// Reads `sources` into records, validating each one independently.
pub async fn read_batch<S: UploadSource>(sources: &[S]) -> IngestBatch {
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();

    for (index, source) in sources.iter().enumerate() {
        let name = source.name();
        if !is_html_name(name) {
            rejected.push(IngestError::InvalidExtension {
                name: name.to_string(),
            });
            continue;
        }

        match source.read_text().await {
            Ok(content) => accepted.push(FileRecord::ingested(
                index,
                name,
                content,
                source.size(),
                Utc::now(),
            )),
            Err(source_err) => rejected.push(IngestError::Unreadable {
                name: name.to_string(),
                source: source_err,
            }),
        }
    }

    IngestBatch {
        accepted,
        rejected,
        total: sources.len(),
    }
}
