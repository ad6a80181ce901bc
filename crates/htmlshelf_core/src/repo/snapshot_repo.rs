//! Snapshot repository contract and implementations.
//!
//! # Responsibility
//! - Read and write the single snapshot record under [`SNAPSHOT_KEY`].
//! - Open the backing database lazily, on first use.
//!
//! # Invariants
//! - A write replaces the whole record inside one transaction.
//! - Reads decode through [`PersistedSnapshot::from_json`], so callers never
//!   see partially valid data.

use crate::db::{open_db, open_db_in_memory, DbError, STORE_TABLE};
use crate::model::snapshot::{PersistedSnapshot, SnapshotDecodeError, SNAPSHOT_KEY};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

pub type StorageResult<T> = Result<T, StorageError>;

/// Storage failures. None of them is fatal to the application.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("persistence backend unavailable")]
    Unavailable,
    #[error("failed to open snapshot store: {0}")]
    Open(#[source] DbError),
    #[error("snapshot write failed: {0}")]
    WriteFailed(#[source] DbError),
    #[error("snapshot read failed: {0}")]
    ReadFailed(#[source] DbError),
    #[error("snapshot encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("invalid persisted snapshot: {0}")]
    InvalidData(#[from] SnapshotDecodeError),
}

/// Where snapshot data lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageTarget {
    File(PathBuf),
    /// Private in-memory database; lives as long as the repository.
    Memory,
    /// No persistence backend in this environment.
    Unavailable,
}

/// Storage contract for the persisted snapshot.
pub trait SnapshotRepository: Send + Sync {
    /// Establishes the backend connection if needed. Idempotent.
    fn open(&self) -> StorageResult<()>;
    fn save_snapshot(&self, snapshot: &PersistedSnapshot) -> StorageResult<()>;
    /// Returns `None` when no snapshot has been written yet.
    fn load_snapshot(&self) -> StorageResult<Option<PersistedSnapshot>>;
}

/// SQLite-backed repository holding one lazily opened connection.
#[derive(Debug)]
pub struct SqliteSnapshotRepository {
    target: StorageTarget,
    conn: Mutex<Option<Connection>>,
}

impl SqliteSnapshotRepository {
    pub fn new(target: StorageTarget) -> Self {
        Self {
            target,
            conn: Mutex::new(None),
        }
    }

    pub fn at_path(path: impl AsRef<Path>) -> Self {
        Self::new(StorageTarget::File(path.as_ref().to_path_buf()))
    }

    pub fn in_memory() -> Self {
        Self::new(StorageTarget::Memory)
    }

    pub fn unavailable() -> Self {
        Self::new(StorageTarget::Unavailable)
    }

    pub fn target(&self) -> &StorageTarget {
        &self.target
    }

    fn connection(&self) -> StorageResult<MutexGuard<'_, Option<Connection>>> {
        let mut guard = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.is_none() {
            let conn = match &self.target {
                StorageTarget::File(path) => open_db(path),
                StorageTarget::Memory => open_db_in_memory(),
                StorageTarget::Unavailable => return Err(StorageError::Unavailable),
            }
            .map_err(StorageError::Open)?;
            *guard = Some(conn);
        }
        Ok(guard)
    }
}

impl SnapshotRepository for SqliteSnapshotRepository {
    fn open(&self) -> StorageResult<()> {
        self.connection().map(drop)
    }

    fn save_snapshot(&self, snapshot: &PersistedSnapshot) -> StorageResult<()> {
        let encoded = snapshot.to_json()?;
        let mut guard = self.connection()?;
        let Some(conn) = guard.as_mut() else {
            return Err(StorageError::Unavailable);
        };

        write_record(conn, &encoded).map_err(|err| StorageError::WriteFailed(err.into()))
    }

    fn load_snapshot(&self) -> StorageResult<Option<PersistedSnapshot>> {
        let guard = self.connection()?;
        let Some(conn) = guard.as_ref() else {
            return Err(StorageError::Unavailable);
        };

        let raw: Option<String> = conn
            .query_row(
                &format!("SELECT value FROM {STORE_TABLE} WHERE key = ?1;"),
                [SNAPSHOT_KEY],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| StorageError::ReadFailed(err.into()))?;

        match raw {
            Some(raw) => Ok(Some(PersistedSnapshot::from_json(&raw)?)),
            None => Ok(None),
        }
    }
}

fn write_record(conn: &mut Connection, encoded: &str) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;
    tx.execute(
        &format!(
            "INSERT INTO {STORE_TABLE} (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = (strftime('%s', 'now') * 1000);"
        ),
        params![SNAPSHOT_KEY, encoded],
    )?;
    tx.commit()
}

/// Process-local repository keeping the encoded document in memory.
///
/// Goes through the same JSON encoding as SQLite, which makes it a faithful
/// stand-in for tests and for sessions that opt out of disk persistence.
#[derive(Debug, Default)]
pub struct MemorySnapshotRepository {
    document: Mutex<Option<String>>,
    saves: AtomicUsize,
}

impl MemorySnapshotRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the repository with a raw stored document.
    pub fn with_document(raw: impl Into<String>) -> Self {
        Self {
            document: Mutex::new(Some(raw.into())),
            saves: AtomicUsize::new(0),
        }
    }

    /// Raw document as last written.
    pub fn document(&self) -> Option<String> {
        self.document
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of successful writes so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl SnapshotRepository for MemorySnapshotRepository {
    fn open(&self) -> StorageResult<()> {
        Ok(())
    }

    fn save_snapshot(&self, snapshot: &PersistedSnapshot) -> StorageResult<()> {
        let encoded = snapshot.to_json()?;
        *self.document.lock().unwrap_or_else(PoisonError::into_inner) = Some(encoded);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn load_snapshot(&self) -> StorageResult<Option<PersistedSnapshot>> {
        match self.document() {
            Some(raw) => Ok(Some(PersistedSnapshot::from_json(&raw)?)),
            None => Ok(None),
        }
    }
}

impl<R: SnapshotRepository + ?Sized> SnapshotRepository for std::sync::Arc<R> {
    fn open(&self) -> StorageResult<()> {
        (**self).open()
    }

    fn save_snapshot(&self, snapshot: &PersistedSnapshot) -> StorageResult<()> {
        (**self).save_snapshot(snapshot)
    }

    fn load_snapshot(&self) -> StorageResult<Option<PersistedSnapshot>> {
        (**self).load_snapshot()
    }
}
