//! SQLite storage bootstrap and schema migration entry points.
//!
//! # Responsibility
//! - Open and configure SQLite connections backing the snapshot store.
//! - Apply schema migrations in deterministic order.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Snapshot reads/writes never run before migrations succeed.

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

/// Fixed file name of the snapshot database inside the data directory.
pub const DB_FILE_NAME: &str = "html-files.sqlite3";

/// Single object store (table) holding the persisted snapshot.
pub const STORE_TABLE: &str = "files";

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error("database schema version {db_version} is newer than supported {latest_supported}")]
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    #[error("failed to create database directory `{path}`: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
