//! Core of htmlshelf: uploaded HTML files kept in a reactive in-memory
//! store and mirrored to an embedded SQLite snapshot.
//!
//! Startup goes through [`Hydration`], which yields the [`FilesStore`];
//! every mutation after that is written behind to storage.

pub mod config;
pub mod db;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;
pub mod view;

pub use config::{ConfigError, ShelfConfig};
pub use ingest::{
    IngestError, IngestReport, InMemoryUpload, LocalFile, Notice, NoticeKind, UploadSource,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::app_state::AppState;
pub use model::file_record::{is_html_name, FileId, FileRecord};
pub use model::snapshot::{PersistedSnapshot, SNAPSHOT_KEY};
pub use repo::snapshot_repo::{
    MemorySnapshotRepository, SnapshotRepository, SqliteSnapshotRepository, StorageError,
    StorageResult, StorageTarget,
};
pub use service::durable_store::DurableStore;
pub use store::{FilesStore, Hydration, HydrationPhase, SubscriptionId};
pub use view::SortOrder;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
