//! Repository layer for the durable snapshot.
//!
//! # Responsibility
//! - Define the storage contract used by the durable store policy layer.
//! - Isolate SQLite details from the container and hydration logic.
//!
//! # Invariants
//! - Repositories report every failure as a typed [`StorageError`]; deciding
//!   whether a failure is fatal belongs to callers.

pub mod snapshot_repo;

pub use snapshot_repo::{
    MemorySnapshotRepository, SnapshotRepository, SqliteSnapshotRepository, StorageError,
    StorageResult, StorageTarget,
};
