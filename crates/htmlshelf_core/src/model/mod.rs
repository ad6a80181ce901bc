//! Domain model for uploaded HTML documents and application state.
//!
//! # Responsibility
//! - Define the record shape shared by the container, storage and ingestion.
//! - Own the persisted snapshot format and its load-boundary coercion.
//!
//! # Invariants
//! - `FileRecord::id` is unique within one in-memory collection.
//! - `AppState::completed_count` equals the number of completed records.

pub mod app_state;
pub mod file_record;
pub mod snapshot;
