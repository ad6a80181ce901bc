//! Durable store adapter.
//!
//! # Responsibility
//! - Wrap a [`SnapshotRepository`] with swallow-and-log semantics.
//!
//! # Invariants
//! - `save` and `load` never return an error and never panic on storage
//!   failures.
//! - `load` yields [`PersistedSnapshot::empty`] when nothing is stored or the
//!   stored document cannot be read.
//! - An unavailable backend is reported once at `warn` level, then at
//!   `debug` level.

use crate::model::snapshot::PersistedSnapshot;
use crate::repo::snapshot_repo::{SnapshotRepository, StorageError, StorageResult};
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Non-fatal persistence facade used by hydration and the write-behind
/// worker.
pub struct DurableStore<R: SnapshotRepository> {
    repo: R,
    unavailable_reported: AtomicBool,
}

impl<R: SnapshotRepository> DurableStore<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            unavailable_reported: AtomicBool::new(false),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Opens the backend. Errors here mean "persistence disabled".
    pub fn open(&self) -> StorageResult<()> {
        self.repo.open()
    }

    /// Writes `snapshot` as the durable state.
    ///
    /// Returns whether the write landed; failures are logged, not raised.
    pub fn save(&self, snapshot: &PersistedSnapshot) -> bool {
        let started_at = Instant::now();
        match self.repo.save_snapshot(snapshot) {
            Ok(()) => {
                info!(
                    "event=snapshot_save module=durable_store status=ok files={} duration_ms={}",
                    snapshot.files.len(),
                    started_at.elapsed().as_millis()
                );
                true
            }
            Err(StorageError::Unavailable) => {
                self.report_unavailable("snapshot_save");
                false
            }
            Err(err) => {
                error!(
                    "event=snapshot_save module=durable_store status=error files={} duration_ms={} error={}",
                    snapshot.files.len(),
                    started_at.elapsed().as_millis(),
                    err
                );
                false
            }
        }
    }

    /// Reads the durable state, degrading to the empty snapshot.
    pub fn load(&self) -> PersistedSnapshot {
        let started_at = Instant::now();
        match self.repo.load_snapshot() {
            Ok(Some(snapshot)) => {
                info!(
                    "event=snapshot_load module=durable_store status=ok files={} duration_ms={}",
                    snapshot.files.len(),
                    started_at.elapsed().as_millis()
                );
                snapshot
            }
            Ok(None) => {
                info!(
                    "event=snapshot_load module=durable_store status=empty duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                PersistedSnapshot::empty()
            }
            Err(StorageError::Unavailable) => {
                self.report_unavailable("snapshot_load");
                PersistedSnapshot::empty()
            }
            Err(err) => {
                error!(
                    "event=snapshot_load module=durable_store status=error duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                PersistedSnapshot::empty()
            }
        }
    }

    fn report_unavailable(&self, event: &str) {
        if self.unavailable_reported.swap(true, Ordering::Relaxed) {
            debug!("event={event} module=durable_store status=disabled");
        } else {
            warn!("event={event} module=durable_store status=disabled reason=backend_unavailable");
        }
    }
}
