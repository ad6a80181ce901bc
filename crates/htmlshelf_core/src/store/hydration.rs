//! One-shot hydration of the files container.
//!
//! # Responsibility
//! - Load the durable snapshot off the async executor.
//! - Publish the `NotStarted -> Loading -> Hydrated` phase to observers.
//! - Hand out the container together with its write-behind worker.
//!
//! # Invariants
//! - `hydrate` consumes the controller, so it runs at most once.
//! - Every path ends in `Hydrated`; load failures hydrate an empty state.

use crate::model::app_state::AppState;
use crate::model::snapshot::PersistedSnapshot;
use crate::repo::snapshot_repo::SnapshotRepository;
use crate::service::durable_store::DurableStore;
use crate::store::container::FilesStore;
use crate::store::persist::PersistQueue;
use log::{error, info};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

/// Hydration progress as seen by observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HydrationPhase {
    NotStarted,
    Loading,
    Hydrated,
}

impl HydrationPhase {
    /// Observers render a placeholder until this returns `true`.
    pub fn is_ready(self) -> bool {
        self == Self::Hydrated
    }
}

/// Controller turning a snapshot repository into a live [`FilesStore`].
pub struct Hydration<R: SnapshotRepository + 'static> {
    durable: Arc<DurableStore<R>>,
    phase: watch::Sender<HydrationPhase>,
}

impl<R: SnapshotRepository + 'static> Hydration<R> {
    pub fn new(repo: R) -> Self {
        let (phase, _) = watch::channel(HydrationPhase::NotStarted);
        Self {
            durable: Arc::new(DurableStore::new(repo)),
            phase,
        }
    }

    pub fn phase(&self) -> HydrationPhase {
        *self.phase.borrow()
    }

    /// Receiver tracking phase changes. Keeps the final phase readable after
    /// the controller is gone.
    pub fn watch_phase(&self) -> watch::Receiver<HydrationPhase> {
        self.phase.subscribe()
    }

    /// Loads the snapshot, builds the container and starts its persistence
    /// worker on the current tokio runtime.
    pub async fn hydrate(self) -> FilesStore {
        let started_at = Instant::now();
        self.phase.send_replace(HydrationPhase::Loading);
        info!("event=hydration module=store status=start");

        let durable = Arc::clone(&self.durable);
        let snapshot = match tokio::task::spawn_blocking(move || durable.load()).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                error!("event=hydration module=store status=load_aborted error={err}");
                PersistedSnapshot::empty()
            }
        };

        let mut state = AppState::default();
        state.apply_snapshot(snapshot);
        let files = state.files.len();
        let completed = state.completed_count;

        let store = FilesStore::hydrated(state, PersistQueue::spawn(self.durable));
        self.phase.send_replace(HydrationPhase::Hydrated);
        info!(
            "event=hydration module=store status=ok files={} completed={} duration_ms={}",
            files,
            completed,
            started_at.elapsed().as_millis()
        );
        store
    }
}
