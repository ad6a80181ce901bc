//! Reactive files container.
//!
//! # Responsibility
//! - Apply mutations to [`AppState`] and keep its derived cache exact.
//! - Notify subscribers synchronously after every change.
//! - Schedule a fire-and-forget durable write for persisted fields.
//!
//! # Invariants
//! - `completed_count` is maintained incrementally and always equals
//!   [`completed_count`](crate::view::completed_count) over `files`.
//! - `selected_file_id` never refers to a removed record.
//! - Operations on unknown ids change nothing, notify nobody and write
//!   nothing.
//! - Mutations never wait for storage.

use crate::ingest::{read_batch, IngestReport, UploadSource};
use crate::model::app_state::AppState;
use crate::model::file_record::FileRecord;
use crate::model::snapshot::PersistedSnapshot;
use crate::store::persist::PersistQueue;
use crate::view::{self, SortOrder};
use log::{debug, info};
use std::future::Future;

/// Handle returned by [`FilesStore::subscribe`].
pub type SubscriptionId = u64;

type Listener = Box<dyn FnMut(&AppState) + Send>;

/// What a mutation touched, deciding whether a durable write follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Change {
    Persisted,
    Presentational,
}

/// Authoritative in-memory store of uploaded files and UI flags.
///
/// Obtained from [`Hydration::hydrate`](crate::store::Hydration::hydrate).
pub struct FilesStore {
    state: AppState,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: SubscriptionId,
    persist: PersistQueue,
}

impl FilesStore {
    pub(crate) fn hydrated(state: AppState, persist: PersistQueue) -> Self {
        Self {
            state,
            listeners: Vec::new(),
            next_subscription: 1,
            persist,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn files(&self) -> &[FileRecord] {
        &self.state.files
    }

    pub fn selected_file_id(&self) -> Option<&str> {
        self.state.selected_file_id.as_deref()
    }

    /// Selected record, or `None` when the selection does not resolve.
    pub fn selected_file(&self) -> Option<&FileRecord> {
        self.state.selected_file()
    }

    pub fn is_sidebar_open(&self) -> bool {
        self.state.is_sidebar_open
    }

    pub fn hide_aside(&self) -> bool {
        self.state.hide_aside
    }

    /// Number of completed records.
    pub fn completed_count(&self) -> usize {
        self.state.completed_count
    }

    /// Completed share in percent, `0.0` when there are no files.
    pub fn progress_percentage(&self) -> f64 {
        view::progress_percentage(self.state.completed_count, self.state.files.len())
    }

    /// Durable view of the current state.
    pub fn snapshot(&self) -> PersistedSnapshot {
        self.state.snapshot()
    }

    /// Registers `listener`, called with the new state after every change.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&AppState) + Send + 'static,
    {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Returns `false` for unknown ids.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Appends one record. Callers guarantee the id is not already present.
    pub fn add_file(&mut self, file: FileRecord) {
        self.add_files(std::iter::once(file));
    }

    /// Appends records in argument order as a single change.
    pub fn add_files(&mut self, files: impl IntoIterator<Item = FileRecord>) {
        let before = self.state.files.len();
        for file in files {
            if file.completed {
                self.state.completed_count += 1;
            }
            self.state.files.push(file);
        }

        let added = self.state.files.len() - before;
        if added == 0 {
            return;
        }
        debug!("event=store_mutation module=store op=add_files added={added}");
        self.commit(Change::Persisted);
    }

    /// Removes the record with `id`, clearing the selection if it pointed
    /// there. Returns the removed record.
    pub fn remove_file(&mut self, id: &str) -> Option<FileRecord> {
        let index = self.state.files.iter().position(|file| file.id == id)?;
        let removed = self.state.files.remove(index);

        if removed.completed {
            self.state.completed_count -= 1;
        }
        if self.state.selected_file_id.as_deref() == Some(id) {
            self.state.selected_file_id = None;
        }

        debug!("event=store_mutation module=store op=remove_file id={id}");
        self.commit(Change::Persisted);
        Some(removed)
    }

    /// Sets or clears the selection without checking that `id` exists.
    pub fn select_file(&mut self, id: Option<&str>) {
        self.state.selected_file_id = id.map(ToString::to_string);
        self.commit(Change::Persisted);
    }

    pub fn toggle_sidebar(&mut self) {
        self.state.is_sidebar_open = !self.state.is_sidebar_open;
        self.commit(Change::Presentational);
    }

    pub fn set_sidebar_open(&mut self, is_open: bool) {
        self.state.is_sidebar_open = is_open;
        self.commit(Change::Presentational);
    }

    pub fn toggle_hide_aside(&mut self) {
        self.state.hide_aside = !self.state.hide_aside;
        self.commit(Change::Persisted);
    }

    pub fn set_hide_aside(&mut self, hide: bool) {
        self.state.hide_aside = hide;
        self.commit(Change::Persisted);
    }

    /// Stable reorder by name. The order holds until the next insertion.
    pub fn sort_files_by_name(&mut self, order: SortOrder) {
        view::sort_by_name(&mut self.state.files, order);
        debug!(
            "event=store_mutation module=store op=sort_files ascending={}",
            order.is_ascending()
        );
        self.commit(Change::Persisted);
    }

    /// Drops every record and the selection. The durable snapshot is
    /// overwritten with an empty collection.
    pub fn clear_all_files(&mut self) {
        let cleared = self.state.files.len();
        self.state.files.clear();
        self.state.selected_file_id = None;
        self.state.completed_count = 0;

        info!("event=store_mutation module=store op=clear_all status=ok cleared={cleared}");
        self.commit(Change::Persisted);
    }

    /// Flips the completion flag of `id`. Returns the new value, or `None`
    /// when no record matches.
    pub fn toggle_file_completed(&mut self, id: &str) -> Option<bool> {
        let file = self.state.files.iter_mut().find(|file| file.id == id)?;
        file.completed = !file.completed;
        let completed = file.completed;

        if completed {
            self.state.completed_count += 1;
        } else {
            self.state.completed_count -= 1;
        }
        self.commit(Change::Persisted);
        Some(completed)
    }

    /// Reads every source, adds the valid HTML files in one change and
    /// reports the rest. Rejected files never touch state.
    pub async fn ingest<S: UploadSource>(&mut self, sources: &[S]) -> IngestReport {
        let batch = read_batch(sources).await;
        let (accepted, report) = batch.into_parts();
        info!(
            "event=ingest module=store status=ok total={} added={} rejected={}",
            report.total,
            report.added.len(),
            report.rejected.len()
        );
        self.add_files(accepted);
        report
    }

    /// Resolves when every write scheduled so far has landed or failed.
    ///
    /// The returned future does not borrow the store.
    pub fn flush(&self) -> impl Future<Output = ()> + Send + 'static {
        self.persist.flush()
    }

    fn commit(&mut self, change: Change) {
        debug_assert_eq!(
            self.state.completed_count,
            view::completed_count(&self.state.files),
            "completed_count cache drifted"
        );

        for (_, listener) in self.listeners.iter_mut() {
            listener(&self.state);
        }

        if change == Change::Persisted {
            self.persist.enqueue(self.state.snapshot());
        }
    }
}
