//! In-memory application state.

use crate::model::file_record::{FileId, FileRecord};
use crate::model::snapshot::PersistedSnapshot;
use crate::view::completed_count;

/// Authoritative in-memory state mirrored by the durable snapshot.
///
/// Only [`FilesStore`](crate::store::FilesStore) mutates a live instance;
/// observers receive shared references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    /// Insertion order unless a sort has been applied since.
    pub files: Vec<FileRecord>,
    /// Weak reference into `files`; cleared when the record is removed.
    pub selected_file_id: Option<FileId>,
    /// Presentational only, never persisted.
    pub is_sidebar_open: bool,
    pub hide_aside: bool,
    /// Cached count of records with `completed == true`.
    pub completed_count: usize,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            selected_file_id: None,
            is_sidebar_open: true,
            hide_aside: true,
            completed_count: 0,
        }
    }
}

impl AppState {
    /// Builds the durable view of this state.
    pub fn snapshot(&self) -> PersistedSnapshot {
        PersistedSnapshot {
            files: self.files.clone(),
            selected_file_id: self.selected_file_id.clone(),
            hide_aside: self.hide_aside,
        }
    }

    /// Resolves the selection; `None` when nothing is selected or the id no
    /// longer matches a record.
    pub fn selected_file(&self) -> Option<&FileRecord> {
        let id = self.selected_file_id.as_deref()?;
        self.find(id)
    }

    pub fn find(&self, id: &str) -> Option<&FileRecord> {
        self.files.iter().find(|file| file.id == id)
    }

    /// Overwrites persisted fields from `snapshot` and recomputes the cache.
    /// `is_sidebar_open` is left untouched.
    pub(crate) fn apply_snapshot(&mut self, snapshot: PersistedSnapshot) {
        self.completed_count = completed_count(&snapshot.files);
        self.files = snapshot.files;
        self.selected_file_id = snapshot.selected_file_id;
        self.hide_aside = snapshot.hide_aside;
    }
}
