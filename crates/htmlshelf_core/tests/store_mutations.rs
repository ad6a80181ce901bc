use chrono::Utc;
use htmlshelf_core::db::DbError;
use htmlshelf_core::view::completed_count;
use htmlshelf_core::{
    AppState, FileRecord, FilesStore, Hydration, MemorySnapshotRepository, PersistedSnapshot,
    SnapshotRepository, SortOrder, StorageError, StorageResult,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn record(id: &str, name: &str) -> FileRecord {
    FileRecord::with_id(id, name, format!("<p>{name}</p>"), 16, Utc::now())
}

async fn empty_store() -> (FilesStore, Arc<MemorySnapshotRepository>) {
    let repo = Arc::new(MemorySnapshotRepository::new());
    let store = Hydration::new(Arc::clone(&repo)).hydrate().await;
    (store, repo)
}

fn names(store: &FilesStore) -> Vec<String> {
    store.files().iter().map(|file| file.name.clone()).collect()
}

#[derive(Default)]
struct FailingRepository {
    save_attempts: AtomicUsize,
}

impl SnapshotRepository for FailingRepository {
    fn open(&self) -> StorageResult<()> {
        Ok(())
    }

    fn save_snapshot(&self, _snapshot: &PersistedSnapshot) -> StorageResult<()> {
        self.save_attempts.fetch_add(1, Ordering::SeqCst);
        Err(StorageError::WriteFailed(DbError::Sqlite(
            rusqlite::Error::InvalidQuery,
        )))
    }

    fn load_snapshot(&self) -> StorageResult<Option<PersistedSnapshot>> {
        Ok(None)
    }
}

#[tokio::test]
async fn completed_count_tracks_every_add_and_remove() {
    let (mut store, _repo) = empty_store().await;

    // Deterministic mix of adds (some completed) and removals.
    let mut seed: u64 = 0x5eed;
    let mut next_id = 0;
    for _ in 0..200 {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let roll = (seed >> 33) % 10;
        if roll < 6 || store.files().is_empty() {
            next_id += 1;
            let file = record(&format!("id-{next_id}"), &format!("f{next_id}.html"))
                .completed(roll % 2 == 0);
            store.add_file(file);
        } else {
            let index = (seed as usize >> 7) % store.files().len();
            let id = store.files()[index].id.clone();
            store.remove_file(&id).unwrap();
        }
        assert_eq!(store.completed_count(), completed_count(store.files()));
    }
}

#[tokio::test]
async fn add_files_appends_in_argument_order_and_counts_completed() {
    let (mut store, _repo) = empty_store().await;
    store.add_file(record("1", "first.html"));
    store.add_files(vec![
        record("2", "second.html").completed(true),
        record("3", "third.html"),
        record("4", "fourth.html").completed(true),
    ]);

    assert_eq!(
        names(&store),
        vec!["first.html", "second.html", "third.html", "fourth.html"]
    );
    assert_eq!(store.completed_count(), 2);
}

#[tokio::test]
async fn removing_selected_file_clears_selection() {
    let (mut store, _repo) = empty_store().await;
    store.add_files(vec![record("a", "a.html"), record("b", "b.html")]);
    store.select_file(Some("b"));

    let removed = store.remove_file("b").unwrap();
    assert_eq!(removed.id, "b");
    assert_eq!(store.selected_file_id(), None);
    assert!(store.selected_file().is_none());
}

#[tokio::test]
async fn removing_other_file_keeps_selection() {
    let (mut store, _repo) = empty_store().await;
    store.add_files(vec![record("a", "a.html"), record("b", "b.html")]);
    store.select_file(Some("a"));

    store.remove_file("b");
    assert_eq!(store.selected_file_id(), Some("a"));
    assert_eq!(store.selected_file().unwrap().name, "a.html");
}

#[tokio::test]
async fn removing_unknown_id_changes_nothing() {
    let (mut store, repo) = empty_store().await;
    store.add_files(vec![
        record("a", "a.html").completed(true),
        record("b", "b.html"),
    ]);
    store.select_file(Some("a"));
    store.flush().await;
    let saves_before = repo.save_count();

    let notified = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&notified);
    store.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let before = store.state().clone();
    assert!(store.remove_file("missing").is_none());
    store.flush().await;

    assert_eq!(store.state(), &before);
    assert_eq!(notified.load(Ordering::SeqCst), 0);
    assert_eq!(repo.save_count(), saves_before);
}

#[tokio::test]
async fn select_file_accepts_unknown_ids() {
    let (mut store, _repo) = empty_store().await;
    store.add_file(record("a", "a.html"));

    store.select_file(Some("ghost"));
    assert_eq!(store.selected_file_id(), Some("ghost"));
    assert!(store.selected_file().is_none());

    store.select_file(None);
    assert_eq!(store.selected_file_id(), None);
}

#[tokio::test]
async fn sort_ascending_then_descending_reverses_order() {
    let (mut store, _repo) = empty_store().await;
    store.add_files(vec![
        record("1", "delta.html").completed(true),
        record("2", "Alpha.html"),
        record("3", "charlie.htm"),
        record("4", "bravo.html").completed(true),
    ]);

    store.sort_files_by_name(SortOrder::Ascending);
    let ascending = names(&store);
    assert_eq!(
        ascending,
        vec!["Alpha.html", "bravo.html", "charlie.htm", "delta.html"]
    );

    store.sort_files_by_name(SortOrder::Descending);
    let mut descending = names(&store);
    descending.reverse();
    assert_eq!(descending, ascending);
    assert_eq!(store.completed_count(), 2);
}

#[tokio::test]
async fn sort_places_accented_names_with_their_base_letter() {
    let (mut store, repo) = empty_store().await;
    store.add_files(vec![
        record("1", "zebra.html"),
        record("2", "Über.html"),
        record("3", "éclair.html"),
        record("4", "apple.html"),
        record("5", "vogel.html"),
    ]);

    store.sort_files_by_name(SortOrder::Ascending);
    let ascending = names(&store);
    assert_eq!(
        ascending,
        vec!["apple.html", "éclair.html", "Über.html", "vogel.html", "zebra.html"]
    );

    store.sort_files_by_name(SortOrder::Descending);
    let mut descending = names(&store);
    descending.reverse();
    assert_eq!(descending, ascending);

    store.flush().await;
    let persisted = repo.load_snapshot().unwrap().unwrap();
    assert_eq!(persisted.files[0].name, "zebra.html");
}

#[tokio::test]
async fn insertion_after_sort_appends() {
    let (mut store, _repo) = empty_store().await;
    store.add_files(vec![record("1", "b.html"), record("2", "a.html")]);
    store.sort_files_by_name(SortOrder::default());
    store.add_file(record("3", "0.html"));

    assert_eq!(names(&store), vec!["a.html", "b.html", "0.html"]);
}

#[tokio::test]
async fn clear_all_files_resets_collection_and_persists_empty() {
    let (mut store, repo) = empty_store().await;
    store.add_files(vec![
        record("a", "a.html").completed(true),
        record("b", "b.html"),
    ]);
    store.select_file(Some("a"));
    store.set_hide_aside(true);

    store.clear_all_files();
    store.flush().await;

    assert!(store.files().is_empty());
    assert_eq!(store.selected_file_id(), None);
    assert_eq!(store.completed_count(), 0);
    assert_eq!(store.progress_percentage(), 0.0);

    let persisted = repo.load_snapshot().unwrap().unwrap();
    assert!(persisted.files.is_empty());
    assert_eq!(persisted.selected_file_id, None);
    assert!(persisted.hide_aside);
}

#[tokio::test]
async fn toggle_completed_adjusts_count_and_ignores_unknown_ids() {
    let (mut store, _repo) = empty_store().await;
    store.add_files(vec![record("a", "a.html"), record("b", "b.html")]);

    assert_eq!(store.toggle_file_completed("a"), Some(true));
    assert_eq!(store.completed_count(), 1);
    assert_eq!(store.toggle_file_completed("a"), Some(false));
    assert_eq!(store.completed_count(), 0);
    assert_eq!(store.toggle_file_completed("zzz"), None);
    assert_eq!(store.completed_count(), 0);
}

#[tokio::test]
async fn completed_count_after_marking_and_removing() {
    let (mut store, _repo) = empty_store().await;
    store.add_files(vec![
        record("a", "a.html"),
        record("b", "b.html"),
        record("c", "c.html"),
    ]);
    store.toggle_file_completed("a");
    store.toggle_file_completed("c");
    assert_eq!(store.completed_count(), 2);
    assert!((store.progress_percentage() - 200.0 / 3.0).abs() < 1e-9);

    store.remove_file("c");
    assert_eq!(store.completed_count(), 1);
}

#[tokio::test]
async fn sidebar_changes_notify_but_are_not_persisted() {
    let (mut store, repo) = empty_store().await;
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    store.subscribe(move |state: &AppState| {
        sink.lock().unwrap().push(state.is_sidebar_open);
    });

    assert!(store.is_sidebar_open());
    store.toggle_sidebar();
    store.set_sidebar_open(true);
    store.flush().await;

    assert_eq!(*seen.lock().unwrap(), vec![false, true]);
    assert_eq!(repo.save_count(), 0);
}

#[tokio::test]
async fn hide_aside_is_persisted() {
    let (mut store, repo) = empty_store().await;
    assert!(!store.hide_aside());

    store.toggle_hide_aside();
    store.flush().await;
    assert!(repo.load_snapshot().unwrap().unwrap().hide_aside);

    store.set_hide_aside(false);
    store.flush().await;
    assert!(!repo.load_snapshot().unwrap().unwrap().hide_aside);
}

#[tokio::test]
async fn subscribers_see_state_after_mutation_and_can_unsubscribe() {
    let (mut store, _repo) = empty_store().await;
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let id = store.subscribe(move |state: &AppState| {
        sink.lock()
            .unwrap()
            .push((state.files.len(), state.completed_count));
    });

    store.add_file(record("a", "a.html").completed(true));
    store.add_file(record("b", "b.html"));
    assert!(store.unsubscribe(id));
    assert!(!store.unsubscribe(id));
    store.remove_file("a");

    assert_eq!(*seen.lock().unwrap(), vec![(1, 1), (2, 1)]);
}

#[tokio::test]
async fn rapid_mutations_coalesce_into_latest_snapshot() {
    let (mut store, repo) = empty_store().await;

    for index in 0..50 {
        store.add_file(record(&format!("id-{index}"), &format!("{index}.html")));
    }
    store.flush().await;

    assert!(repo.save_count() >= 1);
    assert!(repo.save_count() < 50);
    let persisted = repo.load_snapshot().unwrap().unwrap();
    assert_eq!(persisted, store.snapshot());
    assert_eq!(persisted.files.len(), 50);
}

#[tokio::test]
async fn storage_failures_never_reach_the_caller() {
    let repo = Arc::new(FailingRepository::default());
    let mut store = Hydration::new(Arc::clone(&repo)).hydrate().await;

    store.add_file(record("a", "a.html"));
    assert_eq!(names(&store), vec!["a.html"]);

    store.flush().await;
    store.toggle_file_completed("a");
    store.flush().await;

    assert_eq!(store.completed_count(), 1);
    assert_eq!(repo.save_attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn dropping_the_store_still_writes_pending_snapshot() {
    let (mut store, repo) = empty_store().await;
    store.add_file(record("a", "a.html"));
    let flushed = store.flush();
    drop(store);
    flushed.await;

    let persisted = repo.load_snapshot().unwrap().unwrap();
    assert_eq!(persisted.files.len(), 1);
}
