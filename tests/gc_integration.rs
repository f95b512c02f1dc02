//! Integration tests for the garbage collectors over file-backed storage.
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use std::collections::HashSet;
use std::sync::Arc;

use feedgc::config::FeedGcConfig;
use feedgc::gc::{ContentGcResult, LocalActionGc, Supplier};
use feedgc::storage::{
    FilesystemContentStorage, FilesystemJournalStorage, JournalOperation, JournalStorage,
};
use feedgc::tasks::{SerialTaskQueue, Task, TaskQueue, TaskType};
use feedgc::{ContentGcOutcome, ContentId, ContentKey, Error, FeedStore, StreamLocalAction};
use tempfile::TempDir;

fn ids(values: &[&str]) -> HashSet<ContentId> {
    values.iter().map(|v| ContentId::from(*v)).collect()
}

fn accessible(values: &[&str]) -> Supplier<HashSet<ContentId>> {
    let set = ids(values);
    Arc::new(move || set.clone())
}

fn open_store(dir: &TempDir, config: FeedGcConfig) -> (FeedStore, Arc<SerialTaskQueue>) {
    let queue = Arc::new(SerialTaskQueue::new());
    let store = FeedStore::open(queue.clone(), config.with_data_dir(dir.path()));
    (store, queue)
}

fn put_all(store: &FeedStore, keys: &[&str]) {
    for key in keys {
        store
            .upsert_content(&ContentKey::parse(key), key.as_bytes().to_vec())
            .unwrap();
    }
}

fn raw_keys(store: &FeedStore) -> Vec<String> {
    let mut keys: Vec<String> = store
        .content_keys()
        .unwrap()
        .iter()
        .map(ContentKey::to_storage_key)
        .collect();
    keys.sort();
    keys
}

fn swept(outcome: ContentGcOutcome) -> ContentGcResult {
    match outcome {
        ContentGcOutcome::Swept(result) => result,
        ContentGcOutcome::Deferred { attempt } => panic!("unexpected deferral #{attempt}"),
    }
}

#[test]
fn test_nothing_accessible_deletes_all_content() {
    let dir = TempDir::new().unwrap();
    let (store, _queue) = open_store(&dir, FeedGcConfig::default());
    put_all(&store, &["c1", "c2"]);

    let result = swept(store.content_gc(accessible(&[]), HashSet::new()).gc().unwrap());

    assert_eq!(result.keys_deleted, 2);
    assert!(raw_keys(&store).is_empty());
}

#[test]
fn test_accessible_content_survives() {
    let dir = TempDir::new().unwrap();
    let (store, _queue) = open_store(&dir, FeedGcConfig::default());
    put_all(&store, &["c1", "c2"]);

    swept(store.content_gc(accessible(&["c1"]), HashSet::new()).gc().unwrap());

    assert_eq!(raw_keys(&store), vec!["c1"]);
}

#[test]
fn test_mixed_store_sweep() {
    let dir = TempDir::new().unwrap();
    let (store, _queue) = open_store(&dir, FeedGcConfig::default());
    put_all(
        &store,
        &[
            "c1", "c2", "c3", "sp::c1", "sp::c2", "sp::c4", "ss::c2", "ss::c3", "ua::c9",
        ],
    );
    store.record_dismiss(&StreamLocalAction::dismiss("c4")).unwrap();

    let gc = store.content_gc(accessible(&["c1"]), ids(&["c3"]));
    let result = swept(gc.gc().unwrap());

    // c2 is unreachable; c4's semantic properties survive via the dismiss action.
    assert_eq!(
        raw_keys(&store),
        vec!["c1", "c3", "sp::c1", "sp::c4", "ss::c3", "ua::c9"]
    );
    assert_eq!(result.keys_checked, 9);
    assert_eq!(result.keys_deleted, 3);
    assert_eq!(result.uploadable_actions_retained, 1);
}

#[test]
fn test_keep_shared_states_from_config() {
    let dir = TempDir::new().unwrap();
    let config = FeedGcConfig::default().with_keep_shared_states(true);
    let (store, _queue) = open_store(&dir, config);
    put_all(&store, &["c1", "ss::c1", "ss::c2"]);

    let result = swept(store.content_gc(accessible(&[]), HashSet::new()).gc().unwrap());

    assert_eq!(raw_keys(&store), vec!["ss::c1", "ss::c2"]);
    assert_eq!(result.shared_states_retained, 2);
}

#[test]
fn test_sweep_of_missing_store_creates_nothing() {
    let dir = TempDir::new().unwrap();
    let (store, _queue) = open_store(&dir, FeedGcConfig::default());

    let result = swept(store.content_gc(accessible(&[]), HashSet::new()).gc().unwrap());

    assert_eq!(result.keys_checked, 0);
    assert!(!dir.path().join("content.json").exists());
}

#[test]
fn test_second_sweep_is_noop() {
    let dir = TempDir::new().unwrap();
    let (store, _queue) = open_store(&dir, FeedGcConfig::default());
    put_all(&store, &["c1", "c2", "sp::c2"]);

    let gc = store.content_gc(accessible(&["c1"]), HashSet::new());
    assert_eq!(swept(gc.gc().unwrap()).keys_deleted, 2);
    assert_eq!(swept(gc.gc().unwrap()).keys_deleted, 0);
    assert_eq!(raw_keys(&store), vec!["c1"]);
}

#[test]
fn test_store_survives_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let (store, _queue) = open_store(&dir, FeedGcConfig::default());
        put_all(&store, &["c1", "c2"]);
        swept(store.content_gc(accessible(&["c2"]), HashSet::new()).gc().unwrap());
    }

    let (store, _queue) = open_store(&dir, FeedGcConfig::default());
    assert_eq!(raw_keys(&store), vec!["c2"]);
}

#[test]
fn test_deferral_budget_then_forced_sweep() {
    let dir = TempDir::new().unwrap();
    let config = FeedGcConfig::default().with_maximum_gc_attempts(2);
    let (store, queue) = open_store(&dir, config);
    put_all(&store, &["c1"]);

    // A long-lived backlog: one background task that is never drained here.
    queue.execute(Task::CommitContent, TaskType::Background, Box::new(|| {}));

    let gc = store.content_gc(accessible(&[]), HashSet::new());
    assert!(matches!(
        gc.gc().unwrap(),
        ContentGcOutcome::Deferred { attempt: 1 }
    ));
    assert!(matches!(
        gc.gc().unwrap(),
        ContentGcOutcome::Deferred { attempt: 2 }
    ));
    assert_eq!(raw_keys(&store), vec!["c1"]);

    let result = swept(gc.gc().unwrap());
    assert_eq!(result.keys_deleted, 1);
    assert_eq!(gc.attempts(), 0);
    // Backlog plus two re-queued GC jobs.
    assert_eq!(queue.background_task_count(), 3);
}

#[test]
fn test_zero_budget_never_defers() {
    let dir = TempDir::new().unwrap();
    let config = FeedGcConfig::default().with_maximum_gc_attempts(0);
    let (store, queue) = open_store(&dir, config);
    put_all(&store, &["c1"]);
    queue.execute(Task::CommitContent, TaskType::Background, Box::new(|| {}));

    swept(store.content_gc(accessible(&[]), HashSet::new()).gc().unwrap());

    assert!(raw_keys(&store).is_empty());
    assert_eq!(queue.len(), 1);
}

#[test]
fn test_local_action_gc_rewrites_journal() {
    let dir = TempDir::new().unwrap();
    let (store, _queue) = open_store(&dir, FeedGcConfig::default());
    store.record_dismiss(&StreamLocalAction::dismiss("c1")).unwrap();
    store.record_dismiss(&StreamLocalAction::dismiss("c2")).unwrap();
    store.record_dismiss(&StreamLocalAction::dismiss("c3")).unwrap();

    let result = store.trigger_local_action_gc(ids(&["c3", "c1"])).unwrap();
    assert_eq!(result.actions_checked, 3);
    assert_eq!(result.actions_kept, 2);

    let remaining: Vec<String> = store
        .dismiss_actions()
        .unwrap()
        .iter()
        .map(|action| action.feature_content_id().to_string())
        .collect();
    assert_eq!(remaining, vec!["c1", "c3"]);
}

#[test]
fn test_local_action_gc_on_empty_journal_clears_it() {
    let dir = TempDir::new().unwrap();
    let journals = Arc::new(FilesystemJournalStorage::new(dir.path()));

    let gc = LocalActionGc::new(Vec::new(), ids(&["c1"]), journals.clone(), "action-dismiss");
    let mutation = gc.build_mutation().unwrap();
    assert_eq!(mutation.operations(), &[JournalOperation::Delete]);

    let result = gc.gc().unwrap();
    assert_eq!(result.actions_kept, 0);
    assert!(journals.get_all_journals().unwrap().is_empty());
}

#[test]
fn test_local_action_gc_mutation_order() {
    let dir = TempDir::new().unwrap();
    let journals = Arc::new(FilesystemJournalStorage::new(dir.path()));
    let a1 = StreamLocalAction::dismiss("c1");
    let a2 = StreamLocalAction::dismiss("c2");

    let gc = LocalActionGc::new(vec![a1, a2.clone()], ids(&["c2"]), journals, "action-dismiss");
    let mutation = gc.build_mutation().unwrap();

    assert_eq!(
        mutation.operations(),
        &[
            JournalOperation::Delete,
            JournalOperation::Append(a2.to_bytes().unwrap())
        ]
    );
}

#[test]
fn test_corrupt_content_file_fails_read() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("content.json"), b"{ not json").unwrap();
    let (store, _queue) = open_store(&dir, FeedGcConfig::default());

    let err = store
        .content_gc(accessible(&[]), HashSet::new())
        .gc()
        .unwrap_err();
    assert!(matches!(err, Error::StorageReadFailed { .. }));
}

#[test]
fn test_filesystem_backends_share_data_dir() {
    let dir = TempDir::new().unwrap();
    let content = FilesystemContentStorage::new(dir.path());
    let journals = FilesystemJournalStorage::new(dir.path());

    assert_eq!(content.path(), dir.path().join("content.json"));
    assert_eq!(journals.dir(), dir.path().join("journals"));
}
