//! Property-based tests for the garbage collectors.
//!
//! Uses proptest to verify invariants across random stores:
//! - Only unreachable, collectable keys are deleted
//! - Uploadable actions are never deleted
//! - A second sweep with the same inputs deletes nothing
//! - A journal rewrite is one delete plus one append per valid action
//! - The deferral decision

// Property tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use feedgc::gc::{ContentGcConfig, GcDecision, decide};
use feedgc::storage::{InMemoryContentStorage, InMemoryJournalStorage, JournalOperation};
use feedgc::storage::{ContentMutation, ContentStorage};
use feedgc::tasks::SerialTaskQueue;
use feedgc::{
    ContentGc, ContentGcOutcome, ContentId, ContentKey, LocalActionGc, StreamLocalAction,
};
use proptest::prelude::*;

const PREFIXES: [&str; 4] = ["", "sp::", "ss::", "ua::"];

fn key_strategy() -> impl Strategy<Value = String> {
    (0usize..4, "c[0-9]").prop_map(|(prefix, id)| format!("{}{id}", PREFIXES[prefix]))
}

fn id_set_strategy() -> impl Strategy<Value = HashSet<ContentId>> {
    prop::collection::hash_set("c[0-9]", 0..6)
        .prop_map(|ids| ids.into_iter().map(ContentId::from).collect())
}

fn seeded_storage(keys: &BTreeSet<String>) -> Arc<InMemoryContentStorage> {
    let storage = Arc::new(InMemoryContentStorage::new());
    let mutation = keys
        .iter()
        .fold(ContentMutation::builder(), |builder, key| {
            builder.upsert(key.as_str(), b"v".to_vec())
        })
        .build();
    assert!(storage.commit(mutation).is_success());
    storage
}

fn content_gc(
    storage: Arc<InMemoryContentStorage>,
    accessible: HashSet<ContentId>,
    reserved: HashSet<ContentId>,
    action_ids: &[ContentId],
    keep_shared_states: bool,
) -> Arc<ContentGc> {
    let actions: Vec<StreamLocalAction> = action_ids
        .iter()
        .map(|id| StreamLocalAction::dismiss(id.clone()))
        .collect();
    Arc::new(ContentGc::new(
        ContentGcConfig::new().with_keep_shared_states(keep_shared_states),
        Arc::new(move || accessible.clone()),
        reserved,
        Arc::new(move || Ok(actions.clone())),
        storage,
        Arc::new(SerialTaskQueue::new()),
    ))
}

fn should_delete(
    key: &str,
    accessible: &HashSet<ContentId>,
    reserved: &HashSet<ContentId>,
    action_ids: &[ContentId],
    keep_shared_states: bool,
) -> bool {
    let parsed = ContentKey::parse(key);
    let id = parsed.content_id();
    let unreachable = !accessible.contains(id) && !reserved.contains(id);
    match parsed {
        ContentKey::UploadableAction(_) => false,
        ContentKey::SharedState(_) if keep_shared_states => false,
        ContentKey::SemanticProperties(_) => unreachable && !action_ids.contains(id),
        ContentKey::Plain(_) | ContentKey::SharedState(_) => unreachable,
    }
}

proptest! {
    /// Property: exactly the unreachable, collectable keys are deleted.
    #[test]
    fn prop_sweep_deletes_exactly_unreachable_keys(
        keys in prop::collection::btree_set(key_strategy(), 0..30),
        accessible in id_set_strategy(),
        reserved in id_set_strategy(),
        action_ids in prop::collection::vec("c[0-9]".prop_map(ContentId::from), 0..4),
        keep_shared_states in any::<bool>(),
    ) {
        let storage = seeded_storage(&keys);
        let gc = content_gc(
            storage.clone(),
            accessible.clone(),
            reserved.clone(),
            &action_ids,
            keep_shared_states,
        );

        let ContentGcOutcome::Swept(result) = gc.gc().unwrap() else {
            panic!("empty queue must sweep");
        };

        for key in &keys {
            let expected = should_delete(key, &accessible, &reserved, &action_ids, keep_shared_states);
            prop_assert_eq!(storage.contains(key), !expected, "key {}", key);
        }
        prop_assert_eq!(result.keys_checked, keys.len());
        prop_assert_eq!(result.keys_deleted, keys.len() - storage.len());
    }

    /// Property: uploadable actions survive any sweep.
    #[test]
    fn prop_uploadable_actions_never_deleted(
        keys in prop::collection::btree_set(key_strategy(), 0..30),
        keep_shared_states in any::<bool>(),
    ) {
        let storage = seeded_storage(&keys);
        let gc = content_gc(storage.clone(), HashSet::new(), HashSet::new(), &[], keep_shared_states);
        gc.gc().unwrap();

        for key in keys.iter().filter(|k| k.starts_with("ua::")) {
            prop_assert!(storage.contains(key));
        }
    }

    /// Property: a second sweep with unchanged inputs deletes nothing.
    #[test]
    fn prop_sweep_is_idempotent(
        keys in prop::collection::btree_set(key_strategy(), 0..30),
        accessible in id_set_strategy(),
        reserved in id_set_strategy(),
    ) {
        let storage = seeded_storage(&keys);
        let gc = content_gc(storage.clone(), accessible, reserved, &[], false);

        gc.gc().unwrap();
        let remaining = storage.len();
        let ContentGcOutcome::Swept(second) = gc.gc().unwrap() else {
            panic!("empty queue must sweep");
        };

        prop_assert_eq!(second.keys_deleted, 0);
        prop_assert_eq!(storage.len(), remaining);
    }

    /// Property: the rewrite is one delete then one append per valid action, in order.
    #[test]
    fn prop_journal_mutation_shape(
        targets in prop::collection::vec("c[0-9]", 0..20),
        valid in id_set_strategy(),
    ) {
        let actions: Vec<StreamLocalAction> = targets
            .iter()
            .enumerate()
            .map(|(i, id)| StreamLocalAction::new(
                feedgc::ActionType::Dismiss,
                id.as_str(),
                u64::try_from(i).unwrap(),
            ))
            .collect();
        let expected: Vec<&StreamLocalAction> = actions
            .iter()
            .filter(|a| valid.contains(a.feature_content_id()))
            .collect();

        let gc = LocalActionGc::new(
            actions.clone(),
            valid,
            Arc::new(InMemoryJournalStorage::new()),
            "action-dismiss",
        );
        let mutation = gc.build_mutation().unwrap();

        prop_assert_eq!(mutation.len(), 1 + expected.len());
        prop_assert_eq!(&mutation.operations()[0], &JournalOperation::Delete);
        for (op, action) in mutation.operations()[1..].iter().zip(expected) {
            prop_assert_eq!(op, &JournalOperation::Append(action.to_bytes().unwrap()));
        }
    }

    /// Property: defer iff work is pending and the budget is not spent.
    #[test]
    fn prop_decide(pending in 0usize..5, attempts in 0u32..12, max in 0u32..12) {
        let expected = if pending > 0 && attempts < max {
            GcDecision::Defer
        } else {
            GcDecision::RunNow
        };
        prop_assert_eq!(decide(pending, attempts, max), expected);
    }
}
