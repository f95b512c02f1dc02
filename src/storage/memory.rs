//! In-memory storage backends.
//!
//! Used by tests and by hosts that keep the Feed store in process memory.

use super::traits::{
    CommitResult, ContentMutation, ContentOperation, ContentStorage, JournalMutation,
    JournalOperation, JournalStorage,
};
use crate::Result;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Content store held in an ordered map.
#[derive(Debug, Default)]
pub struct InMemoryContentStorage {
    entries: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryContentStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }

    /// Returns `true` if `key` is stored.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        lock(&self.entries).contains_key(key)
    }
}

impl ContentStorage for InMemoryContentStorage {
    fn get_all_keys(&self) -> Result<Vec<String>> {
        Ok(lock(&self.entries).keys().cloned().collect())
    }

    fn commit(&self, mutation: ContentMutation) -> CommitResult {
        let mut entries = lock(&self.entries);
        for operation in mutation.into_operations() {
            match operation {
                ContentOperation::Upsert { key, value } => {
                    entries.insert(key, value);
                },
                ContentOperation::Delete { key } => {
                    entries.remove(&key);
                },
            }
        }
        CommitResult::Success
    }
}

/// Journal store held in an ordered map of record lists.
#[derive(Debug, Default)]
pub struct InMemoryJournalStorage {
    journals: Mutex<BTreeMap<String, Vec<Vec<u8>>>>,
}

impl InMemoryJournalStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl JournalStorage for InMemoryJournalStorage {
    fn read(&self, journal_name: &str) -> Result<Vec<Vec<u8>>> {
        Ok(lock(&self.journals)
            .get(journal_name)
            .cloned()
            .unwrap_or_default())
    }

    fn get_all_journals(&self) -> Result<Vec<String>> {
        Ok(lock(&self.journals).keys().cloned().collect())
    }

    fn commit(&self, mutation: JournalMutation) -> CommitResult {
        let mut journals = lock(&self.journals);
        let name = mutation.journal_name();
        for operation in mutation.operations() {
            match operation {
                JournalOperation::Append(record) => {
                    journals
                        .entry(name.to_string())
                        .or_default()
                        .push(record.clone());
                },
                JournalOperation::Delete => {
                    journals.remove(name);
                },
            }
        }
        CommitResult::Success
    }
}
