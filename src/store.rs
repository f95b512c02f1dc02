//! Feed store: content storage, journal storage and a task queue wired
//! together with the garbage collectors.
//!
//! [`FeedStore`] is the caller both collectors expect. It knows which
//! journal holds dismiss actions, how to decode them, and how to schedule
//! content GC as background work.

use crate::config::FeedGcConfig;
use crate::gc::{ContentGc, LocalActionGc, LocalActionGcResult, Supplier};
use crate::models::{ContentId, ContentKey, ContentKeyKind, StreamLocalAction};
use crate::storage::{
    ContentMutation, ContentStorage, FilesystemContentStorage, FilesystemJournalStorage,
    InMemoryContentStorage, InMemoryJournalStorage, JournalMutation, JournalStorage,
};
use crate::tasks::{Task, TaskQueue, TaskType};
use crate::{Error, Result};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Entry counts for a store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStatus {
    /// Plain content entries.
    pub content: usize,
    /// Semantic-properties entries.
    pub semantic_properties: usize,
    /// Shared-state entries.
    pub shared_states: usize,
    /// Uploadable-action entries.
    pub uploadable_actions: usize,
    /// Decodable records in the dismiss journal.
    pub dismiss_actions: usize,
    /// Names of every journal in the store.
    pub journals: Vec<String>,
}

impl StoreStatus {
    /// Returns the total number of content-store keys.
    #[must_use]
    pub const fn total_keys(&self) -> usize {
        self.content + self.semantic_properties + self.shared_states + self.uploadable_actions
    }

    /// Returns the count for one key kind.
    #[must_use]
    pub const fn count(&self, kind: ContentKeyKind) -> usize {
        match kind {
            ContentKeyKind::Plain => self.content,
            ContentKeyKind::SemanticProperties => self.semantic_properties,
            ContentKeyKind::SharedState => self.shared_states,
            ContentKeyKind::UploadableAction => self.uploadable_actions,
        }
    }
}

/// A Feed store and its garbage collectors.
pub struct FeedStore {
    content: Arc<dyn ContentStorage>,
    journals: Arc<dyn JournalStorage>,
    task_queue: Arc<dyn TaskQueue>,
    config: FeedGcConfig,
}

impl FeedStore {
    /// Creates a store over the given backends.
    #[must_use]
    pub fn new(
        content: Arc<dyn ContentStorage>,
        journals: Arc<dyn JournalStorage>,
        task_queue: Arc<dyn TaskQueue>,
        config: FeedGcConfig,
    ) -> Self {
        Self {
            content,
            journals,
            task_queue,
            config,
        }
    }

    /// Creates a store backed by in-memory storage.
    #[must_use]
    pub fn in_memory(task_queue: Arc<dyn TaskQueue>, config: FeedGcConfig) -> Self {
        Self::new(
            Arc::new(InMemoryContentStorage::new()),
            Arc::new(InMemoryJournalStorage::new()),
            task_queue,
            config,
        )
    }

    /// Creates a store backed by files under `config.data_dir`.
    #[must_use]
    pub fn open(task_queue: Arc<dyn TaskQueue>, config: FeedGcConfig) -> Self {
        let content = FilesystemContentStorage::new(&config.data_dir);
        let journals = FilesystemJournalStorage::new(&config.data_dir);
        Self::new(Arc::new(content), Arc::new(journals), task_queue, config)
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &FeedGcConfig {
        &self.config
    }

    /// Returns the journal holding dismiss actions.
    #[must_use]
    pub fn dismiss_journal(&self) -> &str {
        &self.config.gc.dismiss_journal
    }

    /// Writes one content entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CommitFailed`] if the content store rejects the write.
    pub fn upsert_content(&self, key: &ContentKey, value: Vec<u8>) -> Result<()> {
        let mutation = ContentMutation::builder()
            .upsert(key.to_storage_key(), value)
            .build();
        if self.content.commit(mutation).is_success() {
            Ok(())
        } else {
            Err(Error::CommitFailed {
                target: "content store".to_string(),
            })
        }
    }

    /// Lists every key in the content store, decoded.
    ///
    /// # Errors
    ///
    /// Returns an error if the key set cannot be read.
    pub fn content_keys(&self) -> Result<Vec<ContentKey>> {
        Ok(self
            .content
            .get_all_keys()?
            .iter()
            .map(|key| ContentKey::parse(key))
            .collect())
    }

    /// Appends a dismiss action to the dismiss journal.
    ///
    /// # Errors
    ///
    /// Returns an error if the action cannot be encoded or the append fails.
    pub fn record_dismiss(&self, action: &StreamLocalAction) -> Result<()> {
        let mutation = JournalMutation::builder(self.dismiss_journal())
            .append(action.to_bytes()?)
            .build();
        if self.journals.commit(mutation).is_success() {
            Ok(())
        } else {
            Err(Error::CommitFailed {
                target: format!("journal '{}'", self.dismiss_journal()),
            })
        }
    }

    /// Reads the dismiss journal.
    ///
    /// Records that fail to decode are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the journal cannot be read.
    pub fn dismiss_actions(&self) -> Result<Vec<StreamLocalAction>> {
        read_actions(self.journals.as_ref(), self.dismiss_journal())
    }

    /// Counts entries by kind and lists the journals.
    ///
    /// # Errors
    ///
    /// Returns an error if the content store or the journals cannot be read.
    pub fn status(&self) -> Result<StoreStatus> {
        let mut status = StoreStatus::default();
        for key in self.content_keys()? {
            match key.kind() {
                ContentKeyKind::Plain => status.content += 1,
                ContentKeyKind::SemanticProperties => status.semantic_properties += 1,
                ContentKeyKind::SharedState => status.shared_states += 1,
                ContentKeyKind::UploadableAction => status.uploadable_actions += 1,
            }
        }
        status.dismiss_actions = self.dismiss_actions()?.len();
        status.journals = self.journals.get_all_journals()?;
        Ok(status)
    }

    /// Builds a content collector for this store.
    ///
    /// The collector's valid actions are the dismiss journal's contents, read
    /// when a sweep runs. If the journal cannot be read the sweep is skipped.
    #[must_use]
    pub fn content_gc(
        &self,
        accessible: Supplier<HashSet<ContentId>>,
        reserved: HashSet<ContentId>,
    ) -> Arc<ContentGc> {
        let journals = Arc::clone(&self.journals);
        let journal_name = self.dismiss_journal().to_string();
        let valid_actions: Supplier<Result<Vec<StreamLocalAction>>> =
            Arc::new(move || read_actions(journals.as_ref(), &journal_name));

        Arc::new(ContentGc::new(
            self.config.content_gc_config(),
            accessible,
            reserved,
            valid_actions,
            Arc::clone(&self.content),
            Arc::clone(&self.task_queue),
        ))
    }

    /// Queues a content sweep as background work.
    ///
    /// Returns the collector so callers can observe its attempt counter.
    pub fn trigger_content_gc(
        &self,
        accessible: Supplier<HashSet<ContentId>>,
        reserved: HashSet<ContentId>,
    ) -> Arc<ContentGc> {
        let gc = self.content_gc(accessible, reserved);
        let job_gc = Arc::clone(&gc);
        self.task_queue.execute(
            Task::GarbageCollectContent,
            TaskType::Background,
            Box::new(move || job_gc.run_scheduled()),
        );
        debug!("Content GC queued");
        gc
    }

    /// Rewrites the dismiss journal, keeping actions whose content is valid.
    ///
    /// Records that fail to decode are dropped by the rewrite.
    ///
    /// # Errors
    ///
    /// Returns an error if the journal cannot be read, an action cannot be
    /// encoded, or the rewrite commit fails.
    #[instrument(skip_all, fields(journal = %self.dismiss_journal()))]
    pub fn trigger_local_action_gc(
        &self,
        valid_content_ids: impl IntoIterator<Item = ContentId>,
    ) -> Result<LocalActionGcResult> {
        let actions = self.dismiss_actions()?;
        LocalActionGc::new(
            actions,
            valid_content_ids,
            Arc::clone(&self.journals),
            self.dismiss_journal(),
        )
        .gc()
    }
}

/// Reads and decodes one journal, skipping undecodable records.
fn read_actions(
    journals: &dyn JournalStorage,
    journal_name: &str,
) -> Result<Vec<StreamLocalAction>> {
    let records = journals.read(journal_name)?;
    let total = records.len();
    let actions: Vec<StreamLocalAction> = records
        .iter()
        .filter_map(|record| {
            StreamLocalAction::from_bytes(record)
                .inspect_err(|e| warn!(journal = journal_name, error = %e, "Skipping bad record"))
                .ok()
        })
        .collect();
    if actions.len() < total {
        metrics::counter!("journal_records_skipped_total")
            .increment(u64::try_from(total - actions.len()).unwrap_or(u64::MAX));
    }
    Ok(actions)
}
