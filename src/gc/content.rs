//! Content store garbage collector.
//!
//! Deletes content, semantic properties and (optionally) shared state whose
//! content ID is no longer reachable from the session tree.
//!
//! # Deferral
//!
//! A sweep reads the full key set and then deletes in one commit. Running it
//! while other background storage work is queued risks racing those writes,
//! so [`ContentGc::gc`] re-queues itself instead, at most
//! `maximum_gc_attempts` times in a row. Once the budget is spent the sweep
//! runs regardless of queue state.
//!
//! # Example
//!
//! ```rust,ignore
//! use feedgc::gc::{ContentGc, ContentGcConfig};
//! use std::sync::Arc;
//!
//! let gc = Arc::new(ContentGc::new(
//!     ContentGcConfig::default(),
//!     Arc::new(move || session.accessible_content_ids()),
//!     reserved_ids,
//!     Arc::new(move || store.dismiss_actions()),
//!     content_storage,
//!     task_queue,
//! ));
//!
//! match gc.gc()? {
//!     ContentGcOutcome::Deferred { attempt } => println!("deferred ({attempt})"),
//!     ContentGcOutcome::Swept(result) => println!("{}", result.summary()),
//! }
//! ```

use super::{Supplier, duration_to_millis, u64_to_f64, usize_to_f64};
use crate::models::{ContentId, ContentKey, StreamLocalAction};
use crate::storage::{ContentMutation, ContentStorage};
use crate::tasks::{Task, TaskQueue, TaskType};
use crate::{Error, Result};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Default number of deferrals tolerated before a sweep is forced.
pub const DEFAULT_MAXIMUM_GC_ATTEMPTS: u32 = 10;

/// Whether a `gc()` call sweeps now or re-queues itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GcDecision {
    /// Sweep now and reset the attempt counter.
    RunNow,
    /// Re-queue and bump the attempt counter.
    Defer,
}

/// Decides whether to defer a sweep.
///
/// Defers only while background work is pending and fewer than
/// `maximum_attempts` deferrals have happened since the last sweep.
#[must_use]
pub const fn decide(
    pending_background_tasks: usize,
    attempts: u32,
    maximum_attempts: u32,
) -> GcDecision {
    if pending_background_tasks > 0 && attempts < maximum_attempts {
        GcDecision::Defer
    } else {
        GcDecision::RunNow
    }
}

/// Content GC configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentGcConfig {
    /// Deferrals tolerated before a sweep is forced. Zero never defers.
    pub maximum_gc_attempts: u32,

    /// Keep every shared-state entry regardless of reachability.
    pub keep_shared_states: bool,
}

impl Default for ContentGcConfig {
    fn default() -> Self {
        Self {
            maximum_gc_attempts: DEFAULT_MAXIMUM_GC_ATTEMPTS,
            keep_shared_states: false,
        }
    }
}

impl ContentGcConfig {
    /// Creates a config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the deferral budget.
    #[must_use]
    pub const fn with_maximum_gc_attempts(mut self, attempts: u32) -> Self {
        self.maximum_gc_attempts = attempts;
        self
    }

    /// Sets whether shared states are kept.
    #[must_use]
    pub const fn with_keep_shared_states(mut self, keep: bool) -> Self {
        self.keep_shared_states = keep;
        self
    }
}

/// Statistics from one content sweep.
#[derive(Debug, Clone, Default)]
pub struct ContentGcResult {
    /// Number of keys examined.
    pub keys_checked: usize,

    /// Number of keys deleted.
    pub keys_deleted: usize,

    /// Uploadable-action keys skipped.
    pub uploadable_actions_retained: usize,

    /// Shared-state keys skipped because shared states are kept.
    pub shared_states_retained: usize,

    /// Keys deleted, in scan order.
    pub deleted_keys: Vec<String>,

    /// Duration of the sweep in milliseconds.
    pub duration_ms: u64,
}

impl ContentGcResult {
    /// Returns `true` if anything was deleted.
    #[must_use]
    pub const fn has_deletions(&self) -> bool {
        self.keys_deleted > 0
    }

    /// Returns a human-readable summary.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.keys_deleted == 0 {
            format!(
                "No unreachable content found ({} keys checked in {}ms)",
                self.keys_checked, self.duration_ms
            )
        } else {
            format!(
                "Deleted {} unreachable entries - checked {} in {}ms",
                self.keys_deleted, self.keys_checked, self.duration_ms
            )
        }
    }
}

/// What a `gc()` call did.
#[derive(Debug, Clone)]
pub enum ContentGcOutcome {
    /// Background work was pending; the sweep was re-queued.
    Deferred {
        /// Consecutive deferrals so far, including this one.
        attempt: u32,
    },
    /// The sweep ran and its deletions were committed.
    Swept(ContentGcResult),
}

/// Garbage collector for the content store.
///
/// Hold it in an `Arc`: deferral hands a clone to the task queue.
pub struct ContentGc {
    config: ContentGcConfig,
    accessible: Supplier<HashSet<ContentId>>,
    reserved: HashSet<ContentId>,
    valid_actions: Supplier<Result<Vec<StreamLocalAction>>>,
    storage: Arc<dyn ContentStorage>,
    task_queue: Arc<dyn TaskQueue>,
    attempts: AtomicU32,
}

impl ContentGc {
    /// Creates a new content garbage collector.
    ///
    /// # Arguments
    ///
    /// * `config` - Deferral budget and shared-state policy.
    /// * `accessible` - Yields the content IDs reachable from the session tree.
    /// * `reserved` - Content IDs that must never be collected.
    /// * `valid_actions` - Yields the local actions still considered valid.
    ///   A failure aborts the sweep before anything is deleted.
    /// * `storage` - Content store to sweep.
    /// * `task_queue` - Queue used to check for backlog and to re-queue.
    #[must_use]
    pub fn new(
        config: ContentGcConfig,
        accessible: Supplier<HashSet<ContentId>>,
        reserved: HashSet<ContentId>,
        valid_actions: Supplier<Result<Vec<StreamLocalAction>>>,
        storage: Arc<dyn ContentStorage>,
        task_queue: Arc<dyn TaskQueue>,
    ) -> Self {
        Self {
            config,
            accessible,
            reserved,
            valid_actions,
            storage,
            task_queue,
            attempts: AtomicU32::new(0),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &ContentGcConfig {
        &self.config
    }

    /// Returns the number of consecutive deferrals since the last sweep.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Runs or defers a content sweep.
    ///
    /// Suppliers are only evaluated when the sweep actually runs.
    ///
    /// # Errors
    ///
    /// - [`Error::StorageReadFailed`] if the key set or the valid actions
    ///   cannot be read. Nothing is mutated and nothing is re-queued.
    /// - [`Error::CommitFailed`] if the deletion commit fails. The attempt
    ///   counter stays reset; the next trigger sweeps again.
    #[instrument(
        name = "feedgc.gc.content",
        skip(self),
        fields(
            request_id = tracing::field::Empty,
            component = "gc",
            operation = "content",
            maximum_gc_attempts = self.config.maximum_gc_attempts
        )
    )]
    pub fn gc(self: &Arc<Self>) -> Result<ContentGcOutcome> {
        if let Some(request_id) = crate::observability::current_request_id() {
            tracing::Span::current().record("request_id", request_id.as_str());
        }

        let pending = self.task_queue.background_task_count();
        let attempts = self.attempts.load(Ordering::SeqCst);

        match decide(pending, attempts, self.config.maximum_gc_attempts) {
            GcDecision::Defer => {
                let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
                debug!(
                    pending_background_tasks = pending,
                    attempt, "Delaying content GC due to pending background tasks"
                );
                metrics::counter!("gc_content_deferrals_total").increment(1);

                let gc = Arc::clone(self);
                self.task_queue.execute(
                    Task::GarbageCollectContent,
                    TaskType::Background,
                    Box::new(move || gc.run_scheduled()),
                );
                Ok(ContentGcOutcome::Deferred { attempt })
            },
            GcDecision::RunNow => {
                if pending > 0 {
                    info!(
                        pending_background_tasks = pending,
                        attempts, "Deferral budget spent, forcing content GC"
                    );
                }
                self.attempts.store(0, Ordering::SeqCst);
                self.sweep().map(ContentGcOutcome::Swept)
            },
        }
    }

    /// Entry point for queued runs. Failures are logged, not returned.
    pub fn run_scheduled(self: &Arc<Self>) {
        if let Err(e) = self.gc() {
            warn!(error = %e, "Scheduled content GC failed");
        }
    }

    /// Returns `true` if `id` is reachable or pinned.
    fn is_retained(&self, id: &ContentId, accessible: &HashSet<ContentId>) -> bool {
        accessible.contains(id) || self.reserved.contains(id)
    }

    fn sweep(&self) -> Result<ContentGcResult> {
        let start = Instant::now();

        let keys = self.storage.get_all_keys().inspect_err(|e| {
            warn!(error = %e, "Failed to read content keys, skipping GC");
        })?;

        let accessible = (self.accessible)();
        let valid_action_ids: HashSet<ContentId> = (self.valid_actions)()
            .map_err(|e| match e {
                Error::StorageReadFailed { .. } => e,
                other => Error::StorageReadFailed {
                    operation: "read_valid_actions".to_string(),
                    cause: other.to_string(),
                },
            })
            .inspect_err(|e| {
                warn!(error = %e, "Failed to read valid actions, skipping GC");
            })?
            .into_iter()
            .map(|action| action.feature_content_id)
            .collect();

        debug!(
            key_count = keys.len(),
            accessible = accessible.len(),
            reserved = self.reserved.len(),
            valid_actions = valid_action_ids.len(),
            "Sweeping content store"
        );

        let mut result = ContentGcResult {
            keys_checked: keys.len(),
            ..Default::default()
        };

        for key in keys {
            let delete = match ContentKey::parse(&key) {
                ContentKey::UploadableAction(_) => {
                    result.uploadable_actions_retained += 1;
                    false
                },
                ContentKey::SharedState(_) if self.config.keep_shared_states => {
                    result.shared_states_retained += 1;
                    false
                },
                ContentKey::SharedState(id) | ContentKey::Plain(id) => {
                    !self.is_retained(&id, &accessible)
                },
                ContentKey::SemanticProperties(id) => {
                    !self.is_retained(&id, &accessible) && !valid_action_ids.contains(&id)
                },
            };

            if delete {
                result.deleted_keys.push(key);
            }
        }
        result.keys_deleted = result.deleted_keys.len();

        let mutation = result
            .deleted_keys
            .iter()
            .fold(ContentMutation::builder(), |builder, key| builder.delete(key.as_str()))
            .build();

        // Nothing to delete leaves the store untouched.
        if !mutation.is_empty() && !self.storage.commit(mutation).is_success() {
            warn!(
                keys_deleted = result.keys_deleted,
                "Content modification failed removing unreachable content"
            );
            metrics::counter!("gc_content_runs_total", "status" => "commit_failed").increment(1);
            return Err(Error::CommitFailed {
                target: "content store".to_string(),
            });
        }

        result.duration_ms = duration_to_millis(start.elapsed());

        metrics::counter!("gc_content_runs_total", "status" => "success").increment(1);
        metrics::gauge!("gc_content_deleted").set(usize_to_f64(result.keys_deleted));
        metrics::histogram!("gc_content_duration_ms").record(u64_to_f64(result.duration_ms));

        info!(
            keys_checked = result.keys_checked,
            keys_deleted = result.keys_deleted,
            uploadable_actions_retained = result.uploadable_actions_retained,
            shared_states_retained = result.shared_states_retained,
            duration_ms = result.duration_ms,
            "Content GC completed"
        );

        Ok(result)
    }
}
