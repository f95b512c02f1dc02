//! Local action journal garbage collector.
//!
//! Rewrites an action journal so it only holds actions whose target content
//! still exists. The rewrite is exhaustive: the journal is deleted and the
//! surviving actions are appended again, all in one mutation.

use super::{duration_to_millis, u64_to_f64, usize_to_f64};
use crate::models::{ContentId, StreamLocalAction};
use crate::storage::{JournalMutation, JournalStorage};
use crate::{Error, Result};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

/// Name of the journal holding dismiss actions.
pub const DISMISS_ACTION_JOURNAL: &str = "action-dismiss";

/// Statistics from one journal rewrite.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalActionGcResult {
    /// Number of actions examined.
    pub actions_checked: usize,

    /// Number of actions written back.
    pub actions_kept: usize,

    /// Number of actions dropped.
    pub actions_dropped: usize,

    /// Duration of the rewrite in milliseconds.
    pub duration_ms: u64,
}

impl LocalActionGcResult {
    /// Returns a human-readable summary.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Kept {} of {} local actions ({} dropped) in {}ms",
            self.actions_kept, self.actions_checked, self.actions_dropped, self.duration_ms
        )
    }
}

/// Garbage collector for one local action journal.
pub struct LocalActionGc {
    actions: Vec<StreamLocalAction>,
    valid_content_ids: HashSet<ContentId>,
    storage: Arc<dyn JournalStorage>,
    journal_name: String,
}

impl LocalActionGc {
    /// Creates a new local action garbage collector.
    ///
    /// # Arguments
    ///
    /// * `actions` - Every action currently in the journal, in journal order.
    /// * `valid_content_ids` - Content IDs that still exist.
    /// * `storage` - Journal store to rewrite.
    /// * `journal_name` - Journal to rewrite, usually [`DISMISS_ACTION_JOURNAL`].
    #[must_use]
    pub fn new(
        actions: Vec<StreamLocalAction>,
        valid_content_ids: impl IntoIterator<Item = ContentId>,
        storage: Arc<dyn JournalStorage>,
        journal_name: impl Into<String>,
    ) -> Self {
        Self {
            actions,
            valid_content_ids: valid_content_ids.into_iter().collect(),
            storage,
            journal_name: journal_name.into(),
        }
    }

    /// Returns the journal this collector rewrites.
    #[must_use]
    pub fn journal_name(&self) -> &str {
        &self.journal_name
    }

    /// Returns the actions that survive, in their original order.
    pub fn valid_actions(&self) -> impl Iterator<Item = &StreamLocalAction> {
        self.actions
            .iter()
            .filter(|action| self.valid_content_ids.contains(action.feature_content_id()))
    }

    /// Builds the rewrite: one `Delete`, then one `Append` per surviving action.
    ///
    /// The `Delete` is always present, so an empty or fully invalid action
    /// list clears the journal.
    pub fn build_mutation(&self) -> Result<JournalMutation> {
        let mut builder = JournalMutation::builder(self.journal_name.as_str()).delete();
        for action in self.valid_actions() {
            builder = builder.append(action.to_bytes()?);
        }
        Ok(builder.build())
    }

    /// Rewrites the journal.
    ///
    /// # Errors
    ///
    /// - [`Error::Serialization`] if an action cannot be encoded.
    /// - [`Error::CommitFailed`] if the journal commit fails. Not retried.
    #[instrument(
        name = "feedgc.gc.local_action",
        skip(self),
        fields(
            request_id = tracing::field::Empty,
            component = "gc",
            operation = "local_action",
            journal = %self.journal_name,
            actions = self.actions.len()
        )
    )]
    pub fn gc(&self) -> Result<LocalActionGcResult> {
        let start = Instant::now();
        if let Some(request_id) = crate::observability::current_request_id() {
            tracing::Span::current().record("request_id", request_id.as_str());
        }

        let mutation = self.build_mutation()?;
        // The leading Delete is not an action.
        let actions_kept = mutation.len() - 1;

        if !self.storage.commit(mutation).is_success() {
            warn!(
                journal = %self.journal_name,
                "Failed to rewrite local action journal"
            );
            metrics::counter!("gc_local_action_runs_total", "status" => "commit_failed")
                .increment(1);
            return Err(Error::CommitFailed {
                target: format!("journal '{}'", self.journal_name),
            });
        }

        let result = LocalActionGcResult {
            actions_checked: self.actions.len(),
            actions_kept,
            actions_dropped: self.actions.len() - actions_kept,
            duration_ms: duration_to_millis(start.elapsed()),
        };

        metrics::counter!("gc_local_action_runs_total", "status" => "success").increment(1);
        metrics::gauge!("gc_local_action_dropped").set(usize_to_f64(result.actions_dropped));
        metrics::histogram!("gc_local_action_duration_ms").record(u64_to_f64(result.duration_ms));

        info!(
            actions_checked = result.actions_checked,
            actions_kept = result.actions_kept,
            actions_dropped = result.actions_dropped,
            duration_ms = result.duration_ms,
            "Local action GC completed"
        );

        Ok(result)
    }
}
