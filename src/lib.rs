//! # feedgc
//!
//! Garbage collection for Feed stream storage.
//!
//! A Feed store keeps stream content in a flat key-value store and user
//! actions in append-only journals. Over time both accumulate entries that
//! the current content tree can no longer reach. This crate reclaims them:
//!
//! - [`ContentGc`] sweeps the content store, deleting content, semantic
//!   properties and shared state whose content ID is neither accessible nor
//!   reserved. It backs off while other background work is queued.
//! - [`LocalActionGc`] rewrites the dismiss journal so it only holds actions
//!   targeting content that still exists.
//!
//! ## Example
//!
//! ```rust,ignore
//! use feedgc::{FeedStore, config::FeedGcConfig, tasks::SerialTaskQueue};
//! use std::sync::Arc;
//!
//! let queue = Arc::new(SerialTaskQueue::new());
//! let store = FeedStore::in_memory(queue.clone(), FeedGcConfig::default());
//!
//! store.trigger_content_gc(Arc::new(|| accessible_ids()), reserved);
//! queue.run_all();
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod config;
pub mod gc;
pub mod models;
pub mod observability;
pub mod storage;
pub mod store;
pub mod tasks;

pub use gc::{ContentGc, ContentGcConfig, ContentGcOutcome, LocalActionGc};
pub use models::{ActionType, ContentId, ContentKey, ContentKeyKind, StreamLocalAction};
pub use storage::{CommitResult, ContentStorage, JournalStorage};
pub use store::FeedStore;

/// Error type for feedgc operations.
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Malformed CLI arguments, config values, journal names |
/// | `StorageReadFailed` | Listing keys or reading a journal fails |
/// | `CommitFailed` | A content or journal commit reports failure |
/// | `Serialization` | A local action cannot be encoded or decoded |
/// | `OperationFailed` | File I/O, logging setup and other infrastructure errors |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A storage read failed.
    ///
    /// Content GC treats this as "skip this sweep"; nothing is mutated.
    #[error("storage read '{operation}' failed: {cause}")]
    StorageReadFailed {
        /// The read that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// A storage commit reported failure.
    #[error("commit to {target} failed")]
    CommitFailed {
        /// The store or journal the commit targeted.
        target: String,
    },

    /// A record could not be serialized or deserialized.
    #[error("serialization failed: {cause}")]
    Serialization {
        /// The underlying cause.
        cause: String,
    },

    /// An operation failed.
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

/// Result type alias for feedgc operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Returns the current Unix timestamp in seconds.
///
/// Falls back to 0 if the system clock is before the Unix epoch.
///
/// ```rust
/// let ts = feedgc::current_timestamp();
/// assert!(ts > 0);
/// ```
#[must_use]
pub fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidInput("bad journal".to_string());
        assert_eq!(err.to_string(), "invalid input: bad journal");

        let err = Error::StorageReadFailed {
            operation: "get_all_keys".to_string(),
            cause: "disk gone".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "storage read 'get_all_keys' failed: disk gone"
        );

        let err = Error::CommitFailed {
            target: "journal 'action-dismiss'".to_string(),
        };
        assert_eq!(err.to_string(), "commit to journal 'action-dismiss' failed");
    }
}
