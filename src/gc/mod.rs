//! Garbage collection module.
//!
//! Two collectors keep Feed storage bounded:
//!
//! - [`ContentGc`] sweeps the content store for entries whose content ID is
//!   neither accessible from the session tree nor reserved.
//! - [`LocalActionGc`] rewrites an action journal, dropping actions whose
//!   target content no longer exists.
//!
//! # Example
//!
//! ```rust,ignore
//! use feedgc::gc::{DISMISS_ACTION_JOURNAL, LocalActionGc};
//!
//! let gc = LocalActionGc::new(actions, valid_ids, journal_storage, DISMISS_ACTION_JOURNAL);
//! let result = gc.gc()?;
//! println!("{}", result.summary());
//! ```
//!
//! # Retention Sets
//!
//! Accessible IDs and valid actions are passed as [`Supplier`]s so they are
//! only computed when a sweep actually runs, not when it is deferred.

mod content;
mod local_action;

pub use content::{
    ContentGc, ContentGcConfig, ContentGcOutcome, ContentGcResult, DEFAULT_MAXIMUM_GC_ATTEMPTS,
    GcDecision, decide,
};
pub use local_action::{DISMISS_ACTION_JOURNAL, LocalActionGc, LocalActionGcResult};

use std::sync::Arc;
use std::time::Duration;

/// Lazily evaluated value, shared between the collector and its caller.
pub type Supplier<T> = Arc<dyn Fn() -> T + Send + Sync>;

/// Safely converts Duration to milliseconds as u64, capping at `u64::MAX`.
#[inline]
fn duration_to_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Converts usize to f64 for metrics, capping at `u32::MAX`.
#[inline]
fn usize_to_f64(value: usize) -> f64 {
    let capped = u32::try_from(value).unwrap_or(u32::MAX);
    f64::from(capped)
}

/// Converts u64 to f64 for metrics, capping at `u32::MAX`.
#[inline]
fn u64_to_f64(value: u64) -> f64 {
    let capped = u32::try_from(value).unwrap_or(u32::MAX);
    f64::from(capped)
}
