//! Command handlers module.
//!
//! - `gc.rs`: content and local-action collection
//! - `status.rs`: store entry counts

mod gc;
mod status;

pub use gc::{cmd_gc, cmd_gc_actions};
pub use status::cmd_status;

use feedgc::ContentId;

/// Converts raw CLI IDs, ignoring blanks.
fn parse_ids(raw: Vec<String>) -> impl Iterator<Item = ContentId> {
    raw.into_iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .map(ContentId::from)
}
