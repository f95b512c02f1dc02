//! Data models for feedgc.
//!
//! Content keys and the local actions recorded against them.

mod action;
mod content;

pub use action::{ActionType, StreamLocalAction};
pub use content::{
    ContentId, ContentKey, ContentKeyKind, SEMANTIC_PROPERTIES_PREFIX, SHARED_STATE_PREFIX,
    UPLOADABLE_ACTION_PREFIX,
};
