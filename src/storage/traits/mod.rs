//! Storage backend traits.

mod content;
mod journal;

pub use content::{
    CommitResult, ContentMutation, ContentMutationBuilder, ContentOperation, ContentStorage,
};
pub use journal::{JournalMutation, JournalMutationBuilder, JournalOperation, JournalStorage};
