//! Storage layer abstraction.
//!
//! Two synchronous stores back a Feed session:
//! - **Content**: flat key-value map of content, semantic properties, shared
//!   state and uploadable actions
//! - **Journal**: named append-only logs of local actions
//!
//! Both come with an in-memory backend and a filesystem backend.

// Allow significant_drop_tightening - the guarded maps are tiny.
#![allow(clippy::significant_drop_tightening)]

pub mod filesystem;
pub mod memory;
pub mod traits;

pub use filesystem::{FilesystemContentStorage, FilesystemJournalStorage};
pub use memory::{InMemoryContentStorage, InMemoryJournalStorage};
pub use traits::{
    CommitResult, ContentMutation, ContentOperation, ContentStorage, JournalMutation,
    JournalOperation, JournalStorage,
};
