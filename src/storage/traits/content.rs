//! Content storage trait.
//!
//! The content store is a flat key-value map. Keys carry a structural prefix
//! (see [`crate::models::ContentKey`]); values are opaque bytes.
//!
//! # Error Modes and Guarantees
//!
//! | Call | Failure Signal | Atomicity |
//! |------|----------------|-----------|
//! | `get_all_keys` | `Err(Error::StorageReadFailed)` | Snapshot of the key set |
//! | `commit` | `CommitResult::Failure` | All operations or none |

use crate::Result;

/// Outcome of committing a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitResult {
    /// Every operation was applied.
    Success,
    /// Nothing was applied.
    Failure,
}

impl CommitResult {
    /// Returns `true` for [`CommitResult::Success`].
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

/// A single operation in a content mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentOperation {
    /// Insert or replace the value stored under `key`.
    Upsert {
        /// Storage key.
        key: String,
        /// New value.
        value: Vec<u8>,
    },
    /// Remove `key`. Deleting a missing key is a no-op.
    Delete {
        /// Storage key.
        key: String,
    },
}

/// An ordered batch of content operations committed together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentMutation {
    operations: Vec<ContentOperation>,
}

impl ContentMutation {
    /// Starts building a mutation.
    #[must_use]
    pub fn builder() -> ContentMutationBuilder {
        ContentMutationBuilder::default()
    }

    /// Returns the operations in commit order.
    #[must_use]
    pub fn operations(&self) -> &[ContentOperation] {
        &self.operations
    }

    /// Returns the number of operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Returns `true` if the mutation holds no operations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Consumes the mutation, returning its operations.
    #[must_use]
    pub fn into_operations(self) -> Vec<ContentOperation> {
        self.operations
    }
}

/// Builder for [`ContentMutation`].
#[derive(Debug, Default)]
pub struct ContentMutationBuilder {
    operations: Vec<ContentOperation>,
}

impl ContentMutationBuilder {
    /// Appends an upsert.
    #[must_use]
    pub fn upsert(mut self, key: impl Into<String>, value: Vec<u8>) -> Self {
        self.operations.push(ContentOperation::Upsert {
            key: key.into(),
            value,
        });
        self
    }

    /// Appends a delete.
    #[must_use]
    pub fn delete(mut self, key: impl Into<String>) -> Self {
        self.operations
            .push(ContentOperation::Delete { key: key.into() });
        self
    }

    /// Finishes the mutation.
    #[must_use]
    pub fn build(self) -> ContentMutation {
        ContentMutation {
            operations: self.operations,
        }
    }
}

/// Trait for synchronous content stores.
///
/// # Implementor Notes
///
/// - Methods use `&self` to enable sharing via `Arc<dyn ContentStorage>`
/// - Use interior mutability for the underlying map or file handle
/// - `commit` reports failure through [`CommitResult`], never by panicking
pub trait ContentStorage: Send + Sync {
    /// Lists every key currently stored.
    fn get_all_keys(&self) -> Result<Vec<String>>;

    /// Applies a mutation.
    fn commit(&self, mutation: ContentMutation) -> CommitResult;
}
