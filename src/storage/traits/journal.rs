//! Journal storage trait.
//!
//! A journal is a named, append-only list of opaque records. Mutations are
//! scoped to one journal and applied in order.

use super::CommitResult;
use crate::Result;

/// A single operation in a journal mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalOperation {
    /// Append a record to the end of the journal.
    Append(Vec<u8>),
    /// Remove the journal and all of its records.
    Delete,
}

/// An ordered batch of operations against one journal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalMutation {
    journal_name: String,
    operations: Vec<JournalOperation>,
}

impl JournalMutation {
    /// Starts building a mutation for `journal_name`.
    #[must_use]
    pub fn builder(journal_name: impl Into<String>) -> JournalMutationBuilder {
        JournalMutationBuilder {
            journal_name: journal_name.into(),
            operations: Vec::new(),
        }
    }

    /// Returns the journal this mutation targets.
    #[must_use]
    pub fn journal_name(&self) -> &str {
        &self.journal_name
    }

    /// Returns the operations in commit order.
    #[must_use]
    pub fn operations(&self) -> &[JournalOperation] {
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
}

/// Builder for [`JournalMutation`].
#[derive(Debug)]
pub struct JournalMutationBuilder {
    journal_name: String,
    operations: Vec<JournalOperation>,
}

impl JournalMutationBuilder {
    /// Appends a record.
    #[must_use]
    pub fn append(mut self, record: Vec<u8>) -> Self {
        self.operations.push(JournalOperation::Append(record));
        self
    }

    /// Deletes the journal.
    #[must_use]
    pub fn delete(mut self) -> Self {
        self.operations.push(JournalOperation::Delete);
        self
    }

    /// Finishes the mutation.
    #[must_use]
    pub fn build(self) -> JournalMutation {
        JournalMutation {
            journal_name: self.journal_name,
            operations: self.operations,
        }
    }
}

/// Trait for synchronous journal stores.
pub trait JournalStorage: Send + Sync {
    /// Reads every record of `journal_name`, oldest first.
    ///
    /// A journal that does not exist reads as empty.
    fn read(&self, journal_name: &str) -> Result<Vec<Vec<u8>>>;

    /// Lists the names of all journals.
    fn get_all_journals(&self) -> Result<Vec<String>>;

    /// Applies a mutation.
    fn commit(&self, mutation: JournalMutation) -> CommitResult;
}
