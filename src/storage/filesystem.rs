//! Filesystem-based storage backends.
//!
//! Content lives in a single `content.json` file; each journal is its own
//! `journals/<name>.json` file. Values and records are hex-encoded so the
//! files stay valid JSON for arbitrary bytes.
//!
//! # Safety
//!
//! - **Atomic writes**: every commit writes a temp file in the target
//!   directory and renames it over the old file
//! - **Path traversal**: journal names are validated before they touch a path
//! - **File size limits**: oversized files are refused instead of loaded

use super::traits::{
    CommitResult, ContentMutation, ContentOperation, ContentStorage, JournalMutation,
    JournalOperation, JournalStorage,
};
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::warn;

/// Maximum size of any store file (16MB).
const MAX_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// File name of the content store inside the data directory.
pub const CONTENT_FILE_NAME: &str = "content.json";

/// Directory holding journal files inside the data directory.
pub const JOURNAL_DIR_NAME: &str = "journals";

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredContent {
    entries: BTreeMap<String, String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredJournal {
    records: Vec<String>,
}

/// Reads and parses a JSON file. A missing file yields `T::default()`.
fn read_json_file<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => {
            return Err(Error::StorageReadFailed {
                operation: "stat_store_file".to_string(),
                cause: format!("{}: {e}", path.display()),
            });
        },
    };

    if metadata.len() > MAX_FILE_SIZE {
        return Err(Error::StorageReadFailed {
            operation: "read_store_file".to_string(),
            cause: format!(
                "{} exceeds maximum size of {MAX_FILE_SIZE} bytes",
                path.display()
            ),
        });
    }

    let raw = fs::read(path).map_err(|e| Error::StorageReadFailed {
        operation: "read_store_file".to_string(),
        cause: format!("{}: {e}", path.display()),
    })?;

    serde_json::from_slice(&raw).map_err(|e| Error::StorageReadFailed {
        operation: "parse_store_file".to_string(),
        cause: format!("{}: {e}", path.display()),
    })
}

/// Serializes `value` and atomically replaces `path` with it.
fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(|e| Error::OperationFailed {
        operation: "create_store_dir".to_string(),
        cause: format!("{}: {e}", dir.display()),
    })?;

    let bytes = serde_json::to_vec_pretty(value).map_err(|e| Error::Serialization {
        cause: e.to_string(),
    })?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| Error::OperationFailed {
        operation: "create_temp_file".to_string(),
        cause: e.to_string(),
    })?;
    tmp.write_all(&bytes).map_err(|e| Error::OperationFailed {
        operation: "write_temp_file".to_string(),
        cause: e.to_string(),
    })?;
    tmp.persist(path).map_err(|e| Error::OperationFailed {
        operation: "persist_store_file".to_string(),
        cause: format!("{}: {}", path.display(), e.error),
    })?;
    Ok(())
}

fn decode_hex(value: &str, path: &Path) -> Result<Vec<u8>> {
    hex::decode(value).map_err(|e| Error::StorageReadFailed {
        operation: "decode_store_value".to_string(),
        cause: format!("{}: {e}", path.display()),
    })
}

/// Content store persisted as one JSON file.
#[derive(Debug)]
pub struct FilesystemContentStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FilesystemContentStorage {
    /// Creates a content store rooted at `data_dir`.
    #[must_use]
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join(CONTENT_FILE_NAME),
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, Vec<u8>>> {
        let stored: StoredContent = read_json_file(&self.path)?;
        stored
            .entries
            .into_iter()
            .map(|(key, value)| Ok((key, decode_hex(&value, &self.path)?)))
            .collect()
    }

    fn apply(&self, mutation: ContentMutation) -> Result<()> {
        let mut entries = self.load()?;
        for operation in mutation.into_operations() {
            match operation {
                ContentOperation::Upsert { key, value } => {
                    entries.insert(key, value);
                },
                ContentOperation::Delete { key } => {
                    entries.remove(&key);
                },
            }
        }

        let stored = StoredContent {
            entries: entries
                .into_iter()
                .map(|(key, value)| (key, hex::encode(value)))
                .collect(),
        };
        write_json_atomic(&self.path, &stored)
    }
}

impl ContentStorage for FilesystemContentStorage {
    fn get_all_keys(&self) -> Result<Vec<String>> {
        let stored: StoredContent = read_json_file(&self.path)?;
        Ok(stored.entries.into_keys().collect())
    }

    fn commit(&self, mutation: ContentMutation) -> CommitResult {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let operations = mutation.len();
        match self.apply(mutation) {
            Ok(()) => CommitResult::Success,
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    operations,
                    error = %e,
                    "Content commit failed"
                );
                CommitResult::Failure
            },
        }
    }
}

/// Journal store persisted as one JSON file per journal.
#[derive(Debug)]
pub struct FilesystemJournalStorage {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FilesystemJournalStorage {
    /// Creates a journal store rooted at `data_dir`.
    #[must_use]
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            dir: data_dir.as_ref().join(JOURNAL_DIR_NAME),
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the directory holding the journal files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Checks if a journal name is safe to use as a file name.
    fn is_safe_name(name: &str) -> bool {
        !name.is_empty()
            && name.len() <= 255
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }

    fn journal_path(&self, journal_name: &str) -> Result<PathBuf> {
        if !Self::is_safe_name(journal_name) {
            return Err(Error::InvalidInput(format!(
                "journal name contains invalid characters: {journal_name}"
            )));
        }
        Ok(self.dir.join(format!("{journal_name}.json")))
    }

    fn apply(&self, mutation: &JournalMutation) -> Result<()> {
        let path = self.journal_path(mutation.journal_name())?;
        let stored: StoredJournal = read_json_file(&path)?;
        let mut records = Some(stored.records);

        for operation in mutation.operations() {
            match operation {
                JournalOperation::Append(record) => {
                    records.get_or_insert_with(Vec::new).push(hex::encode(record));
                },
                JournalOperation::Delete => records = None,
            }
        }

        match records {
            Some(records) => write_json_atomic(&path, &StoredJournal { records }),
            None => match fs::remove_file(&path) {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                    Err(Error::OperationFailed {
                        operation: "delete_journal_file".to_string(),
                        cause: format!("{}: {e}", path.display()),
                    })
                },
                _ => Ok(()),
            },
        }
    }
}

impl JournalStorage for FilesystemJournalStorage {
    fn read(&self, journal_name: &str) -> Result<Vec<Vec<u8>>> {
        let path = self.journal_path(journal_name)?;
        let stored: StoredJournal = read_json_file(&path)?;
        stored
            .records
            .iter()
            .map(|record| decode_hex(record, &path))
            .collect()
    }

    fn get_all_journals(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(Error::StorageReadFailed {
                    operation: "list_journals".to_string(),
                    cause: format!("{}: {e}", self.dir.display()),
                });
            },
        };

        let mut names: Vec<String> = entries
            .filter_map(std::result::Result::ok)
            .filter_map(|entry| {
                let path = entry.path();
                if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                    return None;
                }
                path.file_stem()
                    .and_then(|stem| stem.to_str())
                    .filter(|stem| Self::is_safe_name(stem))
                    .map(str::to_string)
            })
            .collect();
        names.sort();
        Ok(names)
    }

    fn commit(&self, mutation: JournalMutation) -> CommitResult {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        match self.apply(&mutation) {
            Ok(()) => CommitResult::Success,
            Err(e) => {
                warn!(
                    journal = mutation.journal_name(),
                    operations = mutation.len(),
                    error = %e,
                    "Journal commit failed"
                );
                CommitResult::Failure
            },
        }
    }
}
