//! Durable key/value storage behind the session store.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::StorageError;

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

const SESSION_FILE: &str = "session.json";

/// One write in a storage batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageChange {
    Set(String, String),
    Remove(String),
}

impl StorageChange {
    pub fn set(key: &str, value: impl Into<String>) -> Self {
        StorageChange::Set(key.to_string(), value.into())
    }

    pub fn remove(key: &str) -> Self {
        StorageChange::Remove(key.to_string())
    }
}

/// String-keyed, string-valued store. A batch passed to `apply` lands as a
/// single write so readers never observe half of it.
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn apply(&self, changes: &[StorageChange]) -> Result<(), StorageError>;

    /// Drop everything, including unreadable contents
    fn reset(&self) -> Result<(), StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.apply(&[StorageChange::set(key, value)])
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.apply(&[StorageChange::remove(key)])
    }
}

fn apply_changes(entries: &mut BTreeMap<String, String>, changes: &[StorageChange]) {
    for change in changes {
        match change {
            StorageChange::Set(key, value) => {
                entries.insert(key.clone(), value.clone());
            }
            StorageChange::Remove(key) => {
                entries.remove(key);
            }
        }
    }
}

/// JSON object file (`session.json`) inside the client's config directory
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(SESSION_FILE),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, StorageError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        let entries: BTreeMap<String, String> = serde_json::from_str(&content)?;
        Ok(entries)
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(dir) = self.path.parent() {
            if !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }

        // Write-then-rename keeps the file whole for concurrent readers
        let tmp = self.path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(entries)?;
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_entries()?.remove(key))
    }

    fn apply(&self, changes: &[StorageChange]) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();
        let mut entries = self.read_entries()?;
        apply_changes(&mut entries, changes);
        self.write_entries(&entries)
    }

    fn reset(&self) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

/// Process-local storage for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: Mutex::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    pub fn entries(&self) -> BTreeMap<String, String> {
        self.entries.lock().clone()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn apply(&self, changes: &[StorageChange]) -> Result<(), StorageError> {
        apply_changes(&mut self.entries.lock(), changes);
        Ok(())
    }

    fn reset(&self) -> Result<(), StorageError> {
        self.entries.lock().clear();
        Ok(())
    }
}
