//! Key-value persistence for desk records
//!
//! The desk keeps exactly two durable records: the registered user list and
//! the Nikitovsky block timestamp. Both go through [`KeyValueStore`] so the
//! gate can run against an in-memory fake in tests and a directory of files
//! in production.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{StoreError, StoreResult};

/// Record holding the JSON array of registered users
pub const USERS_KEY: &str = "qr_system_users";

/// Record holding the Nikitovsky block deadline (milliseconds since epoch)
pub const NIKITOVSKY_BLOCK_KEY: &str = "nikitovsky_block_until";

/// Synchronous string store scoped to one desk installation
pub trait KeyValueStore {
    /// Read a record, `None` when absent
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Create or replace a record
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Delete a record. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> StoreResult<()>;
}

/// Volatile store backed by a map
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held
    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.records.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.records
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.records.borrow_mut().remove(key);
        Ok(())
    }
}

/// Durable store keeping one file per key under a data directory
pub struct FileStore {
    /// Base path for storage
    base_path: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `base_path`
    pub fn new(base_path: PathBuf) -> StoreResult<Self> {
        std::fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }

    fn record_path(&self, key: &str) -> StoreResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.base_path.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let path = self.record_path(key)?;
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(&path)?))
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let path = self.record_path(key)?;

        // Write to temp file first, then rename for atomicity
        let temp_path = path.with_extension("json.tmp");
        std::fs::write(&temp_path, value)?;
        std::fs::rename(&temp_path, &path)?;

        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let path = self.record_path(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
