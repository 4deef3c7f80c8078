//! sled database wrapper implementing the client's state store.

use sled::Db;
use std::path::Path;
use thiserror::Error;

/// Storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Byte-oriented key-value store used to persist user state.
pub trait KeyValueStore: Send + Sync {
    /// Get the value stored under `key`, if any.
    fn get_value(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set_value(&self, key: &str, value: Vec<u8>) -> Result<()>;

    /// Remove `key`. Removing a missing key is not an error.
    fn delete(&self, key: &str) -> Result<()>;
}

/// sled-backed [`KeyValueStore`]. Writes are flushed before returning.
pub struct SledStore {
    db: Db,
}

impl SledStore {
    /// Open a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Open an in-memory database (for testing).
    pub fn open_temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }
}

impl KeyValueStore for SledStore {
    fn get_value(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.db.get(key)?.map(|v| v.to_vec()))
    }

    fn set_value(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.db.insert(key, value)?;
        self.db.flush()?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.db.remove(key)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_temporary() {
        let store = SledStore::open_temporary().unwrap();
        assert!(store.db.is_empty());
    }

    #[test]
    fn test_set_get_value() {
        let store = SledStore::open_temporary().unwrap();
        store.set_value("testvalue", b"data".to_vec()).unwrap();

        let value = store.get_value("testvalue").unwrap();
        assert_eq!(value.as_deref(), Some(&b"data"[..]));
        assert_eq!(store.get_value("missing").unwrap(), None);
    }

    #[test]
    fn test_delete() {
        let store = SledStore::open_temporary().unwrap();
        store.set_value("key", b"value".to_vec()).unwrap();
        store.delete("key").unwrap();
        assert_eq!(store.get_value("key").unwrap(), None);
        store.delete("key").unwrap();
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = SledStore::open(dir.path()).unwrap();
            store.set_value("user", b"record".to_vec()).unwrap();
        }
        let store = SledStore::open(dir.path()).unwrap();
        assert_eq!(store.get_value("user").unwrap(), Some(b"record".to_vec()));
    }
}
