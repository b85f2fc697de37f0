//! sled database wrapper with serialization helpers.

use sled::Db;
use std::path::Path;
use thiserror::Error;

/// Storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Sequence index {index} is already occupied")]
    Conflict { index: u64 },

    #[error("Corrupted store: {0}")]
    Corrupted(String),
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Prefix shared by all block records.
pub(crate) const BLOCK_PREFIX: &[u8] = b"block:index:";

/// Wrapper around sled database with serialization helpers.
#[derive(Clone)]
pub struct Storage {
    db: Db,
}

impl Storage {
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

    /// Retrieve and deserialize a value.
    pub fn get<K, V>(&self, key: K) -> Result<Option<V>>
    where
        K: AsRef<[u8]>,
        V: serde::de::DeserializeOwned,
    {
        match self.db.get(key)? {
            Some(bytes) => {
                let value = bincode::deserialize(&bytes)?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Get the underlying sled database (for transactions and range scans).
    pub fn inner(&self) -> &Db {
        &self.db
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }

    // =========================================================================
    // Key Construction Helpers
    // =========================================================================

    /// Create the key of the block at `index`.
    /// Format: "block:index:" + index as big-endian bytes, so that key order
    /// is sequence order.
    pub fn block_index_key(index: u64) -> Vec<u8> {
        let mut key = BLOCK_PREFIX.to_vec();
        key.extend_from_slice(&index.to_be_bytes());
        key
    }

    /// Recover the sequence index from a block key.
    pub fn index_from_key(key: &[u8]) -> Option<u64> {
        let suffix = key.strip_prefix(BLOCK_PREFIX)?;
        let bytes: [u8; 8] = suffix.try_into().ok()?;
        Some(u64::from_be_bytes(bytes))
    }
}
