//! sled-backed block storage.

use crate::db::{Result, Storage, StorageError, BLOCK_PREFIX};
use crate::records::{RecordStore, SlotScan};
use gichain_core::Block;
use sled::transaction::{abort, ConflictableTransactionResult, TransactionError};
use std::ops::RangeInclusive;
use std::path::Path;
use tracing::{debug, warn};

/// Key of the tip pointer (sequence index of the latest block).
const TIP_KEY: &[u8] = b"ledger:tip";

/// Append-only block store.
///
/// Layout:
/// - `block:index:{index}` → bincode-encoded [`Block`]
/// - `ledger:tip` → big-endian index of the latest block
#[derive(Clone)]
pub struct BlockStore {
    storage: Storage,
}

impl BlockStore {
    /// Wrap an already opened database.
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Open (or create) a store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let storage = Storage::open(&path)?;
        debug!(path = %path.as_ref().display(), "opened block store");
        Ok(Self::new(storage))
    }

    /// Open an in-memory store (for testing).
    pub fn open_temporary() -> Result<Self> {
        Ok(Self::new(Storage::open_temporary()?))
    }

    /// The underlying database.
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn flush(&self) -> Result<()> {
        self.storage.flush()
    }

    /// Sequence index of the latest block, if any.
    pub fn tip_index(&self) -> Result<Option<u64>> {
        match self.storage.inner().get(TIP_KEY)? {
            Some(bytes) => {
                let raw: [u8; 8] = bytes[..].try_into().map_err(|_| {
                    StorageError::Corrupted(format!("tip pointer has {} bytes", bytes.len()))
                })?;
                Ok(Some(u64::from_be_bytes(raw)))
            }
            None => Ok(None),
        }
    }

    fn slot_of(key: &[u8]) -> Result<u64> {
        Storage::index_from_key(key).ok_or_else(|| {
            StorageError::Corrupted(format!("unexpected key under block prefix: {key:?}"))
        })
    }

    fn decode(key: &[u8], value: &[u8]) -> Result<(u64, Block)> {
        let slot = Self::slot_of(key)?;
        let block: Block = bincode::deserialize(value)?;
        Ok((slot, block))
    }
}

impl RecordStore for BlockStore {
    fn insert_record(&self, block: &Block) -> Result<()> {
        let index = block.sequence_index;
        let key = Storage::block_index_key(index);
        let encoded = bincode::serialize(block)?;
        let tip = index.to_be_bytes().to_vec();

        // Record and tip pointer land together, and only into an empty slot.
        let outcome = self.storage.inner().transaction(
            |tx| -> ConflictableTransactionResult<(), StorageError> {
                if tx.get(key.as_slice())?.is_some() {
                    return abort(StorageError::Conflict { index });
                }
                tx.insert(key.as_slice(), encoded.as_slice())?;
                tx.insert(TIP_KEY, tip.as_slice())?;
                Ok(())
            },
        );

        match outcome {
            Ok(()) => Ok(()),
            Err(TransactionError::Abort(err)) => {
                warn!(index, "rejected insert into occupied slot");
                Err(err)
            }
            Err(TransactionError::Storage(err)) => Err(StorageError::Database(err)),
        }
    }

    fn find_latest(&self) -> Result<Option<Block>> {
        let Some(index) = self.tip_index()? else {
            return Ok(None);
        };
        let block = self
            .find_by_sequence_index(index)?
            .ok_or_else(|| StorageError::Corrupted(format!("tip block {index} is missing")))?;
        if block.sequence_index != index {
            return Err(StorageError::Corrupted(format!(
                "tip block stored at {index} claims index {}",
                block.sequence_index
            )));
        }
        Ok(Some(block))
    }

    fn latest_slot(&self) -> Result<Option<u64>> {
        match self.storage.inner().scan_prefix(BLOCK_PREFIX).next_back() {
            Some(entry) => {
                let (key, _) = entry?;
                Self::slot_of(&key).map(Some)
            }
            None => Ok(None),
        }
    }

    fn find_by_sequence_index(&self, index: u64) -> Result<Option<Block>> {
        self.storage.get(Storage::block_index_key(index))
    }

    fn scan_slots(&self, slots: RangeInclusive<u64>) -> SlotScan<'_> {
        let (first, last) = slots.into_inner();
        if first > last {
            return Box::new(std::iter::empty());
        }
        let start = Storage::block_index_key(first);
        let end = Storage::block_index_key(last);
        let iter = self
            .storage
            .inner()
            .range(start..=end)
            .map(|entry| {
                let (key, value) = entry?;
                Self::decode(&key, &value)
            });
        Box::new(iter)
    }

    fn len(&self) -> Result<u64> {
        Ok(self.storage.inner().scan_prefix(BLOCK_PREFIX).count() as u64)
    }
}
