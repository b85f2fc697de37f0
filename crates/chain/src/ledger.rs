//! The append-only provenance ledger.
//!
//! The ledger never caches its tip: every append re-reads it from the record
//! store inside a critical section, so two appends cannot link to the same
//! predecessor.

use crate::filter::BlockFilter;
use crate::verifier::ChainVerifier;
use gichain_core::{
    Block, CandidateBlock, Hash, IncompleteBlockError, PasswordError, ValidationError,
    GENESIS_INDEX,
};
use gichain_storage::{RecordStore, StorageError};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Incomplete(#[from] IncompleteBlockError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("password configuration error: {0}")]
    Password(#[from] PasswordError),

    #[error("ledger is empty")]
    EmptyLedger,

    #[error("no record found for {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Summary of the ledger's current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerStats {
    /// Number of stored blocks.
    pub block_count: u64,
    /// Sequence index of the tip, if any.
    pub tip_index: Option<u64>,
    /// Hash of the tip, if any.
    pub tip_hash: Option<Hash>,
}

/// Owns the canonical block sequence held by a record store.
pub struct Ledger<S> {
    store: S,
    /// Serialises read-tip / digest / insert.
    append_lock: Mutex<()>,
}

impl<S: RecordStore> Ledger<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            append_lock: Mutex::new(()),
        }
    }

    /// The backing record store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Link `candidate` to the current tip and persist it.
    ///
    /// Returns the finalized block. On error nothing has been persisted.
    pub fn append(&self, candidate: CandidateBlock) -> Result<Block> {
        // The guarded section holds no data, so a poisoned lock is still usable.
        let _guard = self
            .append_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let tip = self.store.find_latest()?;
        let (sequence_index, prev_hash) = match &tip {
            Some(tip) => {
                let next = tip.sequence_index.checked_add(1).ok_or_else(|| {
                    StorageError::Corrupted(format!(
                        "no index follows tip index {}",
                        tip.sequence_index
                    ))
                })?;
                (next, Some(tip.hash))
            }
            None => (GENESIS_INDEX, None),
        };

        let block = candidate.finalize(sequence_index, prev_hash);
        self.store.insert_record(&block)?;

        info!(
            index = block.sequence_index,
            hash = %block.hash,
            tag = block.tag_id(),
            product = block.product_id(),
            "appended block"
        );
        Ok(block)
    }

    /// The latest block. Fails on an empty ledger.
    pub fn fetch_tip(&self) -> Result<Block> {
        self.store.find_latest()?.ok_or(LedgerError::EmptyLedger)
    }

    /// Hash the next block will link to; `None` means the genesis sentinel.
    pub fn tip_hash(&self) -> Result<Option<Hash>> {
        Ok(self.store.find_latest()?.map(|b| b.hash))
    }

    pub fn get_by_sequence_index(&self, index: u64) -> Result<Option<Block>> {
        Ok(self.store.find_by_sequence_index(index)?)
    }

    /// Blocks matching `filter`, in sequence order.
    pub fn query(&self, filter: &BlockFilter) -> Result<Vec<Block>> {
        debug!(?filter, "querying ledger");
        Ok(self.store.find_where(&|block: &Block| filter.matches(block))?)
    }

    /// Every block, in sequence order.
    pub fn all(&self) -> Result<Vec<Block>> {
        self.query(&BlockFilter::new())
    }

    /// Blocks with indices in `[from, to]`.
    pub fn range(&self, from: u64, to: u64) -> Result<Vec<Block>> {
        if from > to {
            return Ok(Vec::new());
        }
        self.store
            .scan(from..to.saturating_add(1))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(LedgerError::from)
    }

    /// The last `count` blocks, most recent first.
    pub fn recent(&self, count: u64) -> Result<Vec<Block>> {
        let Some(tip) = self.store.find_latest()? else {
            return Ok(Vec::new());
        };
        if count == 0 {
            return Ok(Vec::new());
        }
        let from = tip
            .sequence_index
            .saturating_sub(count - 1)
            .max(GENESIS_INDEX);
        let mut blocks = self.range(from, tip.sequence_index)?;
        blocks.reverse();
        Ok(blocks)
    }

    pub fn stats(&self) -> Result<LedgerStats> {
        let tip = self.store.find_latest()?;
        Ok(LedgerStats {
            block_count: self.store.len()?,
            tip_index: tip.as_ref().map(|b| b.sequence_index),
            tip_hash: tip.map(|b| b.hash),
        })
    }

    /// A verifier over this ledger's store.
    pub fn verifier(&self) -> ChainVerifier<'_, S> {
        ChainVerifier::new(&self.store)
    }
}
