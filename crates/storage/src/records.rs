//! The record store contract the ledger is written against.

use crate::db::Result;
use gichain_core::Block;
use std::ops::{Range, RangeInclusive};

/// Lazy, ascending stream of stored blocks.
pub type BlockScan<'a> = Box<dyn Iterator<Item = Result<Block>> + 'a>;

/// Lazy, ascending stream of `(slot, block)` pairs, where `slot` is the
/// position the store holds the block under.
pub type SlotScan<'a> = Box<dyn Iterator<Item = Result<(u64, Block)>> + 'a>;

/// An ordered, append-only store of finalized blocks.
///
/// Implementations never modify or remove a record once inserted. Every call
/// is bounded and fallible; retrying is left to the caller.
pub trait RecordStore {
    /// Append a block at its `sequence_index`.
    ///
    /// Fails with [`StorageError::Conflict`](crate::StorageError::Conflict)
    /// if that index is already occupied. A failed insert writes nothing.
    fn insert_record(&self, block: &Block) -> Result<()>;

    /// The most recently appended block.
    fn find_latest(&self) -> Result<Option<Block>>;

    /// Highest occupied slot.
    ///
    /// Read from the store's own layout, never from a block's
    /// `sequence_index`, which is not covered by the block hash.
    fn latest_slot(&self) -> Result<Option<u64>>;

    fn find_by_sequence_index(&self, index: u64) -> Result<Option<Block>>;

    /// Stream the occupied slots in `slots` with their blocks, ascending.
    fn scan_slots(&self, slots: RangeInclusive<u64>) -> SlotScan<'_>;

    /// Stream the blocks stored under indices in `range`, in ascending order.
    ///
    /// The stream is restartable: calling `scan` again with a later start
    /// resumes from there.
    fn scan(&self, range: Range<u64>) -> BlockScan<'_> {
        match range.end.checked_sub(1) {
            Some(last) if range.start <= last => Box::new(
                self.scan_slots(range.start..=last)
                    .map(|entry| entry.map(|(_, block)| block)),
            ),
            _ => Box::new(std::iter::empty()),
        }
    }

    /// All blocks matching `predicate`, in sequence order.
    fn find_where(&self, predicate: &dyn Fn(&Block) -> bool) -> Result<Vec<Block>> {
        let mut matches = Vec::new();
        for entry in self.scan_slots(0..=u64::MAX) {
            let (_, block) = entry?;
            if predicate(&block) {
                matches.push(block);
            }
        }
        Ok(matches)
    }

    /// Number of stored blocks.
    fn len(&self) -> Result<u64> {
        let mut count = 0;
        for entry in self.scan_slots(0..=u64::MAX) {
            entry?;
            count += 1;
        }
        Ok(count)
    }

    fn is_empty(&self) -> Result<bool> {
        Ok(self.latest_slot()?.is_none())
    }
}
