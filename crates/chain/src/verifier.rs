//! Chain integrity verification.
//!
//! The verifier replays stored blocks in slot order and checks, for each:
//! - contiguity of slots, and that each block's `sequence_index` matches its
//!   slot (`SequenceGap`)
//! - the stored hash against a recomputation over the stored content and
//!   stored `prev_hash` (`HashMismatch`)
//! - the stored `prev_hash` against the previous block's stored hash, or the
//!   genesis sentinel for the first block (`LinkBroken`)
//!
//! Violations are only reported. Nothing is repaired or rolled back.

use gichain_core::{Block, Hash, GENESIS_INDEX};
use gichain_storage::{RecordStore, StorageError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use tracing::{info, warn};

/// How far a verification run goes after finding a problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerifyMode {
    /// Stop at the first violation.
    #[default]
    FailFast,
    /// Check every block and collect all violations.
    FullScan,
}

/// What was wrong with a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    /// The stored hash does not match the stored content.
    HashMismatch { stored: Hash, computed: Hash },
    /// `prev_hash` does not point at the preceding block. `None` stands for
    /// the genesis sentinel.
    LinkBroken {
        expected: Option<Hash>,
        found: Option<Hash>,
    },
    /// A sequence index was skipped or repeated.
    SequenceGap { expected: u64, found: u64 },
}

impl ViolationKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::HashMismatch { .. } => "HashMismatch",
            Self::LinkBroken { .. } => "LinkBroken",
            Self::SequenceGap { .. } => "SequenceGap",
        }
    }
}

fn link(hash: &Option<Hash>) -> String {
    hash.map(|h| h.short()).unwrap_or_else(|| "<genesis>".into())
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HashMismatch { stored, computed } => write!(
                f,
                "hash mismatch (stored {}, computed {})",
                stored.short(),
                computed.short()
            ),
            Self::LinkBroken { expected, found } => write!(
                f,
                "broken link (expected prev {}, found {})",
                link(expected),
                link(found)
            ),
            Self::SequenceGap { expected, found } => {
                write!(f, "sequence gap (expected index {expected}, found {found})")
            }
        }
    }
}

/// A single integrity violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Sequence index the violation was found at.
    pub index: u64,
    pub kind: ViolationKind,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}: {}", self.index, self.kind)
    }
}

/// Outcome of a verification run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationResult {
    Valid {
        blocks_checked: u64,
    },
    Invalid {
        blocks_checked: u64,
        violations: Vec<Violation>,
    },
}

impl VerificationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }

    pub fn blocks_checked(&self) -> u64 {
        match self {
            Self::Valid { blocks_checked } | Self::Invalid { blocks_checked, .. } => {
                *blocks_checked
            }
        }
    }

    pub fn violations(&self) -> &[Violation] {
        match self {
            Self::Valid { .. } => &[],
            Self::Invalid { violations, .. } => violations,
        }
    }
}

/// What the next block's `prev_hash` must be.
#[derive(Clone, Copy)]
enum ExpectedLink {
    /// The predecessor was not available, so the first link is not checked.
    Unknown,
    Hash(Option<Hash>),
}

/// Replays a record store to prove no block was altered, removed or reordered.
pub struct ChainVerifier<'a, S> {
    store: &'a S,
}

impl<'a, S: RecordStore> ChainVerifier<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Verify the whole chain, stopping at the first violation.
    pub fn verify_all(&self) -> Result<VerificationResult, StorageError> {
        self.verify(None, VerifyMode::FailFast)
    }

    /// Verify the blocks with sequence indices in `range` (all blocks when
    /// `None`).
    ///
    /// Positions come from where the store holds each block, not from the
    /// block's own `sequence_index`. The chain length is fixed when the run
    /// starts: blocks appended during the scan are not covered by the result.
    pub fn verify(
        &self,
        range: Option<Range<u64>>,
        mode: VerifyMode,
    ) -> Result<VerificationResult, StorageError> {
        let Some(latest) = self.store.latest_slot()? else {
            return Ok(VerificationResult::Valid { blocks_checked: 0 });
        };

        let (start, last) = match range {
            Some(r) => match r.end.checked_sub(1) {
                Some(last) => (r.start.max(GENESIS_INDEX), last.min(latest)),
                None => return Ok(VerificationResult::Valid { blocks_checked: 0 }),
            },
            None => (GENESIS_INDEX, latest),
        };
        if start > last {
            return Ok(VerificationResult::Valid { blocks_checked: 0 });
        }

        let mut expected_link = if start == GENESIS_INDEX {
            ExpectedLink::Hash(None)
        } else {
            match self.store.find_by_sequence_index(start - 1)? {
                Some(previous) => ExpectedLink::Hash(Some(previous.hash)),
                None => ExpectedLink::Unknown,
            }
        };
        // `None` once the last representable slot has been checked.
        let mut next_slot = Some(start);
        let mut blocks_checked = 0;
        let mut violations = Vec::new();

        for entry in self.store.scan_slots(start..=last) {
            let (slot, block) = entry?;
            let expected_slot = next_slot.unwrap_or(slot);
            let found = Self::check_block(slot, &block, expected_slot, expected_link);

            blocks_checked += 1;
            next_slot = slot.checked_add(1);
            expected_link = ExpectedLink::Hash(Some(block.hash));

            if found.is_empty() {
                continue;
            }
            Self::log(&found);
            if mode == VerifyMode::FailFast {
                violations.extend(found.into_iter().take(1));
                return Ok(Self::finish(blocks_checked, violations));
            }
            violations.extend(found);
        }

        // Blocks missing from the end of the range.
        if let Some(expected) = next_slot.filter(|&slot| slot <= last) {
            let violation = Violation {
                index: expected,
                kind: ViolationKind::SequenceGap {
                    expected,
                    found: last.saturating_add(1),
                },
            };
            Self::log(std::slice::from_ref(&violation));
            violations.push(violation);
        }

        Ok(Self::finish(blocks_checked, violations))
    }

    fn check_block(
        slot: u64,
        block: &Block,
        expected_slot: u64,
        expected_link: ExpectedLink,
    ) -> Vec<Violation> {
        let mut found = Vec::new();

        if slot != expected_slot {
            found.push(Violation {
                index: slot,
                kind: ViolationKind::SequenceGap {
                    expected: expected_slot,
                    found: slot,
                },
            });
        }

        // The record's own index is not hashed, so it must agree with where
        // it is stored.
        if block.sequence_index != slot {
            found.push(Violation {
                index: slot,
                kind: ViolationKind::SequenceGap {
                    expected: slot,
                    found: block.sequence_index,
                },
            });
        }

        let computed = block.recompute_hash();
        if computed != block.hash {
            found.push(Violation {
                index: slot,
                kind: ViolationKind::HashMismatch {
                    stored: block.hash,
                    computed,
                },
            });
        }

        if let ExpectedLink::Hash(expected) = expected_link {
            if block.prev_hash != expected {
                found.push(Violation {
                    index: slot,
                    kind: ViolationKind::LinkBroken {
                        expected,
                        found: block.prev_hash,
                    },
                });
            }
        }

        found
    }

    fn log(violations: &[Violation]) {
        for violation in violations {
            warn!(
                index = violation.index,
                kind = violation.kind.name(),
                "{}",
                violation
            );
        }
    }

    fn finish(blocks_checked: u64, violations: Vec<Violation>) -> VerificationResult {
        if violations.is_empty() {
            info!(blocks_checked, "chain verified");
            VerificationResult::Valid { blocks_checked }
        } else {
            info!(
                blocks_checked,
                violations = violations.len(),
                "chain verification failed"
            );
            VerificationResult::Invalid {
                blocks_checked,
                violations,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gichain_core::{Argon2Config, BlockBuilder, CredentialHasher};
    use gichain_storage::{BlockStore, Storage};

    fn candidate(product_id: i64) -> gichain_core::CandidateBlock {
        let mut builder =
            BlockBuilder::with_hasher(CredentialHasher::new(Argon2Config::minimal()).unwrap());
        builder
            .add_gi_tag("GI-3", "2009-09-09")
            .unwrap()
            .add_product(product_id, "Channapatna Toys", "Channapatna")
            .unwrap()
            .add_ownership("OWN-3", "2024-01-01", None)
            .unwrap()
            .add_transaction(&format!("TX-{product_id}"), "2024-01-02")
            .unwrap()
            .add_user("U-3", "Arjun", "arjun@example.com", "pw", "2023-03-03")
            .unwrap();
        builder.build().unwrap()
    }

    /// Store with `count` correctly linked blocks.
    fn chain(count: u64) -> (BlockStore, Vec<Block>) {
        let store = BlockStore::open_temporary().unwrap();
        let mut blocks: Vec<Block> = Vec::new();
        for i in 0..count {
            let prev = blocks.last().map(|b| b.hash);
            let block = candidate(100 + i as i64).finalize(GENESIS_INDEX + i, prev);
            store.insert_record(&block).unwrap();
            blocks.push(block);
        }
        (store, blocks)
    }

    /// Overwrite the record in `slot`, bypassing the append-only path.
    fn overwrite_slot(store: &BlockStore, slot: u64, block: &Block) {
        store
            .storage()
            .inner()
            .insert(
                Storage::block_index_key(slot),
                bincode::serialize(block).unwrap(),
            )
            .unwrap();
    }

    fn overwrite(store: &BlockStore, block: &Block) {
        overwrite_slot(store, block.sequence_index, block);
    }

    fn kinds(result: &VerificationResult) -> Vec<(u64, &'static str)> {
        result
            .violations()
            .iter()
            .map(|v| (v.index, v.kind.name()))
            .collect()
    }

    #[test]
    fn test_empty_chain_is_valid() {
        let store = BlockStore::open_temporary().unwrap();
        let result = ChainVerifier::new(&store).verify_all().unwrap();
        assert_eq!(result, VerificationResult::Valid { blocks_checked: 0 });
    }

    #[test]
    fn test_single_block_is_valid() {
        let (store, _) = chain(1);
        let result = ChainVerifier::new(&store).verify_all().unwrap();
        assert_eq!(result, VerificationResult::Valid { blocks_checked: 1 });
    }

    #[test]
    fn test_intact_chain_is_valid() {
        let (store, _) = chain(6);
        let verifier = ChainVerifier::new(&store);
        assert!(verifier.verify_all().unwrap().is_valid());
        assert_eq!(
            verifier
                .verify(None, VerifyMode::FullScan)
                .unwrap()
                .blocks_checked(),
            6
        );
    }

    #[test]
    fn test_content_tamper_fail_fast() {
        let (store, blocks) = chain(5);
        let mut tampered = blocks[2].clone();
        tampered.content.product.name = "Counterfeit Toys".into();
        overwrite(&store, &tampered);

        let result = ChainVerifier::new(&store).verify_all().unwrap();
        assert!(!result.is_valid());
        assert_eq!(kinds(&result), vec![(3, "HashMismatch")]);
        assert_eq!(result.blocks_checked(), 3);
    }

    #[test]
    fn test_content_tamper_full_scan() {
        let (store, blocks) = chain(5);
        let mut tampered = blocks[1].clone();
        tampered.content.user.email = "mallory@example.com".into();
        overwrite(&store, &tampered);

        let result = ChainVerifier::new(&store)
            .verify(None, VerifyMode::FullScan)
            .unwrap();
        assert_eq!(kinds(&result), vec![(2, "HashMismatch")]);
        assert_eq!(result.blocks_checked(), 5);
    }

    #[test]
    fn test_stored_hash_tamper() {
        let (store, blocks) = chain(3);
        let mut tampered = blocks[1].clone();
        tampered.hash = Hash([0x11; 32]);
        overwrite(&store, &tampered);

        let verifier = ChainVerifier::new(&store);

        let fail_fast = verifier.verify_all().unwrap();
        assert_eq!(kinds(&fail_fast), vec![(2, "HashMismatch")]);

        let full = verifier.verify(None, VerifyMode::FullScan).unwrap();
        assert_eq!(kinds(&full), vec![(2, "HashMismatch"), (3, "LinkBroken")]);
    }

    #[test]
    fn test_rehashed_tamper_breaks_next_link() {
        // An attacker who also fixes up the tampered block's own hash is
        // still caught by the next block's link.
        let (store, blocks) = chain(4);
        let mut tampered = blocks[1].clone();
        tampered.content.ownership.ownership_id = "OWN-FORGED".into();
        tampered.hash = tampered.recompute_hash();
        overwrite(&store, &tampered);

        let result = ChainVerifier::new(&store)
            .verify(None, VerifyMode::FullScan)
            .unwrap();
        assert_eq!(kinds(&result), vec![(3, "LinkBroken")]);
    }

    #[test]
    fn test_removed_block_is_gap() {
        let (store, _) = chain(5);
        store
            .storage()
            .inner()
            .remove(Storage::block_index_key(3))
            .unwrap();

        let result = ChainVerifier::new(&store)
            .verify(None, VerifyMode::FullScan)
            .unwrap();
        assert_eq!(kinds(&result), vec![(4, "SequenceGap"), (4, "LinkBroken")]);

        let fail_fast = ChainVerifier::new(&store).verify_all().unwrap();
        assert_eq!(kinds(&fail_fast), vec![(4, "SequenceGap")]);
    }

    #[test]
    fn test_rewritten_index_reported_at_its_slot() {
        let (store, blocks) = chain(5);
        let mut moved = blocks[2].clone();
        moved.sequence_index = 9;
        overwrite_slot(&store, 3, &moved);

        let verifier = ChainVerifier::new(&store);
        let full = verifier.verify(None, VerifyMode::FullScan).unwrap();
        assert_eq!(
            full.violations(),
            &[Violation {
                index: 3,
                kind: ViolationKind::SequenceGap {
                    expected: 3,
                    found: 9
                },
            }]
        );
        assert_eq!(full.blocks_checked(), 5);

        let fail_fast = verifier.verify_all().unwrap();
        assert_eq!(kinds(&fail_fast), vec![(3, "SequenceGap")]);
    }

    #[test]
    fn test_lowered_tip_index_does_not_hide_tampering() {
        let (store, blocks) = chain(5);
        let mut forged = blocks[2].clone();
        forged.content.product.name = "FORGED".into();
        overwrite(&store, &forged);
        let mut tip = blocks[4].clone();
        tip.sequence_index = 2;
        overwrite_slot(&store, 5, &tip);

        let result = ChainVerifier::new(&store)
            .verify(None, VerifyMode::FullScan)
            .unwrap();
        assert!(!result.is_valid());
        assert_eq!(result.blocks_checked(), 5);
        assert_eq!(kinds(&result), vec![(3, "HashMismatch"), (5, "SequenceGap")]);
    }

    #[test]
    fn test_largest_index_is_reported_not_overflowed() {
        let (store, blocks) = chain(3);
        let mut tip = blocks[2].clone();
        tip.sequence_index = u64::MAX;
        overwrite_slot(&store, 3, &tip);

        let verifier = ChainVerifier::new(&store);
        let result = verifier.verify(None, VerifyMode::FullScan).unwrap();
        assert_eq!(kinds(&result), vec![(3, "SequenceGap")]);

        // A record stored in the very last slot is still scanned and checked.
        let stray = candidate(500).finalize(u64::MAX, Some(blocks[2].hash));
        overwrite(&store, &stray);
        let result = verifier.verify(None, VerifyMode::FullScan).unwrap();
        assert_eq!(
            kinds(&result),
            vec![(3, "SequenceGap"), (u64::MAX, "SequenceGap")]
        );
        assert_eq!(result.blocks_checked(), 4);
    }

    #[test]
    fn test_genesis_with_prev_hash_is_broken() {
        let (store, _) = chain(2);
        let forged = candidate(100).finalize(GENESIS_INDEX, Some(Hash([9; 32])));
        overwrite(&store, &forged);

        let result = ChainVerifier::new(&store)
            .verify(None, VerifyMode::FullScan)
            .unwrap();
        assert_eq!(kinds(&result), vec![(1, "LinkBroken"), (2, "LinkBroken")]);
    }

    #[test]
    fn test_range_verification() {
        let (store, blocks) = chain(6);
        let mut tampered = blocks[1].clone();
        tampered.content.product.origin_address = "Nowhere".into();
        overwrite(&store, &tampered);

        let verifier = ChainVerifier::new(&store);

        // Range excluding the tampered block passes, with its first link
        // checked against the stored predecessor.
        let later = verifier.verify(Some(3..7), VerifyMode::FullScan).unwrap();
        assert_eq!(later, VerificationResult::Valid { blocks_checked: 4 });

        let covering = verifier.verify(Some(2..4), VerifyMode::FullScan).unwrap();
        assert_eq!(kinds(&covering), vec![(2, "HashMismatch")]);
        assert_eq!(covering.blocks_checked(), 2);

        // Out-of-bounds ranges are clamped.
        let clamped = verifier.verify(Some(0..100), VerifyMode::FullScan).unwrap();
        assert_eq!(clamped.blocks_checked(), 6);
        assert_eq!(
            verifier.verify(Some(50..60), VerifyMode::FailFast).unwrap(),
            VerificationResult::Valid { blocks_checked: 0 }
        );
    }

    #[test]
    fn test_snapshot_excludes_later_blocks() {
        let (store, blocks) = chain(3);
        let verifier = ChainVerifier::new(&store);
        let before = verifier.verify_all().unwrap();
        assert_eq!(before.blocks_checked(), 3);

        let next = candidate(200).finalize(4, Some(blocks[2].hash));
        store.insert_record(&next).unwrap();
        assert_eq!(verifier.verify_all().unwrap().blocks_checked(), 4);
    }

    #[test]
    fn test_violation_display() {
        let violation = Violation {
            index: 7,
            kind: ViolationKind::SequenceGap {
                expected: 7,
                found: 9,
            },
        };
        assert_eq!(
            violation.to_string(),
            "#7: sequence gap (expected index 7, found 9)"
        );
        let link = ViolationKind::LinkBroken {
            expected: None,
            found: Some(Hash([0xAB; 32])),
        };
        assert_eq!(
            link.to_string(),
            "broken link (expected prev <genesis>, found abababababababab)"
        );
    }

    #[test]
    fn test_verify_mode_serde() {
        assert_eq!(
            serde_json::to_string(&VerifyMode::FullScan).unwrap(),
            "\"full-scan\""
        );
        let mode: VerifyMode = serde_json::from_str("\"fail-fast\"").unwrap();
        assert_eq!(mode, VerifyMode::FailFast);
    }
}
