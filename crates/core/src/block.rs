//! Provenance data groups, candidate blocks and finalized blocks.

use crate::hash::{digest, Hash};
use crate::password::PasswordHash;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Sequence index assigned to the first block of a ledger.
pub const GENESIS_INDEX: u64 = 1;

/// `prevHash` value carried by the first block.
pub const GENESIS_SENTINEL: &str = "";

/// Designated-origin certificate the product is registered under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiTag {
    pub tag_id: String,
    pub creation_date: NaiveDate,
}

/// Product identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Always positive.
    pub product_id: u64,
    pub name: String,
    pub origin_address: String,
}

/// One ownership period of the product. An open period has no end date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ownership {
    pub ownership_id: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDetails {
    pub transaction_id: String,
    pub date: NaiveDate,
}

/// Identity of the submitting user. Only the password hash is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub password_hash: PasswordHash,
    pub registration_date: NaiveDate,
}

/// The five data groups that make up a block's hashed content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockContent {
    pub gi_tag: GiTag,
    pub product: Product,
    pub ownership: Ownership,
    pub transaction: TransactionDetails,
    pub user: UserIdentity,
}

impl BlockContent {
    /// Digest of this content bound to `prev_hash`.
    pub fn digest(&self, prev_hash: Option<&Hash>) -> Hash {
        digest(self, prev_hash)
    }
}

/// A complete, validated block that has not been linked into a ledger yet.
///
/// Only [`BlockBuilder::build`](crate::BlockBuilder::build) creates these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateBlock {
    content: BlockContent,
}

impl CandidateBlock {
    pub(crate) fn new(content: BlockContent) -> Self {
        Self { content }
    }

    pub fn content(&self) -> &BlockContent {
        &self.content
    }

    /// Bind the candidate to its predecessor and position, computing its hash.
    pub fn finalize(self, sequence_index: u64, prev_hash: Option<Hash>) -> Block {
        let hash = self.content.digest(prev_hash.as_ref());
        Block {
            sequence_index,
            content: self.content,
            prev_hash,
            hash,
        }
    }
}

/// A finalized ledger block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Position in the ledger, starting at [`GENESIS_INDEX`].
    pub sequence_index: u64,
    pub content: BlockContent,
    /// Hash of the preceding block, `None` for the first block.
    #[serde(with = "crate::hash::prev_hash")]
    pub prev_hash: Option<Hash>,
    /// Digest over `content` and `prev_hash`.
    pub hash: Hash,
}

impl Block {
    /// Recompute the digest from the stored content and stored `prev_hash`.
    pub fn recompute_hash(&self) -> Hash {
        self.content.digest(self.prev_hash.as_ref())
    }

    /// Whether the stored hash matches the stored content.
    pub fn has_valid_hash(&self) -> bool {
        self.recompute_hash() == self.hash
    }

    /// Check if this is the first block of a ledger.
    pub fn is_genesis(&self) -> bool {
        self.sequence_index == GENESIS_INDEX && self.prev_hash.is_none()
    }

    /// `prev_hash` in its wire form.
    pub fn prev_hash_hex(&self) -> String {
        self.prev_hash
            .map(|h| h.to_hex())
            .unwrap_or_else(|| GENESIS_SENTINEL.to_string())
    }

    pub fn tag_id(&self) -> &str {
        &self.content.gi_tag.tag_id
    }

    pub fn product_id(&self) -> u64 {
        self.content.product.product_id
    }
}
