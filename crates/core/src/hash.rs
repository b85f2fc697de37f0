//! Blake3 hashing and the canonical block digest.
//!
//! A block digest covers, in this order:
//!
//! ```text
//! domain tag
//! giTag.tagId, giTag.creationDate
//! product.productId, product.name, product.originAddress
//! ownership.ownershipId, ownership.startDate, ownership.endDate
//! transaction.transactionId, transaction.date
//! user.userId, user.name, user.email, user.passwordHash, user.registrationDate
//! prevHash
//! ```
//!
//! Strings are written as an 8-byte little-endian length followed by their
//! UTF-8 bytes, so no field content can shift a boundary. Integers are 8-byte
//! little-endian, dates are `YYYY-MM-DD`, the optional end date carries a
//! presence byte, and `prevHash` is its lowercase hex form (`""` for genesis).

use crate::block::BlockContent;
use chrono::NaiveDate;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A named alias for a 32-byte(u8) array, used to represent a 256-bit hash.
pub type H256 = [u8; 32];

/// Domain separation prefix for block digests.
const BLOCK_DOMAIN: &[u8] = b"gichain/block/v1";

/// A 256-bit digest, rendered as 64 lowercase hex characters.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Hash(pub H256);

impl Hash {
    /// The zero hash (all zeros).
    pub const ZERO: Self = Self([0u8; 32]);

    /// Create a new Hash from raw bytes.
    pub fn from_bytes(bytes: H256) -> Self {
        Self(bytes)
    }

    /// Get the underlying bytes.
    pub fn as_bytes(&self) -> &H256 {
        &self.0
    }

    /// Convert to a lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// First 16 hex characters, for display.
    pub fn short(&self) -> String {
        self.to_hex()[..16].to_string()
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", &self.to_hex()[..8])
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Hash {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<H256> for Hash {
    fn from(bytes: H256) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hash::from_hex(&s).map_err(de::Error::custom)
    }
}

/// Serde adapter for `prevHash`: `None` is written as the genesis sentinel.
pub mod prev_hash {
    use super::Hash;
    use crate::block::GENESIS_SENTINEL;
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(prev: &Option<Hash>, serializer: S) -> Result<S::Ok, S::Error> {
        match prev {
            Some(hash) => hash.serialize(serializer),
            None => serializer.serialize_str(GENESIS_SENTINEL),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Hash>, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s == GENESIS_SENTINEL {
            return Ok(None);
        }
        Hash::from_hex(&s).map(Some).map_err(de::Error::custom)
    }
}

/// Length-prefixed field writer feeding a Blake3 hasher.
struct Canonical {
    hasher: blake3::Hasher,
}

impl Canonical {
    fn new(domain: &[u8]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(domain);
        Self { hasher }
    }

    fn bytes(&mut self, data: &[u8]) -> &mut Self {
        self.hasher.update(&(data.len() as u64).to_le_bytes());
        self.hasher.update(data);
        self
    }

    fn str(&mut self, s: &str) -> &mut Self {
        self.bytes(s.as_bytes())
    }

    fn u64(&mut self, value: u64) -> &mut Self {
        self.hasher.update(&value.to_le_bytes());
        self
    }

    fn date(&mut self, date: NaiveDate) -> &mut Self {
        self.str(&date.format("%Y-%m-%d").to_string())
    }

    fn optional_date(&mut self, date: Option<NaiveDate>) -> &mut Self {
        match date {
            Some(date) => {
                self.hasher.update(&[1]);
                self.date(date)
            }
            None => {
                self.hasher.update(&[0]);
                self
            }
        }
    }

    fn finish(&self) -> Hash {
        Hash(self.hasher.finalize().into())
    }
}

/// Compute the digest of a block's content bound to its predecessor.
///
/// `prev_hash` is `None` for the first block, which hashes the genesis
/// sentinel in its place.
pub fn digest(content: &BlockContent, prev_hash: Option<&Hash>) -> Hash {
    let prev_hex = prev_hash.map(Hash::to_hex).unwrap_or_default();
    let BlockContent {
        gi_tag,
        product,
        ownership,
        transaction,
        user,
    } = content;

    Canonical::new(BLOCK_DOMAIN)
        .str(&gi_tag.tag_id)
        .date(gi_tag.creation_date)
        .u64(product.product_id)
        .str(&product.name)
        .str(&product.origin_address)
        .str(&ownership.ownership_id)
        .date(ownership.start_date)
        .optional_date(ownership.end_date)
        .str(&transaction.transaction_id)
        .date(transaction.date)
        .str(&user.user_id)
        .str(&user.name)
        .str(&user.email)
        .str(user.password_hash.as_str())
        .date(user.registration_date)
        .str(&prev_hex)
        .finish()
}
