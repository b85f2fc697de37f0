//! Core ledger primitives for gichain.
//!
//! This crate provides the fundamental types used throughout the ledger:
//! - Block hashing (canonical encoding + Blake3 digest)
//! - The provenance data groups (GI tag, product, ownership, transaction, user)
//! - Staged block construction with per-group validation
//! - Password hashing for the submitting user
//!
//! # Lifecycle
//!
//! ```text
//! BlockBuilder ──build()──▶ CandidateBlock ──finalize(index, prev)──▶ Block
//!   (draft)                  (complete)                            (finalized)
//! ```
//!
//! Only the builder can produce a `CandidateBlock`, and only a candidate can
//! be finalized, so a partially supplied block never reaches storage.

pub mod block;
pub mod builder;
pub mod hash;
pub mod password;

// Re-export commonly used types at the crate root
pub use block::{
    Block, BlockContent, CandidateBlock, GiTag, Ownership, Product, TransactionDetails,
    UserIdentity, GENESIS_INDEX, GENESIS_SENTINEL,
};
pub use builder::{parse_date, BlockBuilder, IncompleteBlockError, ValidationError};
pub use hash::{digest, Hash, H256};
pub use password::{Argon2Config, CredentialHasher, PasswordError, PasswordHash};
