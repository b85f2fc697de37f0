//! Ledger orchestration for gichain.
//!
//! This crate ties the block model to a record store:
//! - **Ledger**: serialised append against the stored tip, read-only queries
//! - **ChainVerifier**: replays stored blocks to detect tampering, removal
//!   and reordering
//! - **ProvenanceService**: the record-level operations a routing layer or
//!   CLI calls
//!
//! # Example
//!
//! ```rust,no_run
//! use gichain_chain::{LedgerConfig, ProvenanceService, RecordSubmission};
//! use gichain_storage::BlockStore;
//!
//! let store = BlockStore::open("./data/ledger").unwrap();
//! let service = ProvenanceService::new(store, &LedgerConfig::default()).unwrap();
//!
//! let json = std::fs::read_to_string("record.json").unwrap();
//! let submission: RecordSubmission = serde_json::from_str(&json).unwrap();
//! let block = service.submit_record(&submission).unwrap();
//! println!("appended #{} {}", block.sequence_index, block.hash);
//!
//! assert!(service.verify_integrity(None).unwrap().is_valid());
//! ```

pub mod filter;
pub mod ledger;
pub mod service;
pub mod verifier;

// Re-export commonly used types
pub use filter::BlockFilter;
pub use ledger::{Ledger, LedgerError, LedgerStats, Result};
pub use service::{LedgerConfig, ProvenanceService, RecordSubmission};
pub use verifier::{ChainVerifier, VerificationResult, Violation, ViolationKind, VerifyMode};
