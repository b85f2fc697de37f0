//! Append-only record store for gichain.
//!
//! The ledger only ever talks to storage through the [`RecordStore`] trait:
//! append a record, read the latest one, read by sequence index, filter, and
//! stream in order. There is no update or delete path.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                     Ledger / Verifier                    │
//! └────────────────────────┬────────────────────────────────┘
//!                          │ RecordStore
//! ┌────────────────────────▼────────────────────────────────┐
//! │  ┌─────────────────────────┐  ┌──────────────────────┐  │
//! │  │ BlockStore              │  │ Storage (DB)         │  │
//! │  │  - conditional append   │  │  - sled wrapper      │  │
//! │  │  - tip pointer          │  │  - bincode values    │  │
//! │  │  - ordered scans        │  │  - key helpers       │  │
//! │  └─────────────────────────┘  └──────────────────────┘  │
//! └────────────────────────┬────────────────────────────────┘
//!                          │
//! ┌────────────────────────▼────────────────────────────────┐
//! │                    sled Database                         │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use gichain_storage::{BlockStore, RecordStore};
//!
//! let store = BlockStore::open("./data/ledger").unwrap();
//! if let Some(tip) = store.find_latest().unwrap() {
//!     println!("tip #{} {}", tip.sequence_index, tip.hash);
//! }
//! ```

pub mod blocks;
pub mod db;
pub mod records;

// Re-export commonly used types
pub use blocks::BlockStore;
pub use db::{Result, Storage, StorageError};
pub use records::{BlockScan, RecordStore, SlotScan};
