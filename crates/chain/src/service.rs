//! Operations exposed to the surrounding service layer.

use crate::filter::BlockFilter;
use crate::ledger::{Ledger, LedgerError, Result};
use crate::verifier::{VerificationResult, VerifyMode};
use gichain_core::{Argon2Config, Block, BlockBuilder, CredentialHasher};
use gichain_storage::RecordStore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Ledger configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Cost parameters for hashing submitted user passwords.
    #[serde(default)]
    pub argon2: Argon2Config,
    /// Mode used by `verify_integrity` when the caller does not pick one.
    #[serde(default)]
    pub verify_mode: VerifyMode,
}

/// A provenance record as submitted by a client, one flat JSON object.
#[derive(Clone, Deserialize)]
pub struct RecordSubmission {
    #[serde(rename = "GITagID")]
    pub gi_tag_id: String,
    #[serde(rename = "GICreationDate")]
    pub gi_creation_date: String,
    #[serde(rename = "ProductID")]
    pub product_id: i64,
    #[serde(rename = "ProductName")]
    pub product_name: String,
    #[serde(rename = "AddressOfOrigin", default)]
    pub address_of_origin: String,
    #[serde(rename = "OwnershipID")]
    pub ownership_id: String,
    #[serde(rename = "OwnershipStartDate")]
    pub ownership_start_date: String,
    #[serde(rename = "OwnershipEndDate", default)]
    pub ownership_end_date: Option<String>,
    #[serde(rename = "TransactionID")]
    pub transaction_id: String,
    #[serde(rename = "TransactionDate")]
    pub transaction_date: String,
    #[serde(rename = "UserID")]
    pub user_id: String,
    #[serde(rename = "UserName")]
    pub user_name: String,
    #[serde(rename = "EmailID")]
    pub email: String,
    #[serde(rename = "Password")]
    pub password: String,
    #[serde(rename = "RegistrationDate")]
    pub registration_date: String,
}

impl fmt::Debug for RecordSubmission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordSubmission")
            .field("gi_tag_id", &self.gi_tag_id)
            .field("product_id", &self.product_id)
            .field("ownership_id", &self.ownership_id)
            .field("transaction_id", &self.transaction_id)
            .field("user_id", &self.user_id)
            .field("password", &"<redacted>")
            .finish_non_exhaustive()
    }
}

/// Provenance ledger as seen by a routing layer or CLI.
pub struct ProvenanceService<S> {
    ledger: Ledger<S>,
    hasher: CredentialHasher,
    verify_mode: VerifyMode,
}

impl<S: RecordStore> ProvenanceService<S> {
    pub fn new(store: S, config: &LedgerConfig) -> Result<Self> {
        Ok(Self {
            ledger: Ledger::new(store),
            hasher: CredentialHasher::new(config.argon2)?,
            verify_mode: config.verify_mode,
        })
    }

    pub fn ledger(&self) -> &Ledger<S> {
        &self.ledger
    }

    /// Validate, build and append one record.
    pub fn submit_record(&self, submission: &RecordSubmission) -> Result<Block> {
        let mut builder = BlockBuilder::with_hasher(self.hasher);
        builder
            .add_gi_tag(&submission.gi_tag_id, &submission.gi_creation_date)?
            .add_product(
                submission.product_id,
                &submission.product_name,
                &submission.address_of_origin,
            )?
            .add_ownership(
                &submission.ownership_id,
                &submission.ownership_start_date,
                submission.ownership_end_date.as_deref(),
            )?
            .add_transaction(&submission.transaction_id, &submission.transaction_date)?
            .add_user(
                &submission.user_id,
                &submission.user_name,
                &submission.email,
                &submission.password,
                &submission.registration_date,
            )?;

        let candidate = builder.build()?;
        self.ledger.append(candidate)
    }

    pub fn get_all_records(&self) -> Result<Vec<Block>> {
        self.ledger.all()
    }

    pub fn get_records_by_tag(&self, tag_id: &str) -> Result<Vec<Block>> {
        self.ledger.query(&BlockFilter::new().tag(tag_id))
    }

    /// The first block recorded for `product_id`.
    pub fn get_record_by_product_id(&self, product_id: u64) -> Result<Block> {
        self.get_product_history(product_id)?
            .into_iter()
            .next()
            .ok_or_else(|| LedgerError::NotFound(format!("product {product_id}")))
    }

    /// Every block recorded for `product_id`, oldest first.
    pub fn get_product_history(&self, product_id: u64) -> Result<Vec<Block>> {
        self.ledger.query(&BlockFilter::new().product(product_id))
    }

    /// Verify `range` (or the whole chain) using the configured mode.
    pub fn verify_integrity(&self, range: Option<Range<u64>>) -> Result<VerificationResult> {
        self.verify_integrity_with(range, self.verify_mode)
    }

    pub fn verify_integrity_with(
        &self,
        range: Option<Range<u64>>,
        mode: VerifyMode,
    ) -> Result<VerificationResult> {
        Ok(self.ledger.verifier().verify(range, mode)?)
    }
}
