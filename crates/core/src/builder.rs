//! Staged construction of candidate blocks.
//!
//! Each data group is validated when it is supplied. Supplying a group again
//! replaces the earlier value. `build()` only succeeds once all five groups
//! are present.

use crate::block::{
    BlockContent, CandidateBlock, GiTag, Ownership, Product, TransactionDetails, UserIdentity,
};
use crate::password::{CredentialHasher, PasswordError};
use chrono::{DateTime, NaiveDate};
use thiserror::Error;

/// Malformed input to a builder step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} is not a valid date: {value:?}")]
    InvalidDate { field: &'static str, value: String },

    #[error("product id must be a positive integer, got {0}")]
    NonPositiveProductId(i64),

    #[error("ownership ends ({end}) before it starts ({start})")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },

    #[error("malformed email address: {0:?}")]
    MalformedEmail(String),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

/// `build()` was called before every data group was supplied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("block is incomplete, missing: {}", .missing.join(", "))]
pub struct IncompleteBlockError {
    pub missing: Vec<&'static str>,
}

pub type Result<T> = std::result::Result<T, ValidationError>;

/// Parse a calendar date given as `YYYY-MM-DD` or as an RFC 3339 date-time.
pub fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate> {
    let trimmed = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(datetime.date_naive());
    }
    Err(ValidationError::InvalidDate {
        field,
        value: value.to_string(),
    })
}

fn non_empty(field: &'static str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(trimmed.to_string())
}

fn validate_email(email: &str) -> Result<String> {
    let email = email.trim();
    let malformed = || ValidationError::MalformedEmail(email.to_string());

    if email.chars().any(char::is_whitespace) {
        return Err(malformed());
    }
    let (local, domain) = email.split_once('@').ok_or_else(malformed)?;
    if local.is_empty() || domain.contains('@') {
        return Err(malformed());
    }
    let labels_ok = domain.split('.').all(|label| !label.is_empty());
    if !domain.contains('.') || !labels_ok {
        return Err(malformed());
    }
    Ok(email.to_string())
}

/// Draft block accumulating the five data groups.
#[derive(Debug, Clone, Default)]
pub struct BlockBuilder {
    hasher: CredentialHasher,
    gi_tag: Option<GiTag>,
    product: Option<Product>,
    ownership: Option<Ownership>,
    transaction: Option<TransactionDetails>,
    user: Option<UserIdentity>,
}

impl BlockBuilder {
    /// Create an empty draft using default Argon2 parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty draft hashing passwords with `hasher`.
    pub fn with_hasher(hasher: CredentialHasher) -> Self {
        Self {
            hasher,
            ..Self::default()
        }
    }

    pub fn add_gi_tag(&mut self, tag_id: &str, creation_date: &str) -> Result<&mut Self> {
        let tag_id = non_empty("tag id", tag_id)?;
        let creation_date = parse_date("GI creation date", creation_date)?;
        self.gi_tag = Some(GiTag {
            tag_id,
            creation_date,
        });
        Ok(self)
    }

    pub fn add_product(
        &mut self,
        product_id: i64,
        name: &str,
        origin_address: &str,
    ) -> Result<&mut Self> {
        let product_id = u64::try_from(product_id)
            .ok()
            .filter(|id| *id > 0)
            .ok_or(ValidationError::NonPositiveProductId(product_id))?;
        let name = non_empty("product name", name)?;
        self.product = Some(Product {
            product_id,
            name,
            origin_address: origin_address.trim().to_string(),
        });
        Ok(self)
    }

    /// `end_date` of `None` or blank leaves the ownership period open.
    pub fn add_ownership(
        &mut self,
        ownership_id: &str,
        start_date: &str,
        end_date: Option<&str>,
    ) -> Result<&mut Self> {
        let ownership_id = non_empty("ownership id", ownership_id)?;
        let start_date = parse_date("ownership start date", start_date)?;
        let end_date = end_date
            .filter(|s| !s.trim().is_empty())
            .map(|s| parse_date("ownership end date", s))
            .transpose()?;

        if let Some(end) = end_date {
            if end < start_date {
                return Err(ValidationError::EndBeforeStart {
                    start: start_date,
                    end,
                });
            }
        }

        self.ownership = Some(Ownership {
            ownership_id,
            start_date,
            end_date,
        });
        Ok(self)
    }

    pub fn add_transaction(&mut self, transaction_id: &str, date: &str) -> Result<&mut Self> {
        let transaction_id = non_empty("transaction id", transaction_id)?;
        let date = parse_date("transaction date", date)?;
        self.transaction = Some(TransactionDetails {
            transaction_id,
            date,
        });
        Ok(self)
    }

    /// The raw password is hashed here and never stored.
    pub fn add_user(
        &mut self,
        user_id: &str,
        name: &str,
        email: &str,
        raw_password: &str,
        registration_date: &str,
    ) -> Result<&mut Self> {
        let user_id = non_empty("user id", user_id)?;
        let name = non_empty("user name", name)?;
        let email = validate_email(email)?;
        if raw_password.is_empty() {
            return Err(ValidationError::Empty { field: "password" });
        }
        let registration_date = parse_date("registration date", registration_date)?;
        let password_hash = self.hasher.hash(raw_password)?;

        self.user = Some(UserIdentity {
            user_id,
            name,
            email,
            password_hash,
            registration_date,
        });
        Ok(self)
    }

    /// Names of the groups not supplied yet.
    pub fn missing(&self) -> Vec<&'static str> {
        [
            ("giTag", self.gi_tag.is_none()),
            ("product", self.product.is_none()),
            ("ownership", self.ownership.is_none()),
            ("transaction", self.transaction.is_none()),
            ("user", self.user.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }

    /// Freeze the draft into a candidate block.
    ///
    /// The draft is left untouched, so a failed build can be completed and
    /// retried.
    pub fn build(&self) -> std::result::Result<CandidateBlock, IncompleteBlockError> {
        match (
            &self.gi_tag,
            &self.product,
            &self.ownership,
            &self.transaction,
            &self.user,
        ) {
            (Some(gi_tag), Some(product), Some(ownership), Some(transaction), Some(user)) => {
                Ok(CandidateBlock::new(BlockContent {
                    gi_tag: gi_tag.clone(),
                    product: product.clone(),
                    ownership: ownership.clone(),
                    transaction: transaction.clone(),
                    user: user.clone(),
                }))
            }
            _ => Err(IncompleteBlockError {
                missing: self.missing(),
            }),
        }
    }
}
