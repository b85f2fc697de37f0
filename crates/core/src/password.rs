//! Salted Argon2id password hashing for user identities.
//!
//! This is deliberately separate from the block digest: block hashing is
//! fast and unsalted, password hashing is slow, salted and one-way.

use argon2::password_hash::{
    PasswordHash as PhcString, PasswordHasher as _, PasswordVerifier as _, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors from password hashing and verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordError {
    #[error("invalid argon2 parameters: {0}")]
    InvalidParams(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("malformed password hash: {0}")]
    Malformed(String),
}

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argon2Config {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Argon2Config {
    /// Lowest cost argon2 accepts. Only suitable for tests and scratch ledgers.
    pub fn minimal() -> Self {
        Self {
            memory_kib: Params::MIN_M_COST,
            iterations: Params::MIN_T_COST,
            parallelism: Params::MIN_P_COST,
        }
    }
}

impl Default for Argon2Config {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

/// Hashes raw passwords into PHC strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct CredentialHasher {
    config: Argon2Config,
}

impl CredentialHasher {
    /// Create a hasher, rejecting parameters argon2 would refuse.
    pub fn new(config: Argon2Config) -> Result<Self, PasswordError> {
        Self::params(&config)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> Argon2Config {
        self.config
    }

    fn params(config: &Argon2Config) -> Result<Params, PasswordError> {
        Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))
    }

    /// Hash `raw` with a fresh random salt.
    pub fn hash(&self, raw: &str) -> Result<PasswordHash, PasswordError> {
        let params = Self::params(&self.config)?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let salt = SaltString::generate(&mut OsRng);
        let phc = argon2
            .hash_password(raw.as_bytes(), &salt)
            .map_err(|e| PasswordError::Hashing(e.to_string()))?;
        Ok(PasswordHash(phc.to_string()))
    }
}

/// A stored password hash in PHC string format (`$argon2id$v=19$...`).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordHash(String);

impl PasswordHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[cfg(test)]
    pub(crate) fn from_phc(phc: &str) -> Self {
        Self(phc.to_string())
    }

    /// Check a candidate password. Cost parameters and salt come from the
    /// stored string itself.
    pub fn verify(&self, candidate: &str) -> Result<bool, PasswordError> {
        let parsed = PhcString::new(&self.0).map_err(|e| PasswordError::Malformed(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok())
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let algorithm = self.0.split('$').nth(1).unwrap_or("?");
        write!(f, "PasswordHash({algorithm})")
    }
}
