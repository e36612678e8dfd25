//! Content addressing.
//!
//! # Responsibility
//! - Map byte payloads to deterministic, collision-resistant addresses.
//! - Validate addresses supplied from outside the core.
//!
//! # Invariants
//! - An address is the lowercase hex SHA-256 digest of the payload (64 chars).
//! - `compute` is total: empty payloads still hash. Rejecting empty content is
//!   the content store's policy, not this module's.

use crate::model::validation::ValidationError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::{Display, Formatter};

const ADDRESS_HEX_LEN: usize = 64;

/// Hash-derived identifier of an immutable byte payload.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentAddress(String);

impl ContentAddress {
    /// Parses an externally supplied address.
    ///
    /// # Errors
    /// - `ValidationError::InvalidContentAddress` unless the value is exactly
    ///   64 lowercase hex characters.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let well_formed = value.len() == ADDRESS_HEX_LEN
            && value
                .bytes()
                .all(|byte| byte.is_ascii_digit() || (b'a'..=b'f').contains(&byte));
        if !well_formed {
            return Err(ValidationError::InvalidContentAddress(value.to_string()));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for ContentAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ContentAddress {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ContentAddress> for String {
    fn from(value: ContentAddress) -> Self {
        value.0
    }
}

/// Computes the content address of `bytes`.
pub fn compute(bytes: &[u8]) -> ContentAddress {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    ContentAddress(format!("{:x}", hasher.finalize()))
}

/// Checks a client-claimed address against the recomputed one.
///
/// Returns the computed address on success.
pub fn verify(bytes: &[u8], claimed: &ContentAddress) -> Result<ContentAddress, ValidationError> {
    let computed = compute(bytes);
    if &computed != claimed {
        return Err(ValidationError::AddressMismatch {
            supplied: claimed.to_string(),
            computed: computed.to_string(),
        });
    }
    Ok(computed)
}
