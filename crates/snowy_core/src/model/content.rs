//! Content blob record.
//!
//! # Invariants
//! - `address == address::compute(&bytes)` for every constructed value.
//! - `size == bytes.len()`.

use crate::address::{self, ContentAddress};
use crate::model::validation::ValidationError;
use serde::{Deserialize, Serialize};

/// Content type used when the caller does not supply one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Immutable byte payload keyed by its content address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    pub address: ContentAddress,
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub size: i64,
}

impl Content {
    /// Builds a content record, computing address and size from `bytes`.
    ///
    /// # Errors
    /// - `ValidationError::EmptyContent` for an empty payload.
    pub fn from_bytes(bytes: Vec<u8>, content_type: &str) -> Result<Self, ValidationError> {
        if bytes.is_empty() {
            return Err(ValidationError::EmptyContent);
        }

        Ok(Self {
            address: address::compute(&bytes),
            size: i64::try_from(bytes.len()).unwrap_or(i64::MAX),
            content_type: normalize_content_type(content_type),
            bytes,
        })
    }

    /// Same as [`Content::from_bytes`], but also checks a claimed address.
    pub fn from_bytes_verified(
        bytes: Vec<u8>,
        content_type: &str,
        claimed: &ContentAddress,
    ) -> Result<Self, ValidationError> {
        if bytes.is_empty() {
            return Err(ValidationError::EmptyContent);
        }
        address::verify(&bytes, claimed)?;
        Self::from_bytes(bytes, content_type)
    }
}

/// Blank content types fall back to [`DEFAULT_CONTENT_TYPE`].
pub fn normalize_content_type(content_type: &str) -> String {
    let trimmed = content_type.trim();
    if trimmed.is_empty() {
        DEFAULT_CONTENT_TYPE.to_string()
    } else {
        trimmed.to_string()
    }
}
