//! Input validation errors shared by the model and repositories.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Malformed caller input. Never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyName,
    EmptyAuthorId,
    EmptyTag,
    EmptyContent,
    InvalidContentAddress(String),
    /// Client-supplied address does not hash-match the submitted bytes.
    AddressMismatch {
        supplied: String,
        computed: String,
    },
    /// Append attempted with a different author than the stored document.
    AuthorMismatch {
        expected: String,
        supplied: String,
    },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "document name must not be empty"),
            Self::EmptyAuthorId => write!(f, "author id must not be empty"),
            Self::EmptyTag => write!(f, "tags must not be empty strings"),
            Self::EmptyContent => write!(f, "content payload must not be empty"),
            Self::InvalidContentAddress(value) => {
                write!(f, "invalid content address `{value}`")
            }
            Self::AddressMismatch { supplied, computed } => write!(
                f,
                "content address mismatch: supplied `{supplied}`, computed `{computed}`"
            ),
            Self::AuthorMismatch { expected, supplied } => write!(
                f,
                "author mismatch: document belongs to `{expected}`, got `{supplied}`"
            ),
        }
    }
}

impl Error for ValidationError {}
