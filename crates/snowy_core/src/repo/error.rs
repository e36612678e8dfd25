//! Repository error taxonomy.
//!
//! # Invariants
//! - Every failure is a typed value; nothing degrades into a default.
//! - SQLite lock waits that expire surface as `Timeout`, never as a hang.

use crate::address::ContentAddress;
use crate::db::DbError;
use crate::model::document::DocumentId;
use crate::model::validation::ValidationError;
use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for content store and document repository operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    /// Document is unknown, soft-deleted, or filtered out by the query.
    NotFound(DocumentId),
    ContentNotFound(ContentAddress),
    /// Concurrent mutation race still lost after the bounded retries.
    Conflict {
        resource_id: DocumentId,
        attempts: u32,
    },
    /// Backend lock wait expired.
    Timeout(String),
    /// Backend could not be opened or reached.
    Unavailable(String),
    Db(DbError),
    /// Persisted state cannot be converted to a valid model.
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
}

/// Coarse classification for callers mapping errors onto a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Timeout,
    Unavailable,
    Internal,
}

impl RepoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) | Self::ContentNotFound(_) => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Unavailable(_) => ErrorKind::Unavailable,
            Self::Db(_)
            | Self::InvalidData(_)
            | Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_) => ErrorKind::Internal,
        }
    }

    /// Whether a caller may retry the same call with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Conflict | ErrorKind::Timeout | ErrorKind::Unavailable
        )
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "document not found: {id}"),
            Self::ContentNotFound(address) => write!(f, "content not found: {address}"),
            Self::Conflict {
                resource_id,
                attempts,
            } => write!(
                f,
                "concurrent modification of document {resource_id} after {attempts} attempts"
            ),
            Self::Timeout(message) => write!(f, "storage timed out: {message}"),
            Self::Unavailable(message) => write!(f, "storage unavailable: {message}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => Self::from(err),
            other => Self::Db(other),
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        match sqlite_code(&value) {
            Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => {
                Self::Timeout(value.to_string())
            }
            Some(ErrorCode::CannotOpen | ErrorCode::NotADatabase) => {
                Self::Unavailable(value.to_string())
            }
            _ => Self::Db(DbError::Sqlite(value)),
        }
    }
}

/// Extracts the primary SQLite result code, if the error carries one.
pub(crate) fn sqlite_code(err: &rusqlite::Error) -> Option<ErrorCode> {
    match err {
        rusqlite::Error::SqliteFailure(failure, _) => Some(failure.code),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorKind, RepoError};
    use crate::model::validation::ValidationError;
    use rusqlite::ffi;
    use uuid::Uuid;

    fn sqlite_failure(code: i32) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(ffi::Error::new(code), None)
    }

    #[test]
    fn busy_and_locked_map_to_timeout() {
        assert_eq!(
            RepoError::from(sqlite_failure(ffi::SQLITE_BUSY)).kind(),
            ErrorKind::Timeout
        );
        assert_eq!(
            RepoError::from(sqlite_failure(ffi::SQLITE_LOCKED)).kind(),
            ErrorKind::Timeout
        );
    }

    #[test]
    fn cannot_open_maps_to_unavailable() {
        let err = RepoError::from(sqlite_failure(ffi::SQLITE_CANTOPEN));
        assert_eq!(err.kind(), ErrorKind::Unavailable);
        assert!(err.is_retryable());
    }

    #[test]
    fn other_sqlite_errors_stay_internal() {
        let err = RepoError::from(sqlite_failure(ffi::SQLITE_CONSTRAINT));
        assert!(matches!(err, RepoError::Db(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn validation_and_not_found_are_not_retryable() {
        assert!(!RepoError::from(ValidationError::EmptyName).is_retryable());
        assert!(!RepoError::NotFound(Uuid::new_v4()).is_retryable());
        assert!(RepoError::Conflict {
            resource_id: Uuid::new_v4(),
            attempts: 3
        }
        .is_retryable());
    }
}
