//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the content store and document repository contracts.
//! - Isolate SQLite query details from service orchestration.
//! - Provide in-memory implementations with the same observable behavior.
//!
//! # Invariants
//! - Write paths validate input before any mutation.
//! - Repository APIs return semantic errors (`NotFound`, `Conflict`) in
//!   addition to backend transport errors.

pub mod content_store;
pub mod document_repo;
pub mod error;
pub mod memory;

use crate::db::migrations::{latest_version, read_version};
use crate::db::SharedConnection;
use error::{RepoError, RepoResult};
use rusqlite::Connection;
use std::sync::{MutexGuard, PoisonError};

/// Locks the shared connection.
///
/// A panic while holding the guard cannot leave a half-applied write
/// behind: every mutation runs in a transaction that rolls back on drop.
pub(crate) fn lock_connection(conn: &SharedConnection) -> MutexGuard<'_, Connection> {
    conn.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Rejects connections that are not migrated or lack required tables.
pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    tables: &[&'static str],
) -> RepoResult<()> {
    let actual_version = read_version(conn)?;
    let expected_version = latest_version();
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for &table in tables {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
