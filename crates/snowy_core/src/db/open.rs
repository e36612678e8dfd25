//! Connection bootstrap for the durable backends.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - Returned connections carry a bounded `busy_timeout`; a writer waiting on
//!   another handle's lock gives up with `SQLITE_BUSY` instead of hanging.
//! - Returned connections are migrated to `migrations::latest_version()`.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// Lock wait applied when the caller does not configure one.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

enum Target<'a> {
    File(&'a Path),
    Memory,
}

impl Target<'_> {
    fn mode(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Memory => "memory",
        }
    }

    fn connect(&self) -> rusqlite::Result<Connection> {
        match self {
            Self::File(path) => Connection::open(path),
            Self::Memory => Connection::open_in_memory(),
        }
    }
}

/// Opens (creating if needed) a database file with the default lock wait.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_db_with(path, DEFAULT_BUSY_TIMEOUT)
}

/// Opens a database file; concurrent writers wait up to `busy_timeout`.
///
/// Several handles may open the same file; migration runs under a write
/// lock so only one of them applies pending steps.
pub fn open_db_with(path: impl AsRef<Path>, busy_timeout: Duration) -> DbResult<Connection> {
    open_target(Target::File(path.as_ref()), busy_timeout)
}

/// Opens a private in-memory database. Nothing survives the connection.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_target(Target::Memory, DEFAULT_BUSY_TIMEOUT)
}

fn open_target(target: Target<'_>, busy_timeout: Duration) -> DbResult<Connection> {
    let started_at = Instant::now();
    let mode = target.mode();
    info!("event=db_open module=db status=start mode={mode}");

    let result: DbResult<Connection> = target
        .connect()
        .map_err(DbError::from)
        .and_then(|mut conn| {
            configure(&mut conn, busy_timeout)?;
            Ok(conn)
        });

    match &result {
        Ok(_) => info!(
            "event=db_open module=db status=ok mode={} busy_timeout_ms={} duration_ms={}",
            mode,
            busy_timeout.as_millis(),
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=db_open module=db status=error mode={} duration_ms={} error={}",
            mode,
            started_at.elapsed().as_millis(),
            err
        ),
    }
    result
}

fn configure(conn: &mut Connection, busy_timeout: Duration) -> DbResult<()> {
    // busy_timeout first: the migration transaction may have to wait.
    conn.busy_timeout(busy_timeout)?;
    conn.pragma_update(None, "foreign_keys", true)?;
    apply_migrations(conn)
}
