//! Content store contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist immutable blobs keyed by their content address.
//! - Deduplicate identical submissions.
//!
//! # Invariants
//! - Stored addresses are always computed server-side from the bytes.
//! - `put` is an idempotent upsert: the first stored record for an address
//!   wins, including its content type.
//! - Read paths reject rows whose bytes no longer hash to their address.

use crate::address::{self, ContentAddress};
use crate::db::SharedConnection;
use crate::model::content::Content;
use crate::model::now_epoch_ms;
use crate::model::validation::ValidationError;
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::{ensure_connection_ready, lock_connection};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};

/// Repository interface for content blobs.
pub trait ContentStore: Send + Sync {
    /// Stores `bytes` under their computed address and returns the record.
    fn put(&self, bytes: Vec<u8>, content_type: &str) -> RepoResult<Content>;

    /// Gets one blob by address.
    fn get(&self, address: &ContentAddress) -> RepoResult<Content>;

    /// Returns whether a blob exists at `address`.
    fn contains(&self, address: &ContentAddress) -> RepoResult<bool>;

    /// Stores `bytes` only if they hash to the client-claimed address.
    fn put_verified(
        &self,
        bytes: Vec<u8>,
        content_type: &str,
        claimed: &ContentAddress,
    ) -> RepoResult<Content> {
        if bytes.is_empty() {
            return Err(ValidationError::EmptyContent.into());
        }
        address::verify(&bytes, claimed)?;
        self.put(bytes, content_type)
    }
}

/// SQLite-backed content store.
pub struct SqliteContentStore {
    conn: SharedConnection,
}

impl SqliteContentStore {
    /// Constructs a store from a migrated/ready connection.
    pub fn try_new(conn: SharedConnection) -> RepoResult<Self> {
        ensure_connection_ready(&lock_connection(&conn), &["contents"])?;
        Ok(Self { conn })
    }
}

impl ContentStore for SqliteContentStore {
    fn put(&self, bytes: Vec<u8>, content_type: &str) -> RepoResult<Content> {
        let content = Content::from_bytes(bytes, content_type)?;
        let conn = lock_connection(&self.conn);

        let inserted = conn.execute(
            "INSERT OR IGNORE INTO contents (
                address,
                content_type,
                size,
                bytes,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                content.address.as_str(),
                content.content_type.as_str(),
                content.size,
                content.bytes.as_slice(),
                now_epoch_ms(),
            ],
        )?;

        debug!(
            "event=content_put module=repo status=ok address={} size={} deduplicated={}",
            content.address,
            content.size,
            inserted == 0
        );

        if inserted == 1 {
            return Ok(content);
        }
        load_content(&conn, &content.address)?.ok_or(RepoError::ContentNotFound(content.address))
    }

    fn get(&self, address: &ContentAddress) -> RepoResult<Content> {
        let conn = lock_connection(&self.conn);
        load_content(&conn, address)?.ok_or_else(|| RepoError::ContentNotFound(address.clone()))
    }

    fn contains(&self, address: &ContentAddress) -> RepoResult<bool> {
        let conn = lock_connection(&self.conn);
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM contents WHERE address = ?1);",
            [address.as_str()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}

fn load_content(conn: &Connection, address: &ContentAddress) -> RepoResult<Option<Content>> {
    let row = conn
        .query_row(
            "SELECT content_type, size, bytes
             FROM contents
             WHERE address = ?1;",
            [address.as_str()],
            |row| {
                Ok((
                    row.get::<_, String>("content_type")?,
                    row.get::<_, i64>("size")?,
                    row.get::<_, Vec<u8>>("bytes")?,
                ))
            },
        )
        .optional()?;

    let Some((content_type, size, bytes)) = row else {
        return Ok(None);
    };

    if &address::compute(&bytes) != address {
        return Err(RepoError::InvalidData(format!(
            "bytes stored under `{address}` no longer match their address"
        )));
    }
    if usize::try_from(size).ok() != Some(bytes.len()) {
        return Err(RepoError::InvalidData(format!(
            "size {size} recorded for `{address}` but {} bytes stored",
            bytes.len()
        )));
    }

    Ok(Some(Content {
        address: address.clone(),
        bytes,
        content_type,
        size,
    }))
}
