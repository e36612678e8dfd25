//! Document repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Own document identity, revision chains and soft-delete lifecycle.
//! - Answer tag-filtered reads by resource id and author-scoped lists.
//!
//! # Invariants
//! - Revision ordinals per document are `0..revision_count` with no gaps.
//! - Appends are linearizable per resource: an immediate transaction plus a
//!   compare-and-increment on `revision_count`, with `(resource_id, ordinal)`
//!   as primary key. A lost race is retried a bounded number of times.
//! - Reads assemble a document inside one transaction, so a partially
//!   applied revision is never observed.
//! - `get_multiple` is scoped by author; `get` is scoped by resource id.

use crate::address::ContentAddress;
use crate::db::SharedConnection;
use crate::model::document::{Document, DocumentDraft, DocumentId, Revision, RevisionLog};
use crate::model::now_epoch_ms;
use crate::model::query::Query;
use crate::model::validation::ValidationError;
use crate::query as query_engine;
use crate::repo::error::{sqlite_code, RepoError, RepoResult};
use crate::repo::{ensure_connection_ready, lock_connection};
use log::{info, warn};
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, ErrorCode, OptionalExtension, Transaction,
    TransactionBehavior,
};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Attempts made by `append` before a lost race surfaces as `Conflict`.
pub const DEFAULT_APPEND_MAX_ATTEMPTS: u32 = 3;

const DOCUMENT_SELECT_SQL: &str = "SELECT
    resource_id,
    author_id,
    name,
    created_on,
    deleted_on,
    revision_count
FROM documents";

/// Repository interface for versioned documents.
pub trait DocumentRepository: Send + Sync {
    /// Creates a document with a fresh resource id and revision 0.
    fn insert(&self, draft: DocumentDraft) -> RepoResult<Document>;
    /// Appends one revision to a live document and replaces name/tags.
    ///
    /// # Errors
    /// - `Validation(AuthorMismatch)` when `draft.author_id` differs from the
    ///   author fixed at insert. No revision is added.
    /// - `NotFound` for an unknown or soft-deleted document.
    /// - `Conflict` once the backend's attempt bound is spent.
    fn append(&self, resource_id: DocumentId, draft: DocumentDraft) -> RepoResult<Document>;
    /// Gets one live document that satisfies `query`.
    fn get(&self, resource_id: DocumentId, query: &Query) -> RepoResult<Document>;
    /// Lists live documents of `author_id` that satisfy `query`.
    fn get_multiple(&self, author_id: &str, query: &Query) -> RepoResult<Vec<Document>>;
    /// Soft-deletes a document. Deleting twice is not an error.
    fn delete(&self, resource_id: DocumentId) -> RepoResult<()>;
    /// Gets a document regardless of tombstone state, with full history.
    fn history(&self, resource_id: DocumentId) -> RepoResult<Document>;
}

/// SQLite-backed document repository.
pub struct SqliteDocumentRepository {
    conn: SharedConnection,
    max_append_attempts: u32,
}

impl SqliteDocumentRepository {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: SharedConnection) -> RepoResult<Self> {
        ensure_connection_ready(
            &lock_connection(&conn),
            &["documents", "revisions", "document_tags"],
        )?;
        Ok(Self {
            conn,
            max_append_attempts: DEFAULT_APPEND_MAX_ATTEMPTS,
        })
    }

    /// Overrides the append retry bound. Values below 1 are raised to 1.
    pub fn with_max_append_attempts(mut self, attempts: u32) -> Self {
        self.max_append_attempts = attempts.max(1);
        self
    }

    fn try_append(&self, resource_id: DocumentId, draft: &DocumentDraft) -> RepoResult<Document> {
        let id_text = resource_id.to_string();
        let mut conn = lock_connection(&self.conn);
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current = tx
            .query_row(
                "SELECT author_id, revision_count, deleted_on
                 FROM documents
                 WHERE resource_id = ?1;",
                [id_text.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, Option<i64>>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some((author_id, revision_count, deleted_on)) = current else {
            return Err(RepoError::NotFound(resource_id));
        };
        if deleted_on.is_some() {
            return Err(RepoError::NotFound(resource_id));
        }
        if author_id != draft.author_id {
            return Err(ValidationError::AuthorMismatch {
                expected: author_id,
                supplied: draft.author_id.clone(),
            }
            .into());
        }

        let changed = tx.execute(
            "UPDATE documents
             SET
                name = ?2,
                revision_count = revision_count + 1
             WHERE resource_id = ?1
               AND revision_count = ?3
               AND deleted_on IS NULL;",
            params![id_text.as_str(), draft.name.as_str(), revision_count],
        )?;
        if changed == 0 {
            return Err(conflict(resource_id));
        }

        let revision = Revision {
            ordinal: ordinal_from_db(revision_count)?,
            content_address: draft.content_address.clone(),
            created_on: now_epoch_ms(),
        };
        if let Err(err) = insert_revision(&tx, &id_text, &revision) {
            // Under the immediate lock a key collision can only come from a
            // stray row at this ordinal. It is still reported as `Conflict`
            // and retried, so the caller sees one failure kind for "the next
            // ordinal is taken"; the rolled-back attempt leaves no trace.
            if sqlite_code(&err) == Some(ErrorCode::ConstraintViolation) {
                return Err(conflict(resource_id));
            }
            return Err(err.into());
        }
        replace_tags(&tx, &id_text, &draft.tags)?;

        let document =
            load_document(&tx, resource_id)?.ok_or(RepoError::NotFound(resource_id))?;
        tx.commit()?;
        Ok(document)
    }
}

impl DocumentRepository for SqliteDocumentRepository {
    fn insert(&self, draft: DocumentDraft) -> RepoResult<Document> {
        let document = Document::create(draft, now_epoch_ms())?;
        let id_text = document.resource_id.to_string();

        let mut conn = lock_connection(&self.conn);
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO documents (
                resource_id,
                author_id,
                name,
                created_on,
                deleted_on,
                revision_count
            ) VALUES (?1, ?2, ?3, ?4, NULL, ?5);",
            params![
                id_text.as_str(),
                document.author_id.as_str(),
                document.name.as_str(),
                document.created_on,
                document.revisions.len() as i64,
            ],
        )?;
        for revision in document.revisions.iter() {
            insert_revision(&tx, &id_text, revision)?;
        }
        replace_tags(&tx, &id_text, &document.tags)?;
        tx.commit()?;

        info!(
            "event=document_insert module=repo status=ok resource_id={} tag_count={}",
            document.resource_id,
            document.tags.len()
        );
        Ok(document)
    }

    fn append(&self, resource_id: DocumentId, draft: DocumentDraft) -> RepoResult<Document> {
        draft.validate()?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_append(resource_id, &draft) {
                Ok(document) => {
                    info!(
                        "event=document_append module=repo status=ok resource_id={} ordinal={} attempt={}",
                        resource_id,
                        document.revisions.next_ordinal() - 1,
                        attempt
                    );
                    return Ok(document);
                }
                Err(RepoError::Conflict { .. }) if attempt < self.max_append_attempts => {
                    warn!(
                        "event=document_append module=repo status=retry resource_id={} attempt={}",
                        resource_id, attempt
                    );
                }
                Err(RepoError::Conflict { .. }) => {
                    return Err(RepoError::Conflict {
                        resource_id,
                        attempts: attempt,
                    });
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn get(&self, resource_id: DocumentId, query: &Query) -> RepoResult<Document> {
        let mut conn = lock_connection(&self.conn);
        let tx = conn.transaction()?;
        let document = load_document(&tx, resource_id)?
            .filter(|document| document.is_live() && query_engine::matches(document, query))
            .ok_or(RepoError::NotFound(resource_id))?;
        tx.finish()?;
        Ok(document)
    }

    fn get_multiple(&self, author_id: &str, query: &Query) -> RepoResult<Vec<Document>> {
        let mut sql = String::from(
            "SELECT d.resource_id
             FROM documents d
             WHERE d.author_id = ?
               AND d.deleted_on IS NULL",
        );
        let mut bind_values: Vec<Value> = vec![Value::Text(author_id.to_string())];

        if !query.is_empty() {
            let placeholders = vec!["?"; query.tags.len()].join(", ");
            sql.push_str(&format!(
                " AND (
                    SELECT COUNT(DISTINCT t.tag)
                    FROM document_tags t
                    WHERE t.resource_id = d.resource_id
                      AND t.tag IN ({placeholders})
                ) = ?"
            ));
            bind_values.extend(query.tags.iter().cloned().map(Value::Text));
            bind_values.push(Value::Integer(query.tags.len() as i64));
        }
        sql.push_str(" ORDER BY d.created_on ASC, d.resource_id ASC;");

        let mut conn = lock_connection(&self.conn);
        let tx = conn.transaction()?;
        let ids = {
            let mut stmt = tx.prepare(&sql)?;
            let mut rows = stmt.query(params_from_iter(bind_values))?;
            let mut ids = Vec::new();
            while let Some(row) = rows.next()? {
                let text: String = row.get(0)?;
                ids.push(parse_resource_id(&text)?);
            }
            ids
        };

        let mut documents = Vec::with_capacity(ids.len());
        for id in ids {
            let document = load_document(&tx, id)?.ok_or_else(|| {
                RepoError::InvalidData(format!("document {id} vanished during listing"))
            })?;
            documents.push(document);
        }
        tx.finish()?;
        Ok(documents)
    }

    fn delete(&self, resource_id: DocumentId) -> RepoResult<()> {
        let id_text = resource_id.to_string();
        let conn = lock_connection(&self.conn);
        let changed = conn.execute(
            "UPDATE documents
             SET deleted_on = ?2
             WHERE resource_id = ?1
               AND deleted_on IS NULL;",
            params![id_text.as_str(), now_epoch_ms()],
        )?;

        if changed == 0 && !document_exists(&conn, &id_text)? {
            return Err(RepoError::NotFound(resource_id));
        }

        info!(
            "event=document_delete module=repo status=ok resource_id={} already_deleted={}",
            resource_id,
            changed == 0
        );
        Ok(())
    }

    fn history(&self, resource_id: DocumentId) -> RepoResult<Document> {
        let mut conn = lock_connection(&self.conn);
        let tx = conn.transaction()?;
        let document = load_document(&tx, resource_id)?.ok_or(RepoError::NotFound(resource_id))?;
        tx.finish()?;
        Ok(document)
    }
}

fn conflict(resource_id: DocumentId) -> RepoError {
    RepoError::Conflict {
        resource_id,
        attempts: 0,
    }
}

fn insert_revision(
    tx: &Transaction<'_>,
    id_text: &str,
    revision: &Revision,
) -> rusqlite::Result<()> {
    tx.execute(
        "INSERT INTO revisions (
            resource_id,
            ordinal,
            content_address,
            created_on
        ) VALUES (?1, ?2, ?3, ?4);",
        params![
            id_text,
            i64::from(revision.ordinal),
            revision.content_address.as_ref().map(ContentAddress::as_str),
            revision.created_on,
        ],
    )?;
    Ok(())
}

fn replace_tags(tx: &Transaction<'_>, id_text: &str, tags: &BTreeSet<String>) -> RepoResult<()> {
    tx.execute("DELETE FROM document_tags WHERE resource_id = ?1;", [id_text])?;
    for tag in tags {
        tx.execute(
            "INSERT INTO document_tags (resource_id, tag) VALUES (?1, ?2);",
            params![id_text, tag.as_str()],
        )?;
    }
    Ok(())
}

fn document_exists(conn: &Connection, id_text: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM documents WHERE resource_id = ?1);",
        [id_text],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn load_document(conn: &Connection, resource_id: DocumentId) -> RepoResult<Option<Document>> {
    let id_text = resource_id.to_string();
    let row = conn
        .query_row(
            &format!("{DOCUMENT_SELECT_SQL} WHERE resource_id = ?1;"),
            [id_text.as_str()],
            |row| {
                Ok((
                    row.get::<_, String>("author_id")?,
                    row.get::<_, String>("name")?,
                    row.get::<_, i64>("created_on")?,
                    row.get::<_, Option<i64>>("deleted_on")?,
                    row.get::<_, i64>("revision_count")?,
                ))
            },
        )
        .optional()?;

    let Some((author_id, name, created_on, deleted_on, revision_count)) = row else {
        return Ok(None);
    };

    let revisions = load_revisions(conn, &id_text)?;
    if revisions.len() as i64 != revision_count {
        return Err(RepoError::InvalidData(format!(
            "document {resource_id} records {revision_count} revisions but {} are stored",
            revisions.len()
        )));
    }

    Ok(Some(Document {
        resource_id,
        author_id,
        name,
        tags: load_tags(conn, &id_text)?,
        created_on,
        deleted_on,
        revisions,
    }))
}

fn load_revisions(conn: &Connection, id_text: &str) -> RepoResult<RevisionLog> {
    let mut stmt = conn.prepare(
        "SELECT ordinal, content_address, created_on
         FROM revisions
         WHERE resource_id = ?1
         ORDER BY ordinal ASC;",
    )?;
    let mut rows = stmt.query([id_text])?;
    let mut entries = Vec::new();
    while let Some(row) = rows.next()? {
        let content_address = match row.get::<_, Option<String>>("content_address")? {
            Some(value) => Some(ContentAddress::parse(&value).map_err(|_| {
                RepoError::InvalidData(format!(
                    "invalid content address `{value}` in revisions.content_address"
                ))
            })?),
            None => None,
        };
        entries.push(Revision {
            ordinal: ordinal_from_db(row.get("ordinal")?)?,
            content_address,
            created_on: row.get("created_on")?,
        });
    }

    RevisionLog::from_entries(entries)
        .map_err(|message| RepoError::InvalidData(format!("document {id_text}: {message}")))
}

fn load_tags(conn: &Connection, id_text: &str) -> RepoResult<BTreeSet<String>> {
    let mut stmt = conn.prepare("SELECT tag FROM document_tags WHERE resource_id = ?1;")?;
    let mut rows = stmt.query([id_text])?;
    let mut tags = BTreeSet::new();
    while let Some(row) = rows.next()? {
        tags.insert(row.get::<_, String>(0)?);
    }
    Ok(tags)
}

fn ordinal_from_db(value: i64) -> RepoResult<u32> {
    u32::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("revision ordinal {value} out of range")))
}

fn parse_resource_id(value: &str) -> RepoResult<DocumentId> {
    Uuid::parse_str(value).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{value}` in documents.resource_id"))
    })
}
