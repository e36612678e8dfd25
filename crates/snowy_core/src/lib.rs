//! Core of the Snowy content/document store.
//! This crate is the single source of truth for addressing, versioning and
//! query invariants; transports and backends plug in around it.

pub mod address;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod service;

pub use address::{compute as compute_address, ContentAddress};
pub use config::{ConfigError, StoreConfig};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::content::{Content, DEFAULT_CONTENT_TYPE};
pub use model::document::{Document, DocumentDraft, DocumentId, Revision, RevisionLog};
pub use model::query::Query;
pub use model::validation::ValidationError;
pub use repo::content_store::{ContentStore, SqliteContentStore};
pub use repo::document_repo::{DocumentRepository, SqliteDocumentRepository};
pub use repo::error::{ErrorKind, RepoError, RepoResult};
pub use repo::memory::{MemoryContentStore, MemoryDocumentRepository};
pub use service::store_service::StoreService;

/// Store backed by the durable SQLite implementations.
pub type SqliteStore = StoreService<SqliteContentStore, SqliteDocumentRepository>;

/// Store backed by the in-memory implementations.
pub type MemoryStore = StoreService<MemoryContentStore, MemoryDocumentRepository>;

/// Opens (and migrates) the configured SQLite database and wires a store.
pub fn open_sqlite_store(config: &StoreConfig) -> RepoResult<SqliteStore> {
    let conn = db::into_shared(db::open_db_with(&config.db_path, config.busy_timeout)?);
    let contents = SqliteContentStore::try_new(conn.clone())?;
    let documents = SqliteDocumentRepository::try_new(conn)?
        .with_max_append_attempts(config.append_max_attempts);
    Ok(StoreService::new(contents, documents))
}

/// Builds an empty in-memory store.
pub fn memory_store() -> MemoryStore {
    StoreService::new(MemoryContentStore::new(), MemoryDocumentRepository::new())
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
