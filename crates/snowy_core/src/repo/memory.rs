//! In-memory content store and document repository.
//!
//! # Responsibility
//! - Provide backend-free implementations for tests and embedding.
//! - Match the observable behavior of the SQLite implementations.
//!
//! # Invariants
//! - Each document sits behind its own mutex; mutations of one resource are
//!   serialized without blocking other resources.
//! - Readers clone a full `Document` under its lock, never a partial one.
//! - Lock order is always map, then document, and the map lock is released
//!   before a document lock is taken.

use crate::address::ContentAddress;
use crate::model::content::Content;
use crate::model::document::{Document, DocumentDraft, DocumentId};
use crate::model::now_epoch_ms;
use crate::model::query::Query;
use crate::query as query_engine;
use crate::repo::content_store::ContentStore;
use crate::repo::document_repo::DocumentRepository;
use crate::repo::error::{RepoError, RepoResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

/// Content store backed by a process-local map.
#[derive(Debug, Default)]
pub struct MemoryContentStore {
    blobs: RwLock<HashMap<ContentAddress, Content>>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct blobs held.
    pub fn len(&self) -> usize {
        self.blobs.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ContentStore for MemoryContentStore {
    fn put(&self, bytes: Vec<u8>, content_type: &str) -> RepoResult<Content> {
        let content = Content::from_bytes(bytes, content_type)?;
        let mut blobs = self.blobs.write().unwrap_or_else(PoisonError::into_inner);
        let stored = blobs.entry(content.address.clone()).or_insert(content);
        Ok(stored.clone())
    }

    fn get(&self, address: &ContentAddress) -> RepoResult<Content> {
        self.blobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(address)
            .cloned()
            .ok_or_else(|| RepoError::ContentNotFound(address.clone()))
    }

    fn contains(&self, address: &ContentAddress) -> RepoResult<bool> {
        Ok(self
            .blobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(address))
    }
}

type DocumentSlot = Arc<Mutex<Document>>;

/// Document repository backed by a process-local map.
#[derive(Debug, Default)]
pub struct MemoryDocumentRepository {
    documents: RwLock<HashMap<DocumentId, DocumentSlot>>,
}

impl MemoryDocumentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, resource_id: DocumentId) -> RepoResult<DocumentSlot> {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&resource_id)
            .cloned()
            .ok_or(RepoError::NotFound(resource_id))
    }

    fn slots(&self) -> Vec<DocumentSlot> {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }
}

fn lock_document(slot: &DocumentSlot) -> MutexGuard<'_, Document> {
    // Mutations validate before touching the document, so a poisoned guard
    // still holds a consistent value.
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

impl DocumentRepository for MemoryDocumentRepository {
    fn insert(&self, draft: DocumentDraft) -> RepoResult<Document> {
        let document = Document::create(draft, now_epoch_ms())?;
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(document.resource_id, Arc::new(Mutex::new(document.clone())));
        Ok(document)
    }

    fn append(&self, resource_id: DocumentId, draft: DocumentDraft) -> RepoResult<Document> {
        draft.validate()?;
        let slot = self.slot(resource_id)?;
        let mut document = lock_document(&slot);
        if !document.is_live() {
            return Err(RepoError::NotFound(resource_id));
        }
        document.apply_append(draft, now_epoch_ms())?;
        Ok(document.clone())
    }

    fn get(&self, resource_id: DocumentId, query: &Query) -> RepoResult<Document> {
        let slot = self.slot(resource_id)?;
        let document = lock_document(&slot);
        if !document.is_live() || !query_engine::matches(&document, query) {
            return Err(RepoError::NotFound(resource_id));
        }
        Ok(document.clone())
    }

    fn get_multiple(&self, author_id: &str, query: &Query) -> RepoResult<Vec<Document>> {
        let candidates = self.slots().into_iter().filter_map(|slot| {
            let document = lock_document(&slot);
            if document.author_id == author_id {
                Some(document.clone())
            } else {
                None
            }
        });
        Ok(query_engine::filter_live(candidates, query))
    }

    fn delete(&self, resource_id: DocumentId) -> RepoResult<()> {
        let slot = self.slot(resource_id)?;
        lock_document(&slot).soft_delete(now_epoch_ms());
        Ok(())
    }

    fn history(&self, resource_id: DocumentId) -> RepoResult<Document> {
        let slot = self.slot(resource_id)?;
        let document = lock_document(&slot).clone();
        Ok(document)
    }
}
