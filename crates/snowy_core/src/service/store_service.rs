//! Store use-case service.
//!
//! # Responsibility
//! - Compose the content store and document repository behind one API.
//! - Reject revisions that point at content the store does not hold.
//! - Emit one metadata-only log event per call with duration and status.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Service layer remains storage-agnostic.

use crate::address::ContentAddress;
use crate::model::content::Content;
use crate::model::document::{Document, DocumentDraft, DocumentId};
use crate::model::query::Query;
use crate::repo::content_store::ContentStore;
use crate::repo::document_repo::DocumentRepository;
use crate::repo::error::{RepoError, RepoResult};
use log::{info, warn};
use std::time::Instant;

/// Use-case service over a content store and a document repository.
pub struct StoreService<C: ContentStore, R: DocumentRepository> {
    contents: C,
    documents: R,
}

impl<C: ContentStore, R: DocumentRepository> StoreService<C, R> {
    /// Creates a service using the provided backend implementations.
    pub fn new(contents: C, documents: R) -> Self {
        Self {
            contents,
            documents,
        }
    }

    pub fn contents(&self) -> &C {
        &self.contents
    }

    pub fn documents(&self) -> &R {
        &self.documents
    }

    /// Stores a payload; the address is computed server-side.
    pub fn put_content(&self, bytes: Vec<u8>, content_type: &str) -> RepoResult<Content> {
        let started_at = Instant::now();
        observe("content_put", started_at, self.contents.put(bytes, content_type))
    }

    /// Stores a payload only if it hashes to the client-claimed address.
    pub fn put_content_verified(
        &self,
        bytes: Vec<u8>,
        content_type: &str,
        claimed: &ContentAddress,
    ) -> RepoResult<Content> {
        let started_at = Instant::now();
        observe(
            "content_put",
            started_at,
            self.contents.put_verified(bytes, content_type, claimed),
        )
    }

    pub fn get_content(&self, address: &ContentAddress) -> RepoResult<Content> {
        let started_at = Instant::now();
        observe("content_get", started_at, self.contents.get(address))
    }

    /// Inserts a document after checking its content reference, if any.
    pub fn insert_document(&self, draft: DocumentDraft) -> RepoResult<Document> {
        let started_at = Instant::now();
        let result = self
            .ensure_content_exists(&draft)
            .and_then(|()| self.documents.insert(draft));
        observe("document_insert", started_at, result)
    }

    /// Stores content, then inserts a document whose revision 0 points at it.
    pub fn insert_document_with_content(
        &self,
        bytes: Vec<u8>,
        content_type: &str,
        draft: DocumentDraft,
    ) -> RepoResult<Document> {
        let started_at = Instant::now();
        let result = draft
            .validate()
            .map_err(RepoError::from)
            .and_then(|()| self.contents.put(bytes, content_type))
            .and_then(|content| self.documents.insert(draft.with_content(content.address)));
        observe("document_insert", started_at, result)
    }

    /// Appends a revision after checking its content reference, if any.
    pub fn append_document(
        &self,
        resource_id: DocumentId,
        draft: DocumentDraft,
    ) -> RepoResult<Document> {
        let started_at = Instant::now();
        let result = self
            .ensure_content_exists(&draft)
            .and_then(|()| self.documents.append(resource_id, draft));
        observe("document_append", started_at, result)
    }

    pub fn get_document(&self, resource_id: DocumentId, query: &Query) -> RepoResult<Document> {
        let started_at = Instant::now();
        observe("document_get", started_at, self.documents.get(resource_id, query))
    }

    /// Lists live documents of one author that match `query`.
    pub fn get_documents(&self, author_id: &str, query: &Query) -> RepoResult<Vec<Document>> {
        let started_at = Instant::now();
        observe(
            "document_list",
            started_at,
            self.documents.get_multiple(author_id, query),
        )
    }

    pub fn delete_document(&self, resource_id: DocumentId) -> RepoResult<()> {
        let started_at = Instant::now();
        observe("document_delete", started_at, self.documents.delete(resource_id))
    }

    pub fn document_history(&self, resource_id: DocumentId) -> RepoResult<Document> {
        let started_at = Instant::now();
        observe("document_history", started_at, self.documents.history(resource_id))
    }

    fn ensure_content_exists(&self, draft: &DocumentDraft) -> RepoResult<()> {
        let Some(address) = draft.content_address.as_ref() else {
            return Ok(());
        };
        if !self.contents.contains(address)? {
            return Err(RepoError::ContentNotFound(address.clone()));
        }
        Ok(())
    }
}

fn observe<T>(event: &str, started_at: Instant, result: RepoResult<T>) -> RepoResult<T> {
    match &result {
        Ok(_) => info!(
            "event={} module=service status=ok duration_ms={}",
            event,
            started_at.elapsed().as_millis()
        ),
        Err(err) => warn!(
            "event={} module=service status=error duration_ms={} error_kind={:?} error={}",
            event,
            started_at.elapsed().as_millis(),
            err.kind(),
            err
        ),
    }
    result
}
