//! Document domain model.
//!
//! # Responsibility
//! - Define documents as append-only revision chains under a stable id.
//! - Provide lifecycle helpers for insert/append/soft-delete semantics.
//!
//! # Invariants
//! - `resource_id` is stable and never reused for another document.
//! - `revisions` is gap-free: entry `i` carries ordinal `i`.
//! - `author_id` never changes after creation.
//! - `deleted_on` is the source of truth for tombstone state; once set it is
//!   never cleared or moved.

use crate::address::ContentAddress;
use crate::model::validation::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Stable identifier for a document across all its revisions.
pub type DocumentId = Uuid;

/// Caller input for insert and append.
///
/// Arrives already deserialized; the core validates but never parses it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentDraft {
    pub author_id: String,
    pub name: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub content_address: Option<ContentAddress>,
}

impl DocumentDraft {
    pub fn new(author_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            author_id: author_id.into(),
            name: name.into(),
            tags: BTreeSet::new(),
            content_address: None,
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_content(mut self, address: ContentAddress) -> Self {
        self.content_address = Some(address);
        self
    }

    /// Checks draft fields before any persistence happens.
    ///
    /// # Errors
    /// - `EmptyAuthorId` / `EmptyName` for blank values.
    /// - `EmptyTag` when any tag is the empty string.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.author_id.trim().is_empty() {
            return Err(ValidationError::EmptyAuthorId);
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.tags.iter().any(|tag| tag.is_empty()) {
            return Err(ValidationError::EmptyTag);
        }
        Ok(())
    }
}

/// One immutable version of a document's content pointer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    pub ordinal: u32,
    pub content_address: Option<ContentAddress>,
    /// Unix epoch milliseconds.
    pub created_on: i64,
}

/// Ordered, append-only sequence of revisions owned by one document.
///
/// The entry count doubles as the monotonic counter for the next ordinal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Revision>", into = "Vec<Revision>")]
pub struct RevisionLog {
    entries: Vec<Revision>,
}

impl RevisionLog {
    /// Rebuilds a log from persisted entries, rejecting gapped ordinals.
    pub fn from_entries(entries: Vec<Revision>) -> Result<Self, String> {
        for (index, revision) in entries.iter().enumerate() {
            if revision.ordinal as usize != index {
                return Err(format!(
                    "revision ordinal {} found at position {index}",
                    revision.ordinal
                ));
            }
        }
        Ok(Self { entries })
    }

    pub fn next_ordinal(&self) -> u32 {
        self.entries.len() as u32
    }

    pub fn push(&mut self, content_address: Option<ContentAddress>, created_on: i64) -> &Revision {
        let ordinal = self.next_ordinal();
        self.entries.push(Revision {
            ordinal,
            content_address,
            created_on,
        });
        &self.entries[self.entries.len() - 1]
    }

    /// Latest revision, if any.
    pub fn head(&self) -> Option<&Revision> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn as_slice(&self) -> &[Revision] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &Revision> {
        self.entries.iter()
    }
}

impl TryFrom<Vec<Revision>> for RevisionLog {
    type Error = String;

    fn try_from(value: Vec<Revision>) -> Result<Self, Self::Error> {
        Self::from_entries(value)
    }
}

impl From<RevisionLog> for Vec<Revision> {
    fn from(value: RevisionLog) -> Self {
        value.entries
    }
}

/// Metadata record addressed by a stable resource id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub resource_id: DocumentId,
    pub author_id: String,
    pub name: String,
    pub tags: BTreeSet<String>,
    /// Unix epoch milliseconds.
    pub created_on: i64,
    /// Soft delete tombstone. `None` means live.
    pub deleted_on: Option<i64>,
    pub revisions: RevisionLog,
}

impl Document {
    /// Creates a live document with a fresh id and revision 0.
    pub fn create(draft: DocumentDraft, created_on: i64) -> Result<Self, ValidationError> {
        Self::with_id(Uuid::new_v4(), draft, created_on)
    }

    /// Creates a live document with a caller-provided id and revision 0.
    pub fn with_id(
        resource_id: DocumentId,
        draft: DocumentDraft,
        created_on: i64,
    ) -> Result<Self, ValidationError> {
        draft.validate()?;

        let mut revisions = RevisionLog::default();
        revisions.push(draft.content_address, created_on);
        Ok(Self {
            resource_id,
            author_id: draft.author_id,
            name: draft.name,
            tags: draft.tags,
            created_on,
            deleted_on: None,
            revisions,
        })
    }

    /// Appends one revision and replaces mutable metadata.
    ///
    /// Returns the new revision ordinal. On error the document is untouched.
    pub fn apply_append(
        &mut self,
        draft: DocumentDraft,
        created_on: i64,
    ) -> Result<u32, ValidationError> {
        draft.validate()?;
        if draft.author_id != self.author_id {
            return Err(ValidationError::AuthorMismatch {
                expected: self.author_id.clone(),
                supplied: draft.author_id,
            });
        }

        self.name = draft.name;
        self.tags = draft.tags;
        Ok(self.revisions.push(draft.content_address, created_on).ordinal)
    }

    /// Marks this document as softly deleted. Keeps the first tombstone time.
    pub fn soft_delete(&mut self, deleted_on: i64) {
        if self.deleted_on.is_none() {
            self.deleted_on = Some(deleted_on);
        }
    }

    /// Returns whether this document is visible to default queries.
    pub fn is_live(&self) -> bool {
        self.deleted_on.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::{Document, DocumentDraft, Revision, RevisionLog};
    use crate::model::validation::ValidationError;

    #[test]
    fn create_starts_with_revision_zero() {
        let doc = Document::create(DocumentDraft::new("a1", "doc"), 10).unwrap();
        assert_eq!(doc.revisions.len(), 1);
        assert_eq!(doc.revisions.head().unwrap().ordinal, 0);
        assert!(doc.is_live());
    }

    #[test]
    fn draft_validation_rejects_blank_fields() {
        assert_eq!(
            DocumentDraft::new("", "doc").validate(),
            Err(ValidationError::EmptyAuthorId)
        );
        assert_eq!(
            DocumentDraft::new("a1", " ").validate(),
            Err(ValidationError::EmptyName)
        );
        assert_eq!(
            DocumentDraft::new("a1", "doc").with_tags([""]).validate(),
            Err(ValidationError::EmptyTag)
        );
    }

    #[test]
    fn append_replaces_metadata_and_keeps_history() {
        let mut doc = Document::create(DocumentDraft::new("a1", "doc").with_tags(["x"]), 10).unwrap();
        let ordinal = doc
            .apply_append(DocumentDraft::new("a1", "renamed").with_tags(["y"]), 20)
            .unwrap();

        assert_eq!(ordinal, 1);
        assert_eq!(doc.name, "renamed");
        assert!(doc.tags.contains("y") && !doc.tags.contains("x"));
        assert_eq!(doc.revisions.as_slice()[0].created_on, 10);
        assert_eq!(doc.revisions.as_slice()[1].created_on, 20);
    }

    #[test]
    fn append_with_other_author_leaves_document_untouched() {
        let mut doc = Document::create(DocumentDraft::new("a1", "doc"), 10).unwrap();
        let before = doc.clone();
        let err = doc
            .apply_append(DocumentDraft::new("a2", "doc"), 20)
            .unwrap_err();
        assert!(matches!(err, ValidationError::AuthorMismatch { .. }));
        assert_eq!(doc, before);
    }

    #[test]
    fn soft_delete_keeps_first_tombstone() {
        let mut doc = Document::create(DocumentDraft::new("a1", "doc"), 10).unwrap();
        doc.soft_delete(30);
        doc.soft_delete(40);
        assert_eq!(doc.deleted_on, Some(30));
    }

    #[test]
    fn revision_log_rejects_gapped_entries() {
        let gapped = vec![
            Revision {
                ordinal: 0,
                content_address: None,
                created_on: 1,
            },
            Revision {
                ordinal: 2,
                content_address: None,
                created_on: 2,
            },
        ];
        assert!(RevisionLog::from_entries(gapped).is_err());
    }
}
