//! Tag query evaluation.
//!
//! # Responsibility
//! - Decide whether a document satisfies a tag query.
//! - Define the canonical listing order shared by every backend.
//!
//! # Invariants
//! - Tag comparison is exact, case-sensitive string equality.
//! - A query matches iff the document's tags are a superset of the query's.
//! - Listing order is `created_on ASC, resource_id ASC`.

use crate::model::document::Document;
use crate::model::query::Query;
use std::cmp::Ordering;

/// Returns true iff `document.tags ⊇ query.tags`.
pub fn matches(document: &Document, query: &Query) -> bool {
    query.tags.is_subset(&document.tags)
}

/// Canonical ordering used by list operations.
pub fn listing_order(left: &Document, right: &Document) -> Ordering {
    left.created_on
        .cmp(&right.created_on)
        .then_with(|| left.resource_id.cmp(&right.resource_id))
}

/// Sorts documents into canonical listing order.
pub fn order_for_listing(documents: &mut [Document]) {
    documents.sort_by(listing_order);
}

/// Keeps live documents that match `query`, in canonical listing order.
pub fn filter_live<I>(documents: I, query: &Query) -> Vec<Document>
where
    I: IntoIterator<Item = Document>,
{
    let mut selected: Vec<Document> = documents
        .into_iter()
        .filter(|document| document.is_live() && matches(document, query))
        .collect();
    order_for_listing(&mut selected);
    selected
}
