use serde_json::json;
use snowy_core::{compute_address, Document, DocumentDraft, Query, RevisionLog};
use uuid::Uuid;

#[test]
fn document_serializes_revisions_as_plain_array() {
    let address = compute_address(b"body");
    let document = Document::with_id(
        Uuid::nil(),
        DocumentDraft::new("a1", "doc")
            .with_tags(["b", "a"])
            .with_content(address.clone()),
        1_700_000_000_000,
    )
    .unwrap();

    let value = serde_json::to_value(&document).unwrap();
    assert_eq!(
        value,
        json!({
            "resource_id": "00000000-0000-0000-0000-000000000000",
            "author_id": "a1",
            "name": "doc",
            "tags": ["a", "b"],
            "created_on": 1_700_000_000_000_i64,
            "deleted_on": null,
            "revisions": [
                {
                    "ordinal": 0,
                    "content_address": address.as_str(),
                    "created_on": 1_700_000_000_000_i64,
                }
            ],
        })
    );

    let back: Document = serde_json::from_value(value).unwrap();
    assert_eq!(back, document);
}

#[test]
fn gapped_revision_log_is_rejected() {
    let raw = json!([
        { "ordinal": 0, "content_address": null, "created_on": 1 },
        { "ordinal": 2, "content_address": null, "created_on": 2 },
    ]);
    assert!(serde_json::from_value::<RevisionLog>(raw).is_err());
}

#[test]
fn malformed_content_address_is_rejected() {
    let raw = json!({ "ordinal": 0, "content_address": "ABC", "created_on": 1 });
    assert!(serde_json::from_value::<snowy_core::Revision>(raw).is_err());
}

#[test]
fn query_without_tags_field_matches_everything() {
    let query: Query = serde_json::from_value(json!({})).unwrap();
    assert_eq!(query, Query::all());
}
