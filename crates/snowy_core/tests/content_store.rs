use snowy_core::db::{into_shared, open_db_in_memory, SharedConnection};
use snowy_core::{
    compute_address, ContentStore, MemoryContentStore, RepoError, SqliteContentStore,
    ValidationError, DEFAULT_CONTENT_TYPE,
};

fn sqlite_store() -> (SharedConnection, SqliteContentStore) {
    let conn = into_shared(open_db_in_memory().unwrap());
    let store = SqliteContentStore::try_new(conn.clone()).unwrap();
    (conn, store)
}

fn backends() -> Vec<(&'static str, Box<dyn ContentStore>)> {
    vec![
        ("memory", Box::new(MemoryContentStore::new())),
        ("sqlite", Box::new(sqlite_store().1)),
    ]
}

fn payloads() -> Vec<Vec<u8>> {
    vec![
        b"a".to_vec(),
        b"hello world".to_vec(),
        (0u8..=255).collect(),
        vec![0; 4096],
    ]
}

#[test]
fn put_then_get_returns_identical_bytes() {
    for (name, store) in backends() {
        for payload in payloads() {
            let stored = store.put(payload.clone(), "application/pdf").unwrap();
            assert_eq!(stored.address, compute_address(&payload), "{name}");
            assert_eq!(stored.size, payload.len() as i64, "{name}");

            let loaded = store.get(&stored.address).unwrap();
            assert_eq!(loaded.bytes, payload, "{name}");
            assert_eq!(loaded.content_type, "application/pdf", "{name}");
        }
    }
}

#[test]
fn put_is_idempotent_and_first_content_type_wins() {
    for (name, store) in backends() {
        let first = store.put(b"same bytes".to_vec(), "text/plain").unwrap();
        let second = store.put(b"same bytes".to_vec(), "text/markdown").unwrap();

        assert_eq!(first.address, second.address, "{name}");
        assert_eq!(second.content_type, "text/plain", "{name}");
        assert_eq!(store.get(&first.address).unwrap(), first, "{name}");
    }
}

#[test]
fn identical_puts_store_a_single_copy() {
    let store = MemoryContentStore::new();
    store.put(b"dup".to_vec(), "").unwrap();
    store.put(b"dup".to_vec(), "").unwrap();
    assert_eq!(store.len(), 1);

    let (conn, store) = sqlite_store();
    store.put(b"dup".to_vec(), "").unwrap();
    store.put(b"dup".to_vec(), "").unwrap();
    let rows: i64 = conn
        .lock()
        .unwrap()
        .query_row("SELECT COUNT(*) FROM contents;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);
}

#[test]
fn get_unknown_address_is_not_found() {
    for (name, store) in backends() {
        let address = compute_address(b"never stored");
        let err = store.get(&address).unwrap_err();
        assert!(
            matches!(&err, RepoError::ContentNotFound(missing) if *missing == address),
            "{name}: {err}"
        );
        assert!(!store.contains(&address).unwrap(), "{name}");
    }
}

#[test]
fn empty_payload_is_rejected() {
    for (name, store) in backends() {
        let err = store.put(Vec::new(), "text/plain").unwrap_err();
        assert!(
            matches!(err, RepoError::Validation(ValidationError::EmptyContent)),
            "{name}"
        );
    }
}

#[test]
fn blank_content_type_defaults_to_octet_stream() {
    for (name, store) in backends() {
        let stored = store.put(b"untyped".to_vec(), " ").unwrap();
        assert_eq!(stored.content_type, DEFAULT_CONTENT_TYPE, "{name}");
    }
}

#[test]
fn put_verified_rejects_mismatched_address_without_storing() {
    for (name, store) in backends() {
        let wrong = compute_address(b"other bytes");
        let err = store
            .put_verified(b"real bytes".to_vec(), "text/plain", &wrong)
            .unwrap_err();
        assert!(
            matches!(
                err,
                RepoError::Validation(ValidationError::AddressMismatch { .. })
            ),
            "{name}"
        );
        assert!(!store.contains(&compute_address(b"real bytes")).unwrap(), "{name}");

        let right = compute_address(b"real bytes");
        let stored = store
            .put_verified(b"real bytes".to_vec(), "text/plain", &right)
            .unwrap();
        assert_eq!(stored.address, right, "{name}");
    }
}

#[test]
fn sqlite_get_rejects_corrupted_row() {
    let (conn, store) = sqlite_store();
    let stored = store.put(b"original".to_vec(), "text/plain").unwrap();

    conn.lock()
        .unwrap()
        .execute(
            "UPDATE contents SET bytes = X'00' WHERE address = ?1;",
            [stored.address.as_str()],
        )
        .unwrap();

    let err = store.get(&stored.address).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

#[test]
fn sqlite_store_rejects_uninitialized_connection() {
    let conn = into_shared(rusqlite::Connection::open_in_memory().unwrap());
    let result = SqliteContentStore::try_new(conn);
    assert!(matches!(
        result,
        Err(RepoError::UninitializedConnection {
            actual_version: 0,
            ..
        })
    ));
}
