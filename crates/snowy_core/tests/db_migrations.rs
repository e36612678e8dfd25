use rusqlite::Connection;
use snowy_core::db::migrations::latest_version;
use snowy_core::db::{open_db, open_db_in_memory, open_db_with, DbError};
use std::thread;
use std::time::Duration;

const STORE_TABLES: [&str; 4] = ["contents", "documents", "revisions", "document_tags"];

fn user_version(conn: &Connection) -> u32 {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .unwrap()
}

fn tables(conn: &Connection) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name;")
        .unwrap();
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    names
}

fn assert_fully_migrated(conn: &Connection) {
    assert_eq!(user_version(conn), latest_version());
    let present = tables(conn);
    for table in STORE_TABLES {
        assert!(present.iter().any(|name| name == table), "missing table {table}");
    }
}

#[test]
fn in_memory_database_is_fully_migrated() {
    let conn = open_db_in_memory().unwrap();
    assert_fully_migrated(&conn);

    let foreign_keys: i64 = conn
        .pragma_query_value(None, "foreign_keys", |row| row.get(0))
        .unwrap();
    assert_eq!(foreign_keys, 1);
}

#[test]
fn reopening_a_file_keeps_schema_and_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snowy.db");

    {
        let conn = open_db(&path).unwrap();
        conn.execute(
            "INSERT INTO documents (resource_id, author_id, name, created_on, revision_count)
             VALUES ('r1', 'a1', 'doc', 1, 1);",
            [],
        )
        .unwrap();
    }

    let conn = open_db(&path).unwrap();
    assert_fully_migrated(&conn);
    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM documents;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);
}

#[test]
fn racing_first_opens_migrate_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("race.db");

    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                let conn = open_db_with(&path, Duration::from_secs(10)).unwrap();
                assert_fully_migrated(&conn);
            });
        }
    });
}

#[test]
fn database_from_newer_build_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");
    Connection::open(&path)
        .unwrap()
        .pragma_update(None, "user_version", 999)
        .unwrap();

    match open_db(&path) {
        Err(DbError::UnsupportedSchemaVersion {
            db_version: 999,
            latest_supported,
        }) => assert_eq!(latest_supported, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("newer schema must be refused"),
    }

    let untouched = Connection::open(&path).unwrap();
    assert_eq!(user_version(&untouched), 999);
    assert!(tables(&untouched).is_empty());
}

#[test]
fn schema_rejects_duplicate_ordinals_and_empty_tags() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO documents (resource_id, author_id, name, created_on, revision_count)
         VALUES ('r1', 'a1', 'doc', 1, 1);
         INSERT INTO revisions (resource_id, ordinal, created_on) VALUES ('r1', 0, 1);",
    )
    .unwrap();

    assert!(conn
        .execute(
            "INSERT INTO revisions (resource_id, ordinal, created_on) VALUES ('r1', 0, 2);",
            [],
        )
        .is_err());
    assert!(conn
        .execute(
            "INSERT INTO document_tags (resource_id, tag) VALUES ('r1', '');",
            [],
        )
        .is_err());
    assert!(conn
        .execute(
            "INSERT INTO revisions (resource_id, ordinal, created_on) VALUES ('nope', 0, 1);",
            [],
        )
        .is_err());
}
