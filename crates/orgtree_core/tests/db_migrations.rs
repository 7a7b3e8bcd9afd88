use orgtree_core::db::migrations::latest_version;
use orgtree_core::db::{open_db, open_db_in_memory, open_db_with, DbError, DbOptions};
use orgtree_core::repo::SchemaError;
use orgtree_core::{HierarchyRepoError, SqliteHierarchyRepository};
use rusqlite::Connection;
use std::time::Duration;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "employees");
    for index in [
        "idx_employees_parent_id",
        "idx_employees_unit_unassigned",
        "idx_employees_officials",
        "idx_employees_name",
    ] {
        assert_index_exists(&conn, index);
    }
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("orgtree.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "employees");
}

#[test]
fn file_database_uses_wal_and_configured_busy_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wal.db");

    let conn = open_db_with(
        &path,
        &DbOptions {
            busy_timeout: Duration::from_millis(1500),
        },
    )
    .unwrap();

    let journal_mode: String = conn
        .query_row("PRAGMA journal_mode;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(journal_mode.to_ascii_lowercase(), "wal");
    let busy_timeout: i64 = conn
        .query_row("PRAGMA busy_timeout;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(busy_timeout, 1500);
    let foreign_keys: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(foreign_keys, 1);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn repository_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteHierarchyRepository::try_new(&conn) {
        Err(HierarchyRepoError::Schema(SchemaError::UninitializedConnection {
            actual_version,
            ..
        })) => assert_eq!(actual_version, 0),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("unmigrated connection must be rejected"),
    }
}

#[test]
fn store_rejects_official_without_level() {
    let conn = open_db_in_memory().unwrap();

    let result = conn.execute(
        "INSERT INTO employees (nip, name, unit, is_official, level)
         VALUES ('000000000000000001', 'Broken', 'Ops', 1, NULL);",
        [],
    );
    assert!(result.is_err());

    let result = conn.execute(
        "INSERT INTO employees (nip, name, unit, is_official, level)
         VALUES ('000000000000000002', 'Broken', 'Ops', 0, 3);",
        [],
    );
    assert!(result.is_err());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    assert_schema_object(conn, "table", table_name);
}

fn assert_index_exists(conn: &Connection, index_name: &str) {
    assert_schema_object(conn, "index", index_name);
}

fn assert_schema_object(conn: &Connection, kind: &str, name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = ?1 AND name = ?2
            );",
            [kind, name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "{kind} {name} does not exist");
}
