use postboard_core::db::migrations::latest_version;
use postboard_core::db::{close_db, open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "users");
    assert_table_exists(&conn, "posts");
    assert_table_exists(&conn, "comments");
}

#[test]
fn foreign_keys_are_enforced() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);

    let err = conn
        .execute(
            "INSERT INTO posts (id, title, author_id) VALUES ('p', 'T', 'nobody');",
            [],
        )
        .unwrap_err();
    assert!(err.to_string().contains("FOREIGN KEY"));
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("postboard.db");

    let conn_first = open_db(&path).unwrap();
    conn_first
        .execute(
            "INSERT INTO users (id, email) VALUES ('u1', 'a@x.com');",
            [],
        )
        .unwrap();
    close_db(conn_first).unwrap();

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    let users: i64 = conn_second
        .query_row("SELECT COUNT(*) FROM users;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(users, 1);
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
fn opening_current_version_with_missing_table_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("damaged.db");

    let conn = open_db(&path).unwrap();
    conn.execute_batch("DROP TABLE comments;").unwrap();
    close_db(conn).unwrap();

    let err = open_db(&path).unwrap_err();
    assert!(matches!(err, DbError::MissingTable("comments")));
    assert!(err.to_string().contains("comments"));
}

#[test]
fn store_assigns_created_at() {
    let conn = open_db_in_memory().unwrap();
    conn.execute("INSERT INTO users (id, email) VALUES ('u1', 'a@x.com');", [])
        .unwrap();
    let created_at: i64 = conn
        .query_row("SELECT created_at FROM users WHERE id = 'u1';", [], |row| {
            row.get(0)
        })
        .unwrap();
    // 2020-01-01T00:00:00Z in epoch milliseconds.
    assert!(created_at > 1_577_836_800_000);
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
