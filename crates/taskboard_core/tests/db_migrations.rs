use rusqlite::Connection;
use taskboard_core::db::migrations::latest_version;
use taskboard_core::db::{open_db, open_db_in_memory, DbError};

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "boards");
    assert_table_exists(&conn, "board_columns");
    assert_table_exists(&conn, "cards");
    assert_table_exists(&conn, "card_tags");
    assert_table_exists(&conn, "effort_observations");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("taskboard.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "cards");
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
fn foreign_keys_are_enforced() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);
}

#[test]
fn one_observation_per_card_and_day_is_enforced() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO boards (uuid, name) VALUES ('b', 'Board');
         INSERT INTO cards (uuid, board_uuid, name) VALUES ('c', 'b', 'Card');
         INSERT INTO effort_observations (uuid, card_uuid, day_key, recorded_at, remaining)
             VALUES ('o1', 'c', '2024-05-01', 0, 3);",
    )
    .unwrap();

    let duplicate = conn.execute(
        "INSERT INTO effort_observations (uuid, card_uuid, day_key, recorded_at, remaining)
         VALUES ('o2', 'c', '2024-05-01', 1000, 2);",
        [],
    );
    assert!(duplicate.is_err());
}

#[test]
fn card_column_and_position_must_be_set_together() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO boards (uuid, name) VALUES ('b', 'Board');
         INSERT INTO board_columns (uuid, board_uuid, name, position) VALUES ('col', 'b', 'Todo', 1);",
    )
    .unwrap();

    let half_placed = conn.execute(
        "INSERT INTO cards (uuid, board_uuid, column_uuid, position, name)
         VALUES ('c', 'b', 'col', NULL, 'Card');",
        [],
    );
    assert!(half_placed.is_err());
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
