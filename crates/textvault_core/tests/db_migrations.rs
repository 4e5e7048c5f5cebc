use rusqlite::Connection;
use textvault_core::db::migrations::{current_version, latest_version};
use textvault_core::db::{open_empty, open_from_script, DbError};

#[test]
fn open_empty_applies_all_migrations() {
    let conn = open_empty().unwrap();

    assert_eq!(current_version(&conn).unwrap(), latest_version());
    assert_table_exists(&conn, "documents");
    assert_table_exists(&conn, "documents_fts");
    assert_table_exists(&conn, "domains");
    assert_table_exists(&conn, "blobs");
}

#[test]
fn open_empty_does_not_seed_domains() {
    let conn = open_empty().unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM domains;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn replaying_pre_migration_script_upgrades_schema() {
    let conn = open_from_script("CREATE TABLE legacy_notes (body TEXT);").unwrap();

    assert_eq!(current_version(&conn).unwrap(), latest_version());
    assert_table_exists(&conn, "legacy_notes");
    assert_table_exists(&conn, "documents");
}

#[test]
fn replaying_current_script_leaves_version_untouched() {
    let script = format!("PRAGMA user_version={};", latest_version());
    let conn = open_from_script(&script).unwrap();
    assert_eq!(current_version(&conn).unwrap(), latest_version());
}

#[test]
fn newer_schema_version_is_rejected() {
    let err = open_from_script("PRAGMA user_version = 999;").unwrap_err();
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
fn unparsable_script_is_a_replay_error() {
    let err = open_from_script("CREATE TABLE broken (;").unwrap_err();
    assert!(matches!(err, DbError::SnapshotReplay(_)));
    assert!(err.to_string().starts_with("snapshot script did not replay"));
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
