use rusqlite::Connection;
use tempfile::TempDir;
use textvault_core::db::open_empty;
use textvault_core::search::fts::SqliteSearchIndex;
use textvault_core::{Document, Store, StoreConfig, StoreError};

#[test]
fn find_is_scoped_to_domain() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);
    store.set_domain("other", "").unwrap();

    let public_doc = Document::new("same", "identical searchable text");
    let other_doc = Document::new("same", "identical searchable text").in_domain("other");
    store.save(&public_doc).unwrap();
    store.save(&other_doc).unwrap();

    let hits = store.find("searchable", "public").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, public_doc.id);
    assert_eq!(hits[0].domain, "public");
}

#[test]
fn find_returns_highlighted_snippet_and_full_history() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);

    let doc = Document::new("rust", "hello rust search");
    store.save(&doc).unwrap();

    let hits = store.find("rust", "public").unwrap();
    assert_eq!(hits.len(), 1);
    assert!(hits[0].data.contains("<b>rust</b>"));
    assert_eq!(hits[0].rendered, hits[0].data);
    assert_eq!(hits[0].history.latest(), "hello rust search");
}

#[test]
fn find_reflects_updated_content() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);

    let mut doc = Document::new("page", "alpha text");
    store.save(&doc).unwrap();
    doc.data = "beta text".to_string();
    store.save(&doc).unwrap();

    assert!(store.find("alpha", "public").unwrap().is_empty());
    let hits = store.find("beta", "public").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, doc.id);
}

#[test]
fn find_accepts_fts_syntax_and_rejects_malformed_queries() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);
    store.save(&Document::new("a", "plan meeting agenda")).unwrap();
    store.save(&Document::new("b", "plan vacation")).unwrap();

    assert_eq!(store.find("plan AND agenda", "public").unwrap().len(), 1);
    assert_eq!(store.find("plan*", "public").unwrap().len(), 2);
    assert!(store.find("   ", "public").unwrap().is_empty());

    let err = store.find("\"unterminated", "public").unwrap_err();
    assert!(matches!(err, StoreError::InvalidQuery { .. }));
}

#[test]
fn upsert_keeps_one_entry_per_id() {
    let conn = open_empty().unwrap();
    let index = SqliteSearchIndex::new(&conn);

    index.upsert("doc-1", "first").unwrap();
    index.upsert("doc-1", "second").unwrap();
    index.upsert("doc-2", "other").unwrap();

    assert_eq!(entry_count(&conn, "doc-1"), 1);
    let data: String = conn
        .query_row(
            "SELECT data FROM documents_fts WHERE id = 'doc-1';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(data, "second");
    assert!(index.contains("doc-2").unwrap());
}

#[test]
fn remove_and_purge_drop_entries() {
    let conn = open_empty().unwrap();
    let index = SqliteSearchIndex::new(&conn);

    index.upsert("keep", "content").unwrap();
    index.upsert("gone", "").unwrap();
    index.upsert("removed", "text").unwrap();

    assert!(index.remove("removed").unwrap());
    assert!(!index.remove("removed").unwrap());
    assert_eq!(index.purge_empty().unwrap(), 1);

    assert_eq!(entry_count(&conn, "keep"), 1);
    assert_eq!(entry_count(&conn, "gone"), 0);
}

fn open_store(dir: &TempDir) -> Store {
    let path = dir.path().join("search");
    Store::open(StoreConfig::new(path.to_str().unwrap())).unwrap()
}

fn entry_count(conn: &Connection, id: &str) -> i64 {
    conn.query_row(
        "SELECT COUNT(*) FROM documents_fts WHERE id = ?1;",
        [id],
        |row| row.get(0),
    )
    .unwrap()
}
