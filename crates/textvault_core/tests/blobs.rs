use tempfile::TempDir;
use textvault_core::{Missing, Store, StoreConfig, StoreError};

#[test]
fn save_and_get_blob_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);

    let bytes = vec![0x89, b'P', b'N', b'G', 0x00, 0xFF];
    store.save_blob("img-1", "logo.png", &bytes).unwrap();

    let blob = store.get_blob("img-1").unwrap();
    assert_eq!(blob.id, "img-1");
    assert_eq!(blob.name, "logo.png");
    assert_eq!(blob.data, bytes);
}

#[test]
fn saving_same_blob_id_replaces_it() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);

    store.save_blob("file", "v1.txt", b"one").unwrap();
    store.save_blob("file", "v2.txt", b"two").unwrap();
    store.save_blob("file", "v2.txt", b"two").unwrap();

    let blob = store.get_blob("file").unwrap();
    assert_eq!(blob.name, "v2.txt");
    assert_eq!(blob.data, b"two".to_vec());
}

#[test]
fn empty_blob_is_stored() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);

    store.save_blob("empty", "empty.bin", &[]).unwrap();
    assert!(store.get_blob("empty").unwrap().data.is_empty());
}

#[test]
fn missing_blob_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);

    let err = store.get_blob("nope").unwrap_err();
    assert!(matches!(err, StoreError::NotFound(Missing::Blob(ref id)) if id == "nope"));
}

fn open_store(dir: &TempDir) -> Store {
    let path = dir.path().join("blobs");
    Store::open(StoreConfig::new(path.to_str().unwrap())).unwrap()
}
