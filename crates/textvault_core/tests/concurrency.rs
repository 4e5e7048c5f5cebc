use std::sync::Arc;
use std::thread;
use textvault_core::{Document, Store, StoreConfig};

const THREADS: usize = 8;
const SAVES_PER_THREAD: usize = 10;

#[test]
fn concurrent_saves_and_reads_are_serialized() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared");
    let store = Arc::new(Store::open(StoreConfig::new(path.to_str().unwrap())).unwrap());

    let handles = (0..THREADS)
        .map(|worker| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for index in 0..SAVES_PER_THREAD {
                    let doc = Document::new(
                        format!("w{worker}-{index}"),
                        format!("worker{worker} entry{index}"),
                    );
                    store.save(&doc).unwrap();
                    assert!(store.exists(&doc.id, "public").unwrap());
                    store.last_modified().unwrap();
                }
            })
        })
        .collect::<Vec<_>>();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.len().unwrap(), THREADS * SAVES_PER_THREAD);
    assert_eq!(store.find("worker3", "public").unwrap().len(), SAVES_PER_THREAD);
}

#[test]
fn dump_interleaves_safely_with_saves() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dumping");
    let config = StoreConfig::new(path.to_str().unwrap());
    let store = Arc::new(Store::open(config.clone()).unwrap());

    let writer = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for index in 0..20 {
                store
                    .save(&Document::new(format!("p{index}"), "steady text"))
                    .unwrap();
            }
        })
    };
    for _ in 0..5 {
        store.dump_sql().unwrap();
    }
    writer.join().unwrap();
    store.dump_sql().unwrap();

    let restored = Store::open(config).unwrap();
    assert_eq!(restored.len().unwrap(), 20);
}
