use tempfile::TempDir;
use textvault_core::{Missing, Store, StoreConfig, StoreError, DEFAULT_DOMAIN};

#[test]
fn public_domain_exists_after_initialization() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);

    let domain = store.get_domain_from_name(DEFAULT_DOMAIN).unwrap();
    assert!(domain.id > 0);
    assert_eq!(domain.name, "public");
    assert_eq!(domain.key, "");
    assert!(!domain.public);
}

#[test]
fn domain_names_resolve_case_insensitively() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);

    store.set_domain("Team", "k3y").unwrap();
    let upper = store.get_domain_from_name("TEAM").unwrap();
    let lower = store.get_domain_from_name("team").unwrap();

    assert_eq!(upper.id, lower.id);
    assert_eq!(lower.name, "team");
    assert_eq!(lower.key, "k3y");
}

#[test]
fn registering_a_name_twice_is_a_conflict() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);

    store.set_domain("team", "").unwrap();
    let err = store.set_domain("TEAM", "other").unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));

    let err = store.set_domain("Public", "").unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));
    assert_eq!(store.list_domains().unwrap().len(), 2);
}

#[test]
fn blank_domain_name_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);

    let err = store.set_domain("   ", "").unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
}

#[test]
fn unknown_domain_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);

    let err = store.get_domain_from_name("ghost").unwrap_err();
    assert!(matches!(err, StoreError::NotFound(Missing::Domain(ref name)) if name == "ghost"));
}

#[test]
fn publicity_updates_flag_and_ignores_unknown_domains() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);
    store.set_domain("blog", "").unwrap();

    store.set_domain_publicity("Blog", true).unwrap();
    assert!(store.get_domain_from_name("blog").unwrap().public);

    store.set_domain_publicity("blog", false).unwrap();
    assert!(!store.get_domain_from_name("blog").unwrap().public);

    store.set_domain_publicity("ghost", true).unwrap();
    assert!(store.get_domain_from_name("ghost").unwrap_err().is_not_found());
    assert_eq!(store.list_domains().unwrap().len(), 2);
}

#[test]
fn list_domains_is_ordered_by_creation() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);
    store.set_domain("zeta", "").unwrap();
    store.set_domain("alpha", "").unwrap();

    let names = store
        .list_domains()
        .unwrap()
        .into_iter()
        .map(|domain| domain.name)
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["public", "zeta", "alpha"]);
}

fn open_store(dir: &TempDir) -> Store {
    let path = dir.path().join("domains");
    Store::open(StoreConfig::new(path.to_str().unwrap())).unwrap()
}
