//! Store manager: the public document/domain/blob API.
//!
//! # Responsibility
//! - Compose catalog, search index, domain directory, blob store and
//!   snapshot persistence into one API.
//! - Serialize every operation through one exclusive lock.
//!
//! # Invariants
//! - Every public operation, reads included, holds the lock for its whole
//!   duration; nothing runs concurrently with anything else.
//! - A save writes the catalog row and the index entry in one transaction,
//!   so the two never diverge.
//! - The snapshot file is the only durable state; mutations after the last
//!   `dump_sql` live in memory only.

use crate::config::StoreConfig;
use crate::db;
use crate::error::{Missing, OpContext, StoreError, StoreResult};
use crate::model::blob::Blob;
use crate::model::document::Document;
use crate::model::domain::{normalize_domain_name, Domain, DEFAULT_DOMAIN};
use crate::model::history::History;
use crate::model::{millis_to_system_time, now_millis};
use crate::repo::blob_repo::{BlobRepository, SqliteBlobRepository};
use crate::repo::document_repo::{CatalogRow, DocumentRepository, SqliteDocumentRepository};
use crate::repo::domain_repo::{DomainRepository, SqliteDomainRepository};
use crate::search::fts::SqliteSearchIndex;
use crate::snapshot;
use log::{debug, info, warn};
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use std::time::{Instant, SystemTime};

/// Multi-tenant document store resident in memory and snapshotted to disk.
pub struct Store {
    config: StoreConfig,
    conn: Mutex<Connection>,
}

impl Store {
    /// Opens the store named by `config`.
    ///
    /// When `<name>.sql.gz` exists its script is replayed to rebuild the
    /// store. Otherwise the schema is created, the `public` domain is seeded
    /// and an initial snapshot is written.
    ///
    /// # Errors
    /// - [`StoreError::Validation`] for an empty name.
    /// - [`StoreError::Io`] when the snapshot cannot be read or written.
    /// - [`StoreError::Storage`] when the script does not replay.
    pub fn open(config: StoreConfig) -> StoreResult<Self> {
        config.validate()?;
        let started_at = Instant::now();
        let snapshot_path = config.snapshot_path();

        let (store, mode) = match snapshot::read_snapshot(&snapshot_path).during("read snapshot")? {
            Some(script) => {
                let conn = db::open_from_script(&script).during("restore snapshot")?;
                (Self::from_parts(config, conn), "restore")
            }
            None => {
                let conn = db::open_empty().during("create schema")?;
                let store = Self::from_parts(config, conn);
                store.seed_default_domain()?;
                store.dump_sql()?;
                (store, "fresh")
            }
        };

        info!(
            "event=store_open module=store status=ok mode={} snapshot={} duration_ms={}",
            mode,
            snapshot_path.display(),
            started_at.elapsed().as_millis()
        );
        Ok(store)
    }

    fn from_parts(config: StoreConfig, conn: Connection) -> Self {
        Self {
            config,
            conn: Mutex::new(conn),
        }
    }

    /// Registers the default domain with an empty key if it is missing.
    fn seed_default_domain(&self) -> StoreResult<()> {
        let conn = self.lock();
        let domains = SqliteDomainRepository::new(&conn);
        if domains.find_by_name(DEFAULT_DOMAIN).during("seed domain")?.is_none() {
            domains.insert(DEFAULT_DOMAIN, "").during("seed domain")?;
        }
        Ok(())
    }

    /// Acquires the store-wide lock.
    ///
    /// A panic while holding the lock cannot leave a half-applied write:
    /// open transactions roll back when dropped. The poisoned guard is
    /// therefore reused.
    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| {
            warn!("event=lock_recovered module=store status=warn");
            poisoned.into_inner()
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.config.snapshot_path()
    }

    /// Builds an unsaved document with a fresh id in the default domain.
    pub fn new_file(&self, slug: impl Into<String>, data: impl Into<String>) -> Document {
        Document::new(slug, data)
    }

    /// Saves `document`, appending its data to the stored history.
    ///
    /// An empty `domain` means `public`. Saving empty `data` soft-deletes
    /// the document until the next purge.
    ///
    /// # Errors
    /// - `NotFound(Domain)` when the domain is not registered.
    /// - `Conflict` when the id already belongs to another domain.
    pub fn save(&self, document: &Document) -> StoreResult<()> {
        let domain_name = normalize_domain_name(&document.domain);
        let mut conn = self.lock();
        let tx = conn.transaction().during("save")?;

        let created = {
            let domain = SqliteDomainRepository::new(&tx)
                .find_by_name(&domain_name)
                .during("save")?
                .ok_or_else(|| StoreError::domain_not_found(&domain_name))?;

            let documents = SqliteDocumentRepository::new(&tx);
            if let Some(owner) = documents.owner_domain(&document.id).during("save")? {
                if owner != domain.name {
                    return Err(StoreError::Conflict(format!(
                        "document `{}` belongs to domain `{owner}`",
                        document.id
                    )));
                }
            }

            let existing = documents
                .get_by_id(&document.id, &domain.name)
                .during("save")?
                .into_iter()
                .next();
            let created = existing.is_none();
            let mut history = match existing {
                Some(existing) => {
                    let mut history = existing.history;
                    history.update(&document.data);
                    history
                }
                None => History::new(document.data.as_str()),
            };
            history.prune_to(self.config.max_history_versions);
            let history_json =
                history
                    .to_json()
                    .map_err(|err| StoreError::Serialization {
                        op: "save",
                        message: err.to_string(),
                    })?;

            documents
                .upsert(&CatalogRow {
                    id: &document.id,
                    domain_id: domain.id,
                    slug: &document.slug,
                    created: document.created,
                    modified: now_millis(),
                    history_json: &history_json,
                })
                .during("save")?;
            SqliteSearchIndex::new(&tx)
                .upsert(&document.id, &document.data)
                .during("save")?;
            created
        };

        tx.commit().during("save")?;
        debug!(
            "event=document_save module=store status=ok domain={} created={} soft_deleted={}",
            domain_name,
            created,
            document.is_soft_deleted()
        );
        Ok(())
    }

    /// Finds documents by exact id, falling back to slug, within a domain.
    ///
    /// Results are ordered by `modified` descending, so the newest document
    /// sharing a slug comes first.
    pub fn get(&self, id: &str, domain: &str) -> StoreResult<Vec<Document>> {
        let domain = normalize_domain_name(domain);
        let conn = self.lock();
        let documents = SqliteDocumentRepository::new(&conn);

        let by_id = documents.get_by_id(id, &domain).during("get from id")?;
        if !by_id.is_empty() {
            return Ok(by_id);
        }

        let by_slug = documents.get_by_slug(id, &domain).during("get from slug")?;
        if by_slug.is_empty() {
            return Err(StoreError::NotFound(Missing::Document(id.to_string())));
        }
        Ok(by_slug)
    }

    /// Returns the `limit` most recently modified documents of a domain.
    pub fn get_top_x(&self, domain: &str, limit: u32) -> StoreResult<Vec<Document>> {
        let domain = normalize_domain_name(domain);
        let conn = self.lock();
        SqliteDocumentRepository::new(&conn)
            .list_recent(&domain, limit)
            .during("get top")
    }

    /// Full-text search within a domain using FTS5 query syntax.
    ///
    /// Each result's `data` and `rendered` hold a `<b>`-highlighted snippet.
    ///
    /// # Errors
    /// - `NotFound(Domain)` when the domain is not registered.
    /// - [`StoreError::InvalidQuery`] for malformed FTS5 expressions.
    pub fn find(&self, query: &str, domain: &str) -> StoreResult<Vec<Document>> {
        let domain = normalize_domain_name(domain);
        let conn = self.lock();
        if SqliteDomainRepository::new(&conn)
            .find_by_name(&domain)
            .during("find")?
            .is_none()
        {
            return Err(StoreError::domain_not_found(domain));
        }

        SqliteSearchIndex::new(&conn)
            .search(query, &domain)
            .during("find")
    }

    /// Returns whether an id, or failing that a slug, exists in a domain.
    pub fn exists(&self, id: &str, domain: &str) -> StoreResult<bool> {
        let domain = normalize_domain_name(domain);
        let conn = self.lock();
        let documents = SqliteDocumentRepository::new(&conn);
        if documents.id_exists(id, &domain).during("exists")? {
            return Ok(true);
        }
        documents.slug_exists(id, &domain).during("exists")
    }

    /// Removes a document from the catalog and the index immediately.
    pub fn delete(&self, id: &str, domain: &str) -> StoreResult<()> {
        let domain = normalize_domain_name(domain);
        let mut conn = self.lock();
        let tx = conn.transaction().during("delete")?;
        {
            let documents = SqliteDocumentRepository::new(&tx);
            if !documents.id_exists(id, &domain).during("delete")? {
                return Err(StoreError::NotFound(Missing::Document(id.to_string())));
            }
            documents.delete(id).during("delete")?;
            SqliteSearchIndex::new(&tx).remove(id).during("delete")?;
        }
        tx.commit().during("delete")?;

        debug!("event=document_delete module=store status=ok domain={domain}");
        Ok(())
    }

    /// Physically removes soft-deleted documents and returns how many.
    pub fn purge_deleted(&self) -> StoreResult<usize> {
        let mut conn = self.lock();
        purge_soft_deleted(&mut conn)
    }

    /// Number of documents across all domains.
    pub fn len(&self) -> StoreResult<usize> {
        let conn = self.lock();
        let count = SqliteDocumentRepository::new(&conn)
            .count()
            .during("len")?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Newest `modified` time across all domains, `None` when empty.
    pub fn last_modified(&self) -> StoreResult<Option<SystemTime>> {
        let conn = self.lock();
        let millis = SqliteDocumentRepository::new(&conn)
            .last_modified()
            .during("last modified")?;
        Ok(millis.map(millis_to_system_time))
    }

    /// Registers a new domain.
    ///
    /// # Errors
    /// - [`StoreError::Validation`] for a blank name.
    /// - [`StoreError::Conflict`] when the name exists in any letter case.
    pub fn set_domain(&self, name: &str, key: &str) -> StoreResult<()> {
        let name = name.trim().to_lowercase();
        if name.is_empty() {
            return Err(StoreError::Validation(
                "domain name cannot be empty".to_string(),
            ));
        }

        let conn = self.lock();
        let domains = SqliteDomainRepository::new(&conn);
        if domains.find_by_name(&name).during("set domain")?.is_some() {
            return Err(StoreError::Conflict(format!(
                "domain `{name}` already exists"
            )));
        }
        domains.insert(&name, key).during("set domain")?;

        info!("event=domain_create module=store status=ok domain={name}");
        Ok(())
    }

    /// Sets the `public` flag of a domain.
    ///
    /// An unknown name updates nothing and still returns `Ok`.
    pub fn set_domain_publicity(&self, name: &str, public: bool) -> StoreResult<()> {
        let name = normalize_domain_name(name);
        let conn = self.lock();
        let changed = SqliteDomainRepository::new(&conn)
            .set_public(&name, public)
            .during("set domain publicity")?;
        if changed == 0 {
            debug!("event=domain_publicity module=store status=skipped reason=unknown_domain domain={name}");
        }
        Ok(())
    }

    /// Resolves a domain by case-insensitive name.
    pub fn get_domain_from_name(&self, name: &str) -> StoreResult<Domain> {
        let name = normalize_domain_name(name);
        let conn = self.lock();
        SqliteDomainRepository::new(&conn)
            .find_by_name(&name)
            .during("get domain")?
            .ok_or_else(|| StoreError::domain_not_found(name))
    }

    pub fn list_domains(&self) -> StoreResult<Vec<Domain>> {
        let conn = self.lock();
        SqliteDomainRepository::new(&conn)
            .list()
            .during("list domains")
    }

    /// Stores a blob, replacing any blob with the same id.
    pub fn save_blob(&self, id: &str, name: &str, data: &[u8]) -> StoreResult<()> {
        let conn = self.lock();
        SqliteBlobRepository::new(&conn)
            .put(&Blob {
                id: id.to_string(),
                name: name.to_string(),
                data: data.to_vec(),
            })
            .during("save blob")
    }

    pub fn get_blob(&self, id: &str) -> StoreResult<Blob> {
        let conn = self.lock();
        SqliteBlobRepository::new(&conn)
            .get(id)
            .during("get blob")?
            .ok_or_else(|| StoreError::NotFound(Missing::Blob(id.to_string())))
    }

    /// Purges soft-deleted documents and writes the whole store to
    /// `<name>.sql.gz`.
    pub fn dump_sql(&self) -> StoreResult<()> {
        let started_at = Instant::now();
        let mut conn = self.lock();

        let purged = purge_soft_deleted(&mut conn)?;
        let script = snapshot::dump_script(&conn).during("dump")?;
        let path = self.config.snapshot_path();
        let bytes = snapshot::write_snapshot(&path, &script).during("write snapshot")?;

        info!(
            "event=snapshot_write module=store status=ok path={} purged={} bytes={} duration_ms={}",
            path.display(),
            purged,
            bytes,
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    /// Closes the underlying connection without writing a snapshot.
    pub fn close(self) -> StoreResult<()> {
        let conn = self
            .conn
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        conn.close().map_err(|(_, err)| err).during("close")
    }
}

fn purge_soft_deleted(conn: &mut Connection) -> StoreResult<usize> {
    let tx = conn.transaction().during("purge")?;
    let purged = {
        let purged = SqliteDocumentRepository::new(&tx)
            .delete_soft_deleted()
            .during("purge")?;
        SqliteSearchIndex::new(&tx).purge_empty().during("purge")?;
        purged
    };
    tx.commit().during("purge")?;

    if purged > 0 {
        debug!("event=document_purge module=store status=ok purged={purged}");
    }
    Ok(purged)
}
