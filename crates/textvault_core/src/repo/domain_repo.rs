//! Domain directory repository.
//!
//! # Invariants
//! - Names are lower-cased before every read and write.
//! - The schema does not enforce name uniqueness; callers check first.
//! - Absent domains are `None`, never a zero id.

use super::RepoResult;
use crate::model::domain::Domain;
use rusqlite::{params, Connection, OptionalExtension, Row};

pub trait DomainRepository {
    fn find_by_name(&self, name: &str) -> RepoResult<Option<Domain>>;
    /// Inserts a domain with `public` unset and returns its id.
    fn insert(&self, name: &str, key: &str) -> RepoResult<i64>;
    /// Returns the number of rows updated.
    fn set_public(&self, name: &str, public: bool) -> RepoResult<usize>;
    fn list(&self) -> RepoResult<Vec<Domain>>;
}

pub struct SqliteDomainRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDomainRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl DomainRepository for SqliteDomainRepository<'_> {
    fn find_by_name(&self, name: &str) -> RepoResult<Option<Domain>> {
        let domain = self
            .conn
            .query_row(
                "SELECT id, name, key, public
                 FROM domains
                 WHERE name = ?1
                 ORDER BY id ASC
                 LIMIT 1;",
                [name.to_lowercase()],
                parse_domain_row,
            )
            .optional()?;
        Ok(domain)
    }

    fn insert(&self, name: &str, key: &str) -> RepoResult<i64> {
        self.conn.execute(
            "INSERT INTO domains (name, key) VALUES (?1, ?2);",
            params![name.to_lowercase(), key],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn set_public(&self, name: &str, public: bool) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "UPDATE domains SET public = ?1 WHERE name = ?2;",
            params![public, name.to_lowercase()],
        )?;
        Ok(changed)
    }

    fn list(&self) -> RepoResult<Vec<Domain>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, key, public FROM domains ORDER BY id ASC;")?;
        let domains = stmt
            .query_map([], parse_domain_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(domains)
    }
}

fn parse_domain_row(row: &Row<'_>) -> rusqlite::Result<Domain> {
    Ok(Domain {
        id: row.get("id")?,
        name: row.get("name")?,
        key: row.get("key")?,
        public: row.get::<_, Option<bool>>("public")?.unwrap_or(false),
    })
}
