//! Document catalog repository.
//!
//! # Responsibility
//! - Read documents joined with their index text and owning domain.
//! - Persist catalog rows with insert-or-ignore followed by update.
//!
//! # Invariants
//! - Reads are scoped by lower-cased domain name.
//! - Multi-row reads are ordered by `modified DESC, id ASC`.
//! - Catalog rows never hold document text; it lives in the search index.

use super::{RepoError, RepoResult};
use crate::model::document::Document;
use crate::model::history::History;
use rusqlite::{params, Connection, OptionalExtension, Row};

const DOCUMENT_SELECT_SQL: &str = "SELECT
    documents.id AS id,
    documents.slug AS slug,
    domains.name AS domain,
    documents.created AS created,
    documents.modified AS modified,
    documents_fts.data AS data,
    documents.history AS history
FROM documents
INNER JOIN documents_fts ON documents_fts.id = documents.id
INNER JOIN domains ON domains.id = documents.domain_id";

const DOCUMENT_ORDER_SQL: &str = "ORDER BY documents.modified DESC, documents.id ASC";

/// Catalog values written by one save.
#[derive(Debug, Clone, Copy)]
pub struct CatalogRow<'a> {
    pub id: &'a str,
    pub domain_id: i64,
    pub slug: &'a str,
    pub created: i64,
    pub modified: i64,
    pub history_json: &'a str,
}

pub trait DocumentRepository {
    /// Exact id match within a domain.
    fn get_by_id(&self, id: &str, domain: &str) -> RepoResult<Vec<Document>>;
    /// Slug match within a domain, most recently modified first.
    fn get_by_slug(&self, slug: &str, domain: &str) -> RepoResult<Vec<Document>>;
    fn list_recent(&self, domain: &str, limit: u32) -> RepoResult<Vec<Document>>;
    /// Name of the domain owning `id`, in any domain.
    fn owner_domain(&self, id: &str) -> RepoResult<Option<String>>;
    fn id_exists(&self, id: &str, domain: &str) -> RepoResult<bool>;
    fn slug_exists(&self, slug: &str, domain: &str) -> RepoResult<bool>;
    /// Inserts the row if absent, then overwrites slug/modified/history.
    fn upsert(&self, row: &CatalogRow<'_>) -> RepoResult<()>;
    /// Returns `false` when no row had this id.
    fn delete(&self, id: &str) -> RepoResult<bool>;
    /// Deletes catalog rows whose index text is empty.
    fn delete_soft_deleted(&self) -> RepoResult<usize>;
    fn count(&self) -> RepoResult<u64>;
    fn last_modified(&self) -> RepoResult<Option<i64>>;
}

pub struct SqliteDocumentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDocumentRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn query_documents(
        &self,
        filter: &str,
        params: impl rusqlite::Params,
    ) -> RepoResult<Vec<Document>> {
        let mut stmt = self.conn.prepare(&format!(
            "{DOCUMENT_SELECT_SQL} WHERE {filter} {DOCUMENT_ORDER_SQL}"
        ))?;
        let mut rows = stmt.query(params)?;
        let mut documents = Vec::new();
        while let Some(row) = rows.next()? {
            documents.push(parse_document_row(row)?);
        }
        Ok(documents)
    }

    fn exists(&self, filter: &str, key: &str, domain: &str) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            &format!(
                "SELECT EXISTS(
                    SELECT 1
                    FROM documents
                    INNER JOIN domains ON domains.id = documents.domain_id
                    WHERE {filter} AND domains.name = ?2
                );"
            ),
            params![key, domain],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}

impl DocumentRepository for SqliteDocumentRepository<'_> {
    fn get_by_id(&self, id: &str, domain: &str) -> RepoResult<Vec<Document>> {
        self.query_documents(
            "documents.id = ?1 AND domains.name = ?2",
            params![id, domain],
        )
    }

    fn get_by_slug(&self, slug: &str, domain: &str) -> RepoResult<Vec<Document>> {
        self.query_documents(
            "documents.slug = ?1 AND domains.name = ?2",
            params![slug, domain],
        )
    }

    fn list_recent(&self, domain: &str, limit: u32) -> RepoResult<Vec<Document>> {
        let mut stmt = self.conn.prepare(&format!(
            "{DOCUMENT_SELECT_SQL} WHERE domains.name = ?1 {DOCUMENT_ORDER_SQL} LIMIT ?2"
        ))?;
        let mut rows = stmt.query(params![domain, i64::from(limit)])?;
        let mut documents = Vec::new();
        while let Some(row) = rows.next()? {
            documents.push(parse_document_row(row)?);
        }
        Ok(documents)
    }

    fn owner_domain(&self, id: &str) -> RepoResult<Option<String>> {
        let owner = self
            .conn
            .query_row(
                "SELECT domains.name
                 FROM documents
                 INNER JOIN domains ON domains.id = documents.domain_id
                 WHERE documents.id = ?1;",
                [id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(owner)
    }

    fn id_exists(&self, id: &str, domain: &str) -> RepoResult<bool> {
        self.exists("documents.id = ?1", id, domain)
    }

    fn slug_exists(&self, slug: &str, domain: &str) -> RepoResult<bool> {
        self.exists("documents.slug = ?1", slug, domain)
    }

    fn upsert(&self, row: &CatalogRow<'_>) -> RepoResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO documents (
                id,
                domain_id,
                slug,
                created,
                modified,
                history
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                row.id,
                row.domain_id,
                row.slug,
                row.created,
                row.modified,
                row.history_json,
            ],
        )?;

        // Runs whether or not the insert was ignored.
        self.conn.execute(
            "UPDATE documents
             SET
                slug = ?1,
                modified = ?2,
                history = ?3
             WHERE id = ?4;",
            params![row.slug, row.modified, row.history_json, row.id],
        )?;

        Ok(())
    }

    fn delete(&self, id: &str) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM documents WHERE id = ?1;", [id])?;
        Ok(changed > 0)
    }

    fn delete_soft_deleted(&self) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "DELETE FROM documents
             WHERE id IN (SELECT id FROM documents_fts WHERE data = '');",
            [],
        )?;
        Ok(changed)
    }

    fn count(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(id) FROM documents;", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    fn last_modified(&self) -> RepoResult<Option<i64>> {
        let modified = self.conn.query_row(
            "SELECT MAX(modified) FROM documents;",
            [],
            |row| row.get::<_, Option<i64>>(0),
        )?;
        Ok(modified)
    }
}

/// Decodes one row shaped like [`DOCUMENT_SELECT_SQL`].
///
/// `data` is whatever the query selected into the `data` column, which for
/// search results is a snippet rather than the full text.
pub(crate) fn parse_document_row(row: &Row<'_>) -> RepoResult<Document> {
    let id: String = row.get("id")?;
    let history_json: String = row.get("history")?;
    let history = History::from_json(&history_json).map_err(|source| {
        RepoError::InvalidHistory {
            document_id: id.clone(),
            source,
        }
    })?;
    let data: String = row.get("data")?;

    Ok(Document {
        id,
        slug: row.get("slug")?,
        domain: row.get("domain")?,
        created: row.get("created")?,
        modified: row.get("modified")?,
        rendered: data.clone(),
        data,
        history,
    })
}
