//! FTS5 mirror of document text.
//!
//! # Responsibility
//! - Keep exactly one `documents_fts` entry per document id.
//! - Run domain-scoped full-text queries and shape snippet results.
//!
//! # Invariants
//! - `upsert` is idempotent and must run inside the same transaction as the
//!   catalog write it mirrors.
//! - Search results are ordered by `modified DESC, id ASC`.

use crate::db::DbError;
use crate::model::document::Document;
use crate::repo::document_repo::parse_document_row;
use crate::repo::RepoError;
use rusqlite::{params, Connection};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SearchResult<T> = Result<T, SearchError>;

#[derive(Debug)]
pub enum SearchError {
    /// User-provided query cannot be parsed by FTS5 syntax.
    InvalidQuery {
        query: String,
        message: String,
    },
    Repo(RepoError),
}

impl Display for SearchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidQuery { query, message } => {
                write!(f, "invalid full-text query `{query}`: {message}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SearchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidQuery { .. } => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for SearchError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for SearchError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(RepoError::Db(DbError::Sqlite(value)))
    }
}

/// Tokens of context kept around each match in a snippet.
const SNIPPET_TOKENS: u32 = 15;

pub struct SqliteSearchIndex<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSearchIndex<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn contains(&self, id: &str) -> SearchResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM documents_fts WHERE id = ?1);",
            [id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    /// Writes `data` as the indexed text of `id`.
    ///
    /// FTS5 tables reject `ON CONFLICT` upserts, so membership is tested and
    /// the matching INSERT or UPDATE is issued.
    pub fn upsert(&self, id: &str, data: &str) -> SearchResult<()> {
        if self.contains(id)? {
            self.conn.execute(
                "UPDATE documents_fts SET data = ?1 WHERE id = ?2;",
                params![data, id],
            )?;
        } else {
            self.conn.execute(
                "INSERT INTO documents_fts (id, data) VALUES (?1, ?2);",
                params![id, data],
            )?;
        }
        Ok(())
    }

    pub fn remove(&self, id: &str) -> SearchResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM documents_fts WHERE id = ?1;", [id])?;
        Ok(changed > 0)
    }

    /// Drops entries with empty text, the soft-delete marker.
    pub fn purge_empty(&self) -> SearchResult<usize> {
        let changed = self
            .conn
            .execute("DELETE FROM documents_fts WHERE data = '';", [])?;
        Ok(changed)
    }

    /// Runs an FTS5 `MATCH` expression against documents of one domain.
    ///
    /// Each result's `data` holds a highlighted snippet instead of the full
    /// text. Blank queries return no results.
    pub fn search(&self, query: &str, domain: &str) -> SearchResult<Vec<Document>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let mut stmt = self.conn.prepare(&format!(
            "SELECT
                documents.id AS id,
                documents.slug AS slug,
                domains.name AS domain,
                documents.created AS created,
                documents.modified AS modified,
                snippet(documents_fts, 1, '<b>', '</b>', '<b>...</b>', {SNIPPET_TOKENS}) AS data,
                documents.history AS history
             FROM documents_fts
             INNER JOIN documents ON documents.id = documents_fts.id
             INNER JOIN domains ON domains.id = documents.domain_id
             WHERE documents_fts MATCH ?1
               AND domains.name = ?2
             ORDER BY documents.modified DESC, documents.id ASC"
        ))?;

        let mut rows = stmt
            .query(params![query, domain])
            .map_err(|err| map_query_error(err, query))?;
        let mut documents = Vec::new();
        while let Some(row) = rows.next().map_err(|err| map_query_error(err, query))? {
            documents.push(parse_document_row(row)?);
        }

        Ok(documents)
    }
}

fn map_query_error(err: rusqlite::Error, query: &str) -> SearchError {
    if is_match_syntax_error(&err) {
        return SearchError::InvalidQuery {
            query: query.to_string(),
            message: err.to_string(),
        };
    }

    err.into()
}

fn is_match_syntax_error(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(_, Some(message)) => {
            let msg = message.to_lowercase();
            (msg.contains("fts5") && msg.contains("syntax"))
                || msg.contains("malformed match expression")
                || msg.contains("unterminated")
                || msg.contains("no such column")
        }
        _ => false,
    }
}
