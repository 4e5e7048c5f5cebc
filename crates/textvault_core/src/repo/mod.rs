//! Repository layer over the resident SQLite catalog.
//!
//! # Responsibility
//! - Own the SQL for documents, domains and blobs.
//! - Decode rows into model types, rejecting corrupt persisted state.
//!
//! # Invariants
//! - Repositories never take the store lock; callers hold it.
//! - Repositories accept any `Connection`, including an open `Transaction`,
//!   so compound writes stay inside the caller's atomic unit.

use crate::db::DbError;
use crate::model::history::HistoryError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod blob_repo;
pub mod document_repo;
pub mod domain_repo;

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// `documents.history` holds a value that does not decode.
    InvalidHistory {
        document_id: String,
        source: HistoryError,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidHistory {
                document_id,
                source,
            } => write!(f, "document `{document_id}`: {source}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidHistory { source, .. } => Some(source),
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
