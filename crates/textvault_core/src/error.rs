//! Store-level error taxonomy.
//!
//! # Invariants
//! - Engine failures always carry the name of the failing operation.
//! - Expected outcomes (missing rows, duplicate domains) are explicit
//!   variants, never panics.

use crate::db::DbError;
use crate::repo::RepoError;
use crate::search::fts::SearchError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Which kind of record a lookup failed to find.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Missing {
    /// Document id or slug within a domain.
    Document(String),
    Domain(String),
    Blob(String),
}

impl Display for Missing {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Document(key) => write!(f, "no document with id or slug `{key}`"),
            Self::Domain(name) => write!(f, "domain `{name}` does not exist"),
            Self::Blob(id) => write!(f, "no blob with id `{id}`"),
        }
    }
}

#[derive(Debug)]
pub enum StoreError {
    /// Caller input rejected before touching storage.
    Validation(String),
    NotFound(Missing),
    /// A record with the same identity already exists.
    Conflict(String),
    Storage {
        op: &'static str,
        source: DbError,
    },
    /// Full-text expression rejected by the FTS5 parser.
    InvalidQuery {
        query: String,
        message: String,
    },
    /// Persisted history could not be encoded or decoded.
    Serialization {
        op: &'static str,
        message: String,
    },
    Io {
        op: &'static str,
        source: std::io::Error,
    },
}

impl StoreError {
    /// Returns whether this error reports an absent document, domain or blob.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub(crate) fn domain_not_found(name: impl Into<String>) -> Self {
        Self::NotFound(Missing::Domain(name.into()))
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(message) => write!(f, "invalid input: {message}"),
            Self::NotFound(missing) => write!(f, "{missing}"),
            Self::Conflict(message) => write!(f, "conflict: {message}"),
            Self::Storage { op, source } => write!(f, "{op}: {source}"),
            Self::InvalidQuery { query, message } => {
                write!(f, "invalid full-text query `{query}`: {message}")
            }
            Self::Serialization { op, message } => write!(f, "{op}: {message}"),
            Self::Io { op, source } => write!(f, "{op}: {source}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Attaches the failing operation name to lower-level results.
pub(crate) trait OpContext<T> {
    fn during(self, op: &'static str) -> StoreResult<T>;
}

impl<T> OpContext<T> for Result<T, rusqlite::Error> {
    fn during(self, op: &'static str) -> StoreResult<T> {
        self.map_err(|err| StoreError::Storage {
            op,
            source: DbError::Sqlite(err),
        })
    }
}

impl<T> OpContext<T> for Result<T, DbError> {
    fn during(self, op: &'static str) -> StoreResult<T> {
        self.map_err(|source| StoreError::Storage { op, source })
    }
}

impl<T> OpContext<T> for Result<T, RepoError> {
    fn during(self, op: &'static str) -> StoreResult<T> {
        self.map_err(|err| match err {
            RepoError::Db(source) => StoreError::Storage { op, source },
            invalid @ RepoError::InvalidHistory { .. } => StoreError::Serialization {
                op,
                message: invalid.to_string(),
            },
        })
    }
}

impl<T> OpContext<T> for Result<T, SearchError> {
    fn during(self, op: &'static str) -> StoreResult<T> {
        match self {
            Ok(value) => Ok(value),
            Err(SearchError::InvalidQuery { query, message }) => {
                Err(StoreError::InvalidQuery { query, message })
            }
            Err(SearchError::Repo(err)) => Err::<T, RepoError>(err).during(op),
        }
    }
}

impl<T> OpContext<T> for Result<T, std::io::Error> {
    fn during(self, op: &'static str) -> StoreResult<T> {
        self.map_err(|source| StoreError::Io { op, source })
    }
}
