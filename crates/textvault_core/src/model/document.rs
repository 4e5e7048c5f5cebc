//! Document model.
//!
//! # Invariants
//! - `id` is stable for the life of the document and never reused.
//! - A document with empty `data` is soft-deleted until the next purge.
//! - `rendered` is derived at read time and never persisted.

use super::history::History;
use super::now_millis;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Basic unit saved in a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    /// Human-readable alias; not unique within a domain.
    pub slug: String,
    /// Owning domain name. Empty means the default `public` domain.
    pub domain: String,
    /// Unix epoch milliseconds.
    pub created: i64,
    /// Unix epoch milliseconds, refreshed on every save.
    pub modified: i64,
    /// Current text. Search results carry a highlighted snippet instead.
    pub data: String,
    pub history: History,
    #[serde(skip)]
    pub rendered: String,
}

impl Document {
    /// Creates a document with a freshly generated id.
    pub fn new(slug: impl Into<String>, data: impl Into<String>) -> Self {
        Self::with_id(Self::new_id(), slug, data)
    }

    /// Creates a document with a caller-provided id.
    pub fn with_id(id: impl Into<String>, slug: impl Into<String>, data: impl Into<String>) -> Self {
        let data = data.into();
        let now = now_millis();
        Self {
            id: id.into(),
            slug: slug.into(),
            domain: String::new(),
            created: now,
            modified: now,
            history: History::new(data.clone()),
            rendered: String::new(),
            data,
        }
    }

    /// Generates a globally unique document id.
    pub fn new_id() -> String {
        Uuid::new_v4().to_string()
    }

    pub fn in_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// Returns whether this document is waiting to be purged.
    pub fn is_soft_deleted(&self) -> bool {
        self.data.is_empty()
    }
}
