//! Store configuration.
//!
//! # Invariants
//! - `name` is non-blank; it doubles as the snapshot path prefix.
//! - `max_history_versions` is at least 1.

use crate::error::{StoreError, StoreResult};
use std::path::PathBuf;

/// Versions kept per document before the oldest ones are collapsed.
pub const DEFAULT_MAX_HISTORY_VERSIONS: usize = 256;

const SNAPSHOT_SUFFIX: &str = ".sql.gz";

/// Options used by [`crate::Store::open`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Store name, optionally with a directory prefix (`data/wiki`).
    pub name: String,
    pub max_history_versions: usize,
}

impl StoreConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_history_versions: DEFAULT_MAX_HISTORY_VERSIONS,
        }
    }

    pub fn with_max_history_versions(mut self, max: usize) -> Self {
        self.max_history_versions = max;
        self
    }

    /// Location of the snapshot file: `<name>.sql.gz`.
    pub fn snapshot_path(&self) -> PathBuf {
        PathBuf::from(format!("{}{SNAPSHOT_SUFFIX}", self.name))
    }

    pub fn validate(&self) -> StoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(StoreError::Validation(
                "store must have a name".to_string(),
            ));
        }
        if self.max_history_versions == 0 {
            return Err(StoreError::Validation(
                "max_history_versions must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
