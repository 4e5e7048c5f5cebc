//! Persistence core of a multi-tenant document store.
//!
//! Versioned documents, a synchronized full-text index, tenant domains and
//! binary blobs live in an in-memory SQLite database that is snapshotted to a
//! gzip-compressed SQL script (`<name>.sql.gz`).
//!
//! ```no_run
//! use textvault_core::{Store, StoreConfig};
//!
//! # fn main() -> Result<(), textvault_core::StoreError> {
//! let store = Store::open(StoreConfig::new("wiki"))?;
//! let page = store.new_file("home", "Hello").in_domain("public");
//! store.save(&page)?;
//! assert_eq!(store.get("home", "public")?[0].data, "Hello");
//! store.dump_sql()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;
pub mod snapshot;

pub use config::{StoreConfig, DEFAULT_MAX_HISTORY_VERSIONS};
pub use error::{Missing, StoreError, StoreResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::blob::Blob;
pub use model::document::Document;
pub use model::domain::{normalize_domain_name, Domain, DEFAULT_DOMAIN};
pub use model::history::{History, HistoryError};
pub use model::millis_to_system_time;
pub use service::store::Store;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
