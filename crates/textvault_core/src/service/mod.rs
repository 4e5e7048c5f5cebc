//! Store-level services.
//!
//! # Responsibility
//! - Orchestrate repositories, the search index and snapshots into the
//!   public store API.
//! - Keep callers decoupled from SQL and locking details.

pub mod store;
