//! Full-text index synchronizer backed by SQLite FTS5.
//!
//! # Responsibility
//! - Mirror each document's current text into `documents_fts`.
//! - Keep search result shaping inside core.

pub mod fts;
