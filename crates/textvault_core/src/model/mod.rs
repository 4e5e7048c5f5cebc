//! Store data model.
//!
//! # Responsibility
//! - Define documents, domains, blobs and the versioned history type.
//!
//! # Invariants
//! - Every document belongs to exactly one existing domain.
//! - Timestamps are Unix epoch milliseconds.

pub mod blob;
pub mod document;
pub mod domain;
pub mod history;

use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub(crate) fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as i64)
}

/// Converts stored epoch milliseconds to a [`SystemTime`]; pre-epoch values clamp to the epoch.
pub fn millis_to_system_time(millis: i64) -> SystemTime {
    UNIX_EPOCH + Duration::from_millis(u64::try_from(millis).unwrap_or(0))
}
