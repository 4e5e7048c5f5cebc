//! Domain (tenant namespace) model.

use serde::{Deserialize, Serialize};

/// Name of the domain seeded at store initialization.
pub const DEFAULT_DOMAIN: &str = "public";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    pub id: i64,
    /// Always lower-case.
    pub name: String,
    /// Tenant secret; empty means no restriction.
    pub key: String,
    pub public: bool,
}

/// Canonical form of a domain name: trimmed, lower-cased, empty → `public`.
pub fn normalize_domain_name(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        DEFAULT_DOMAIN.to_string()
    } else {
        trimmed.to_lowercase()
    }
}
