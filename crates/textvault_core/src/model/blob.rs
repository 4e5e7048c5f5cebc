//! Opaque binary attachment. Blobs are not scoped to a domain.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blob {
    pub id: String,
    pub name: String,
    pub data: Vec<u8>,
}
