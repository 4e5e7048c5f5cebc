//! Blob repository: idempotent writes keyed by id.

use super::RepoResult;
use crate::model::blob::Blob;
use rusqlite::{params, Connection, OptionalExtension};

pub trait BlobRepository {
    /// Inserts or replaces the blob with this id.
    fn put(&self, blob: &Blob) -> RepoResult<()>;
    fn get(&self, id: &str) -> RepoResult<Option<Blob>>;
}

pub struct SqliteBlobRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBlobRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl BlobRepository for SqliteBlobRepository<'_> {
    fn put(&self, blob: &Blob) -> RepoResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO blobs (id, name, data) VALUES (?1, ?2, ?3);",
            params![blob.id, blob.name, blob.data],
        )?;
        Ok(())
    }

    fn get(&self, id: &str) -> RepoResult<Option<Blob>> {
        let blob = self
            .conn
            .query_row(
                "SELECT id, name, data FROM blobs WHERE id = ?1;",
                [id],
                |row| {
                    Ok(Blob {
                        id: row.get("id")?,
                        name: row.get("name")?,
                        data: row.get("data")?,
                    })
                },
            )
            .optional()?;
        Ok(blob)
    }
}
