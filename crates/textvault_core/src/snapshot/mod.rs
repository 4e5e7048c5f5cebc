//! Gzip-compressed SQL snapshots.
//!
//! # Responsibility
//! - Render the resident database as a SQL script ([`dump_script`]).
//! - Read and write `<name>.sql.gz` snapshot files.
//!
//! # Invariants
//! - Snapshots are replaced atomically: a temp file in the target directory
//!   is fully written and synced before it is renamed over the old file.
//! - A missing snapshot file is `Ok(None)`, not an error.

mod dump;

pub use dump::dump_script;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{self, BufWriter, ErrorKind, Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Reads and decompresses the snapshot at `path`.
pub fn read_snapshot(path: &Path) -> io::Result<Option<String>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err),
    };

    let mut script = String::new();
    GzDecoder::new(file).read_to_string(&mut script)?;
    Ok(Some(script))
}

/// Compresses `script` and atomically replaces the snapshot at `path`.
///
/// Returns the number of compressed bytes written.
pub fn write_snapshot(path: &Path, script: &str) -> io::Result<u64> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let tmp = NamedTempFile::new_in(dir)?;
    let mut encoder = GzEncoder::new(BufWriter::new(tmp), Compression::default());
    encoder.write_all(script.as_bytes())?;
    let tmp = encoder
        .finish()?
        .into_inner()
        .map_err(|err| err.into_error())?;

    tmp.as_file().sync_all()?;
    let written = tmp.as_file().metadata()?.len();
    tmp.persist(path).map_err(|err| err.error)?;
    Ok(written)
}
