//! Connection bootstrap for the resident store database.
//!
//! # Responsibility
//! - Open the in-memory SQLite connection.
//! - Optionally replay a snapshot script before migrations run.
//! - Configure connection pragmas required by store behavior.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - Returned connections have migrations fully applied.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::time::Instant;

/// Opens an empty in-memory database and applies all migrations.
///
/// The result holds the schema only; seeding the default domain is the
/// caller's explicit initialization step.
pub fn open_empty() -> DbResult<Connection> {
    open_with("fresh", |_| Ok(()))
}

/// Opens an in-memory database and replays a snapshot script into it.
///
/// The script is executed verbatim, then any migrations newer than the
/// snapshot's `user_version` are applied on top.
///
/// # Errors
/// - Returns [`DbError::SnapshotReplay`] when the script does not execute.
/// - Returns [`DbError::UnsupportedSchemaVersion`] when the snapshot
///   comes from a newer schema.
pub fn open_from_script(script: &str) -> DbResult<Connection> {
    open_with("restore", |conn| {
        conn.execute_batch(script).map_err(DbError::SnapshotReplay)
    })
}

fn open_with(
    mode: &'static str,
    prepare: impl FnOnce(&Connection) -> DbResult<()>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let mut conn = match Connection::open_in_memory() {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    let result = prepare(&conn).and_then(|()| bootstrap_connection(&mut conn));
    match result {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={mode} duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn bootstrap_connection(conn: &mut Connection) -> DbResult<()> {
    apply_migrations(conn)?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    Ok(())
}
