//! Renders a whole SQLite database as a replayable SQL script.
//!
//! # Invariants
//! - Tables are created in `sqlite_master` order, before any data.
//! - FTS5 shadow tables are skipped; re-inserting into the virtual table
//!   rebuilds them on replay.
//! - Indexes, triggers and views are emitted after the data.
//! - The script carries `PRAGMA user_version` so migrations resume from it.

use crate::db::migrations::current_version;
use crate::db::DbResult;
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use std::collections::HashSet;

struct SchemaEntry {
    kind: String,
    name: String,
    sql: String,
}

/// Serializes schema and rows of `conn` into one SQL script.
pub fn dump_script(conn: &Connection) -> DbResult<String> {
    let shadow_tables = shadow_tables(conn)?;
    let entries = schema_entries(conn)?
        .into_iter()
        .filter(|entry| !entry.name.starts_with("sqlite_"))
        .filter(|entry| !shadow_tables.contains(&entry.name))
        .collect::<Vec<_>>();

    let mut script = String::new();
    script.push_str("PRAGMA foreign_keys=OFF;\n");
    script.push_str(&format!(
        "PRAGMA user_version={};\n",
        current_version(conn)?
    ));
    script.push_str("BEGIN TRANSACTION;\n");

    for entry in entries.iter().filter(|entry| entry.kind == "table") {
        script.push_str(&entry.sql);
        script.push_str(";\n");
    }
    for entry in entries.iter().filter(|entry| entry.kind == "table") {
        dump_rows(conn, &entry.name, &mut script)?;
    }
    for entry in entries.iter().filter(|entry| entry.kind != "table") {
        script.push_str(&entry.sql);
        script.push_str(";\n");
    }

    script.push_str("COMMIT;\n");
    Ok(script)
}

fn schema_entries(conn: &Connection) -> DbResult<Vec<SchemaEntry>> {
    let mut stmt = conn.prepare(
        "SELECT type, name, sql
         FROM sqlite_master
         WHERE sql IS NOT NULL
         ORDER BY rowid ASC;",
    )?;
    let entries = stmt
        .query_map([], |row| {
            Ok(SchemaEntry {
                kind: row.get(0)?,
                name: row.get(1)?,
                sql: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(entries)
}

fn shadow_tables(conn: &Connection) -> DbResult<HashSet<String>> {
    let mut stmt = conn.prepare("PRAGMA main.table_list;")?;
    let mut rows = stmt.query([])?;
    let mut names = HashSet::new();
    while let Some(row) = rows.next()? {
        let kind: String = row.get("type")?;
        if kind == "shadow" {
            names.insert(row.get::<_, String>("name")?);
        }
    }
    Ok(names)
}

fn dump_rows(conn: &Connection, table: &str, script: &mut String) -> DbResult<()> {
    let table = quote_identifier(table);
    let mut stmt = conn.prepare(&format!("SELECT * FROM {table};"))?;
    let columns = stmt
        .column_names()
        .into_iter()
        .map(quote_identifier)
        .collect::<Vec<_>>()
        .join(",");
    let column_count = stmt.column_count();

    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        script.push_str(&format!("INSERT INTO {table}({columns}) VALUES("));
        for index in 0..column_count {
            if index > 0 {
                script.push(',');
            }
            push_literal(script, row.get_ref(index)?);
        }
        script.push_str(");\n");
    }
    Ok(())
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Appends `value` as a SQL literal.
///
/// Text holding a NUL byte is written as a hex blob cast back to text, since
/// the statement parser stops reading at the first NUL.
fn push_literal(script: &mut String, value: ValueRef<'_>) {
    match value {
        ValueRef::Null => script.push_str("NULL"),
        ValueRef::Integer(value) => script.push_str(&value.to_string()),
        ValueRef::Real(value) if value.is_finite() => script.push_str(&format!("{value:?}")),
        ValueRef::Real(value) if value.is_nan() => script.push_str("NULL"),
        ValueRef::Real(value) if value > 0.0 => script.push_str("9e999"),
        ValueRef::Real(_) => script.push_str("-9e999"),
        ValueRef::Text(bytes) if bytes.contains(&0) => {
            script.push_str("CAST(");
            push_hex(script, bytes);
            script.push_str(" AS TEXT)");
        }
        ValueRef::Text(bytes) => {
            script.push('\'');
            script.push_str(&String::from_utf8_lossy(bytes).replace('\'', "''"));
            script.push('\'');
        }
        ValueRef::Blob(bytes) => push_hex(script, bytes),
    }
}

fn push_hex(script: &mut String, bytes: &[u8]) {
    const DIGITS: &[u8; 16] = b"0123456789ABCDEF";
    script.push_str("X'");
    for byte in bytes {
        script.push(DIGITS[usize::from(byte >> 4)] as char);
        script.push(DIGITS[usize::from(byte & 0x0F)] as char);
    }
    script.push('\'');
}
