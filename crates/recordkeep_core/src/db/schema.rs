//! Record schema bootstrap.
//!
//! # Responsibility
//! - Create the `records`, `id_sequences`, `record_refs` and `associations`
//!   tables.
//! - Stamp and check `PRAGMA user_version`.
//!
//! # Invariants
//! - A fresh database (`user_version = 0`) gets the full schema in one
//!   transaction.
//! - Any other version than [`SCHEMA_VERSION`] is rejected untouched.

use crate::db::{DbError, DbResult};
use rusqlite::Connection;

/// Schema version written by this binary.
pub const SCHEMA_VERSION: u32 = 1;

const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Tables every store/repository connection must expose.
pub const REQUIRED_TABLES: &[&str] = &[
    "records",
    "id_sequences",
    "record_refs",
    "associations",
];

/// Creates the schema on an empty database, or verifies the stamped version.
pub fn ensure_schema(conn: &mut Connection) -> DbResult<()> {
    let current = current_user_version(conn)?;

    if current == SCHEMA_VERSION {
        return Ok(());
    }
    if current != 0 {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current,
            supported: SCHEMA_VERSION,
        });
    }

    let tx = conn.transaction()?;
    tx.execute_batch(SCHEMA_SQL)?;
    tx.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION};"))?;
    tx.commit()?;

    Ok(())
}

/// Reads `PRAGMA user_version` from the connection.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

/// Returns whether a table with the given name exists.
pub fn table_exists(conn: &Connection, table: &str) -> DbResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
