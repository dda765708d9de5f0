//! Encrypted `SQLite` database handle.
//!
//! Owns one open SQLCipher connection for the lifetime of the value; the
//! native connection is released when the handle is dropped. The key pragma
//! is issued immediately after opening, before any other statement, followed
//! by a probe read so that a wrong key fails here with a clear message.
//! (The native layer cannot tell "wrong key" from "not yet encrypted" until
//! content is actually read, so without the probe a wrong key would only
//! surface as a confusing failure on the first real query.)

use std::path::Path;

use rusqlite::Connection;

use crate::domain::{AppError, Result};
use crate::infrastructure::statement::StatementSession;

/// A fully materialized result row: (column name, text value) pairs in
/// select order.
pub type NamedRow = Vec<(String, String)>;

/// Keyed `SQLite` connection.
pub struct EncryptedDatabase {
    conn: Connection,
}

impl std::fmt::Debug for EncryptedDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedDatabase").finish_non_exhaustive()
    }
}

impl EncryptedDatabase {
    /// Opens or creates the database file at `path` and applies the cipher
    /// key.
    ///
    /// # Errors
    /// Returns a `Database` error if the native open fails or if the key
    /// does not match the file content.
    pub fn open(path: &Path, key: &str) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::io("Failed to create database directory", e))?;
        }

        let conn = Connection::open(path).map_err(AppError::database)?;

        let db = Self { conn };
        db.apply_key(key)?;
        Ok(db)
    }

    /// Opens an in-memory, unkeyed database for tests.
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(AppError::database)?;
        Ok(Self { conn })
    }

    /// Issues the key directive, then probes the schema table so a wrong
    /// key is rejected eagerly instead of on the first real query.
    fn apply_key(&self, key: &str) -> Result<()> {
        self.conn
            .pragma_update(None, "key", key)
            .map_err(AppError::database)?;

        self.conn
            .query_row("SELECT count(*) FROM sqlite_master", [], |_| Ok(()))
            .map_err(|e| AppError::Database {
                message: format!("Cannot read database (wrong encryption key?): {e}"),
                source: Some(e),
            })
    }

    /// Runs a SELECT, eagerly materializing every row as (column name,
    /// value) text pairs before returning.
    ///
    /// Result sets here are small and always consumed fully before the next
    /// statement runs on this handle, so there is no lazy cursor variant.
    pub fn query(&self, sql: &str, args: &[&str]) -> Result<Vec<NamedRow>> {
        let mut session = StatementSession::prepare(&self.conn, sql)?;
        session.bind(args)?;

        let names = session.column_names();
        let mut result = Vec::new();
        let mut cursor = session.rows();
        while let Some(values) = cursor.step()? {
            result.push(names.iter().cloned().zip(values).collect());
        }

        Ok(result)
    }

    /// Runs a statement that changes data. It must complete in a single
    /// step; a row-returning statement is a `Database` error.
    pub fn update(&self, sql: &str, args: &[&str]) -> Result<()> {
        let mut session = StatementSession::prepare(&self.conn, sql)?;
        session.bind(args)?;
        session.execute()
    }
}
