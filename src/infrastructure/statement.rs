//! Prepared-statement lifecycle over a `SQLite` connection.
//!
//! A [`StatementSession`] owns one compiled statement from prepare through
//! finalize. Finalization happens exactly once, when the session is dropped,
//! no matter which step failed first; callers never see a leaked native
//! statement. Only one session may be active on a connection at a time.

use rusqlite::types::ValueRef;
use rusqlite::{Connection, Row, Statement};

use crate::domain::{AppError, Result};

/// One prepared SQL statement and its execution state.
pub struct StatementSession<'conn> {
    stmt: Statement<'conn>,
}

impl std::fmt::Debug for StatementSession<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatementSession").finish_non_exhaustive()
    }
}

impl<'conn> StatementSession<'conn> {
    /// Compiles `sql` against the connection.
    ///
    /// # Errors
    /// Returns a `Database` error carrying the native message if compilation
    /// fails.
    pub fn prepare(conn: &'conn Connection, sql: &str) -> Result<Self> {
        let stmt = conn.prepare(sql).map_err(AppError::database)?;
        Ok(Self { stmt })
    }

    /// Binds positional text arguments, first placeholder at index 1. The
    /// argument order must match the placeholder order in the statement.
    ///
    /// # Errors
    /// Returns a `Database` error on any bind failure.
    pub fn bind(&mut self, args: &[&str]) -> Result<()> {
        for (i, arg) in args.iter().enumerate() {
            self.stmt
                .raw_bind_parameter(i + 1, arg)
                .map_err(AppError::database)?;
        }
        Ok(())
    }

    /// Column names of the result set, in select order.
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect()
    }

    /// Starts execution, yielding a cursor that steps one row at a time.
    pub fn rows(&mut self) -> RowCursor<'_> {
        let column_count = self.stmt.column_count();
        RowCursor {
            rows: self.stmt.raw_query(),
            column_count,
        }
    }

    /// Runs a statement that changes data through its single step.
    ///
    /// # Errors
    /// Returns a `Database` error if the step fails or produces rows; a
    /// data-changing statement must report completion, nothing else.
    pub fn execute(&mut self) -> Result<()> {
        self.stmt.raw_execute().map_err(AppError::database)?;
        Ok(())
    }
}

/// Step-at-a-time view over an executing statement.
pub struct RowCursor<'stmt> {
    rows: rusqlite::Rows<'stmt>,
    column_count: usize,
}

impl RowCursor<'_> {
    /// Advances the statement by one step. Yields the row's column values as
    /// text, or `None` once the statement has run to completion.
    ///
    /// # Errors
    /// Returns a `Database` error on any other native status, and a
    /// `ColumnType` error if a yielded column is not text.
    pub fn step(&mut self) -> Result<Option<Vec<String>>> {
        let Some(row) = self.rows.next().map_err(AppError::database)? else {
            return Ok(None);
        };

        let mut values = Vec::with_capacity(self.column_count);
        for index in 0..self.column_count {
            values.push(text_column(row, index)?);
        }
        Ok(Some(values))
    }
}

/// Reads column `index` of the current row as text.
fn text_column(row: &Row<'_>, index: usize) -> Result<String> {
    match row.get_ref(index).map_err(AppError::database)? {
        ValueRef::Text(bytes) => Ok(String::from_utf8_lossy(bytes).into_owned()),
        other => Err(AppError::ColumnType {
            index,
            actual: other.data_type().to_string(),
        }),
    }
}
