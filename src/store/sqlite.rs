use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::types::Value;
use rusqlite::{Connection, ErrorCode, ffi, params_from_iter};

use super::schema::SCHEMA;
use super::{Row, Statement, StatementResult, Store};
use crate::error::{Error, Result};

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// A private in-memory database, used by tests and demos.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Maps constraint failures onto the store-level error kinds callers branch on.
fn classify(err: rusqlite::Error) -> Error {
    let extended = match &err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation => {
            Some(e.extended_code)
        }
        _ => None,
    };

    match extended {
        Some(ffi::SQLITE_CONSTRAINT_UNIQUE) | Some(ffi::SQLITE_CONSTRAINT_PRIMARYKEY) => {
            Error::UniqueViolation
        }
        Some(ffi::SQLITE_CONSTRAINT_FOREIGNKEY) => Error::ForeignKeyViolation,
        _ => Error::Database(err),
    }
}

fn run_query(conn: &Connection, stmt: &Statement) -> rusqlite::Result<StatementResult> {
    let mut prepared = conn.prepare(&stmt.sql)?;

    if prepared.column_count() == 0 {
        let rows_affected = prepared.execute(params_from_iter(stmt.params.iter()))?;
        return Ok(StatementResult {
            rows: Vec::new(),
            rows_affected,
        });
    }

    let columns: Arc<[String]> = prepared
        .column_names()
        .into_iter()
        .map(String::from)
        .collect();
    let readonly = prepared.readonly();

    let mut cursor = prepared.query(params_from_iter(stmt.params.iter()))?;
    let mut rows = Vec::new();
    while let Some(row) = cursor.next()? {
        let values = (0..columns.len())
            .map(|i| row.get::<_, Value>(i))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.push(Row::new(Arc::clone(&columns), values));
    }

    // UPDATE ... RETURNING yields one row per affected row.
    let rows_affected = if readonly { 0 } else { rows.len() };
    Ok(StatementResult {
        rows,
        rows_affected,
    })
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    fn query(&self, stmt: &Statement) -> Result<Vec<Row>> {
        let conn = self.conn();
        run_query(&conn, stmt)
            .map(|result| result.rows)
            .map_err(classify)
    }

    fn execute(&self, stmt: &Statement) -> Result<usize> {
        let conn = self.conn();
        run_query(&conn, stmt)
            .map(|result| result.rows_affected)
            .map_err(classify)
    }

    fn batch(&self, stmts: &[Statement]) -> Result<Vec<StatementResult>> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let mut results = Vec::with_capacity(stmts.len());
        for stmt in stmts {
            results.push(run_query(&tx, stmt).map_err(classify)?);
        }

        tx.commit()?;
        Ok(results)
    }
}
