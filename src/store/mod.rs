mod client;
mod row;
mod schema;
mod sqlite;

pub use client::StoreClient;
pub use row::{Row, format_datetime, parse_datetime};
pub use rusqlite::types::Value;
pub use sqlite::SqliteStore;

use crate::error::Result;

/// A single parameterized statement. Parameters bind positionally to `?1`, `?2`, ...
#[derive(Debug, Clone)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    #[must_use]
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }
}

/// Builds an `UPDATE` that touches only the columns it was given.
pub struct UpdateBuilder {
    table: &'static str,
    sets: Vec<(&'static str, Value)>,
}

impl UpdateBuilder {
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            sets: Vec::new(),
        }
    }

    #[must_use]
    pub fn set(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.sets.push((column, value.into()));
        self
    }

    /// Adds the column only when a value was supplied.
    #[must_use]
    pub fn set_opt<V: Into<Value>>(self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.set(column, value),
            None => self,
        }
    }

    pub fn build(self, key_column: &str, key: impl Into<Value>, returning: Option<&str>) -> Statement {
        let assignments = self
            .sets
            .iter()
            .enumerate()
            .map(|(i, (column, _))| format!("{column} = ?{}", i + 1))
            .collect::<Vec<_>>()
            .join(", ");

        let mut sql = format!(
            "UPDATE {} SET {assignments} WHERE {key_column} = ?{}",
            self.table,
            self.sets.len() + 1
        );
        if let Some(returning) = returning {
            sql.push_str(" RETURNING ");
            sql.push_str(returning);
        }

        let mut params: Vec<Value> = self.sets.into_iter().map(|(_, v)| v).collect();
        params.push(key.into());
        Statement { sql, params }
    }
}

/// Output of one statement inside a batch.
#[derive(Debug, Clone, Default)]
pub struct StatementResult {
    /// Rows produced by a SELECT or a `RETURNING` clause.
    pub rows: Vec<Row>,
    pub rows_affected: usize,
}

/// Store defines the relational engine interface.
///
/// Implementations are synchronous; async callers go through [`StoreClient`],
/// which moves each call onto the blocking pool under a timeout.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    fn query(&self, stmt: &Statement) -> Result<Vec<Row>>;

    fn execute(&self, stmt: &Statement) -> Result<usize>;

    /// Runs every statement in one transaction. Either all of them commit or none do.
    fn batch(&self, stmts: &[Statement]) -> Result<Vec<StatementResult>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_builder_numbers_params_in_order() {
        let stmt = UpdateBuilder::new("labels")
            .set("name", "Veil".to_string())
            .set_opt::<i64>("price", None)
            .set_opt("is_active", Some(false))
            .build("code", "AB23CD45".to_string(), Some("code"));

        assert_eq!(
            stmt.sql,
            "UPDATE labels SET name = ?1, is_active = ?2 WHERE code = ?3 RETURNING code"
        );
        assert_eq!(stmt.params.len(), 3);
        assert_eq!(stmt.params[2], Value::Text("AB23CD45".into()));
    }
}
