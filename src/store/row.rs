use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Value;

use crate::error::{Error, Result};

/// A dynamically-shaped row as returned by the driver.
///
/// Only the typed accessors below read it; entity mapping functions decide
/// which columns are required and which fall back to defaults.
#[derive(Debug, Clone)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    pub(crate) fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.values.get(i))
    }

    /// Required text column. Integers are rendered; null or absent is a shape error.
    pub fn text(&self, column: &str) -> Result<String> {
        self.opt_text(column)
            .ok_or_else(|| Error::RowShape(format!("missing required column '{column}'")))
    }

    pub fn opt_text(&self, column: &str) -> Option<String> {
        match self.get(column)? {
            Value::Text(s) => Some(s.clone()),
            Value::Integer(i) => Some(i.to_string()),
            Value::Real(f) => Some(f.to_string()),
            Value::Null | Value::Blob(_) => None,
        }
    }

    /// Integer column coerced leniently: null, absent or unparsable values read as zero.
    pub fn int_or_zero(&self, column: &str) -> i64 {
        match self.get(column) {
            Some(Value::Integer(i)) => *i,
            Some(Value::Real(f)) => *f as i64,
            Some(Value::Text(s)) => s.trim().parse().unwrap_or(0),
            _ => 0,
        }
    }

    pub fn flag(&self, column: &str) -> bool {
        self.int_or_zero(column) != 0
    }

    pub fn timestamp(&self, column: &str) -> Result<DateTime<Utc>> {
        self.text(column).map(|s| parse_datetime(&s))
    }

    pub fn opt_timestamp(&self, column: &str) -> Option<DateTime<Utc>> {
        self.opt_text(column).map(|s| parse_datetime(&s))
    }
}

pub fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

/// Fixed-width UTC form so that lexical order in the store matches time order.
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, Value)]) -> Row {
        let columns: Arc<[String]> = pairs.iter().map(|(c, _)| c.to_string()).collect();
        Row::new(columns, pairs.iter().map(|(_, v)| v.clone()).collect())
    }

    #[test]
    fn test_int_or_zero_coerces() {
        let r = row(&[
            ("a", Value::Integer(7)),
            ("b", Value::Null),
            ("c", Value::Text("42".into())),
            ("d", Value::Text("nope".into())),
            ("e", Value::Real(3.9)),
        ]);
        assert_eq!(r.int_or_zero("a"), 7);
        assert_eq!(r.int_or_zero("b"), 0);
        assert_eq!(r.int_or_zero("c"), 42);
        assert_eq!(r.int_or_zero("d"), 0);
        assert_eq!(r.int_or_zero("e"), 3);
        assert_eq!(r.int_or_zero("missing"), 0);
    }

    #[test]
    fn test_required_text_reports_column() {
        let r = row(&[("name", Value::Null)]);
        let err = r.text("name").unwrap_err();
        assert!(err.to_string().contains("'name'"));
    }

    #[test]
    fn test_datetime_format_is_sortable() {
        let early = "2024-01-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let late = early + chrono::Duration::milliseconds(1500);
        assert!(format_datetime(&early) < format_datetime(&late));
        assert_eq!(parse_datetime(&format_datetime(&late)), late);
    }

    #[test]
    fn test_parse_sqlite_default_datetime() {
        let dt = parse_datetime("2024-03-05 10:20:30");
        assert_eq!(format_datetime(&dt), "2024-03-05T10:20:30.000000Z");
    }
}
