//! Generic parameterized query execution.
//!
//! Callers that assemble SQL at runtime go through [`QueryExecutor`]: the
//! statement text carries only identifiers and `:name` placeholders, and
//! every value travels separately in [`Params`].

use crate::{Database, DbError, Result};
use rusqlite::types::Value;
use rusqlite::ToSql;

/// Ordered set of named parameters.
///
/// Names are stored with their `:` prefix, the form SQLite expects when
/// binding by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    entries: Vec<(String, Value)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `value` to `:name`, replacing an earlier binding of the same name.
    pub fn bind<V: Into<Value>>(&mut self, name: &str, value: V) {
        let name = format!(":{}", name.trim_start_matches(':'));
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Look up a bound value by name, with or without the `:` prefix.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let name = name.trim_start_matches(':');
        self.entries
            .iter()
            .find(|(n, _)| &n[1..] == name)
            .map(|(_, v)| v)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A result row with its column names and SQLite-typed values.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn get_value(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.values[i])
    }

    /// Numeric value of a column; NULL, missing and non-numeric text give `None`.
    pub fn get_f64(&self, column: &str) -> Option<f64> {
        match self.get_value(column)? {
            Value::Integer(i) => Some(*i as f64),
            Value::Real(r) => Some(*r),
            Value::Text(t) => t.trim().parse().ok(),
            Value::Null | Value::Blob(_) => None,
        }
    }

    pub fn get_i64(&self, column: &str) -> Option<i64> {
        match self.get_value(column)? {
            Value::Integer(i) => Some(*i),
            Value::Real(r) if r.fract() == 0.0 => Some(*r as i64),
            Value::Text(t) => t.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn get_text(&self, column: &str) -> Option<&str> {
        match self.get_value(column)? {
            Value::Text(t) => Some(t.as_str()),
            _ => None,
        }
    }
}

/// Runs a query template with bound parameters and returns typed rows.
pub trait QueryExecutor {
    fn execute(&self, sql: &str, params: &Params) -> Result<Vec<Row>>;

    /// First row of the result; [`DbError::NotFound`] when there is none.
    fn execute_one(&self, sql: &str, params: &Params) -> Result<Row> {
        self.execute(sql, params)?
            .into_iter()
            .next()
            .ok_or_else(|| DbError::NotFound(first_line(sql).to_string()))
    }
}

impl QueryExecutor for Database {
    fn execute(&self, sql: &str, params: &Params) -> Result<Vec<Row>> {
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        let named: Vec<(&str, &dyn ToSql)> = params
            .entries
            .iter()
            .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
            .collect();

        let mut rows = stmt.query(named.as_slice())?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let values = (0..columns.len())
                .map(|i| row.get::<_, Value>(i))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            out.push(Row::new(columns.clone(), values));
        }
        log::debug!("[GEP] execute: {} returned {} rows", first_line(sql), out.len());
        Ok(out)
    }
}

fn first_line(sql: &str) -> &str {
    sql.trim().lines().next().unwrap_or("")
}

/// True for plain SQL identifiers: `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Double-quote a column name after checking it is a plain identifier.
pub fn quote_ident(name: &str) -> Result<String> {
    if is_identifier(name) {
        Ok(format!("\"{}\"", name))
    } else {
        Err(DbError::InvalidIdentifier(name.to_string()))
    }
}
