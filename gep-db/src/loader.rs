//! CSV data loading functions for populating the database.
//!
//! Each loader parses CSV data (with a header row) from a string slice and
//! inserts rows into the corresponding table. Header names are used as
//! column names, so they must be plain identifiers.
//!
//! # CSV Formats
//!
//! - **Countries**: `id,name`
//! - **Models**: any subset of the `models` columns; `id`, `country` and
//!   `baseYear` are required. List columns (`timesteps`, `filters`,
//!   `levers`) are stored verbatim as text.
//! - **Scenarios**: `scenarioId,featureId,<measure columns>...` where the
//!   measure columns are year-suffixed (`Pop2030`, `ElecCode2025`, ...).
//!   Unknown measure columns are added to the table on first sight.

use crate::execute::quote_ident;
use crate::Database;
use anyhow::{anyhow, bail, Context};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::collections::HashSet;

impl Database {
    /// Load country names from CSV string.
    ///
    /// # Example CSV
    /// ```text
    /// id,name
    /// KE,Kenya
    /// ```
    pub fn load_countries(&self, csv_data: &str) -> anyhow::Result<()> {
        let conn = self.conn.borrow();
        let count = insert_csv(&conn, "countries", csv_data, |column, cell| {
            if column == "id" {
                Value::Text(cell.trim().to_uppercase())
            } else {
                text_cell(cell)
            }
        })?;
        log::info!("[GEP] loader: Loaded {} countries", count);
        Ok(())
    }

    /// Load model metadata from CSV string.
    ///
    /// # Example CSV
    /// ```text
    /// id,country,type,baseYear,timesteps,filters
    /// abc-ke,KE,abc,2020,"[2025,2030]","[{""key"":""Pop"",""timestep"":true}]"
    /// ```
    pub fn load_models(&self, csv_data: &str) -> anyhow::Result<()> {
        let conn = self.conn.borrow();
        let count = insert_csv(&conn, "models", csv_data, |column, cell| match column {
            "id" => Value::Text(cell.trim().to_lowercase()),
            "country" => Value::Text(cell.trim().to_uppercase()),
            "baseYear" => typed_cell(cell),
            _ => text_cell(cell),
        })?;
        log::info!("[GEP] loader: Loaded {} models", count);
        Ok(())
    }

    /// Load scenario feature rows from CSV string.
    ///
    /// Integers are stored as INTEGER, other numbers as REAL, empty cells
    /// as NULL and anything else as TEXT. Scenario ids are lowercased.
    ///
    /// # Example CSV
    /// ```text
    /// scenarioId,featureId,Pop2020,Pop2025,ElecCode2025
    /// abc-ke-1,0,120.5,130.0,2
    /// ```
    pub fn load_scenarios(&self, csv_data: &str) -> anyhow::Result<()> {
        let conn = self.conn.borrow();
        let header = csv_header(csv_data)?;
        if !header.iter().any(|h| h == "scenarioId") || !header.iter().any(|h| h == "featureId") {
            bail!("scenario CSV must have scenarioId and featureId columns");
        }
        let added = ensure_columns(&conn, "scenarios", &header)?;
        if added > 0 {
            log::info!("[GEP] loader: Added {} scenario columns", added);
        }

        let count = insert_csv(&conn, "scenarios", csv_data, |column, cell| match column {
            "scenarioId" => Value::Text(cell.trim().to_lowercase()),
            _ => typed_cell(cell),
        })?;
        log::info!("[GEP] loader: Loaded {} scenario features", count);
        Ok(())
    }
}

fn csv_header(csv_data: &str) -> anyhow::Result<Vec<String>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(csv_data.as_bytes());
    Ok(rdr.headers()?.iter().map(|h| h.trim().to_string()).collect())
}

fn table_columns(conn: &Connection, table: &str) -> anyhow::Result<HashSet<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(table)?))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<HashSet<_>, _>>()?;
    Ok(columns)
}

/// Add any header column the table does not have yet. Returns how many were added.
fn ensure_columns(conn: &Connection, table: &str, header: &[String]) -> anyhow::Result<usize> {
    let existing = table_columns(conn, table)?;
    let mut added = 0;
    for column in header.iter().filter(|c| !existing.contains(*c)) {
        conn.execute_batch(&format!(
            "ALTER TABLE {} ADD COLUMN {}",
            quote_ident(table)?,
            quote_ident(column)?
        ))?;
        added += 1;
    }
    Ok(added)
}

/// Insert every record of `csv_data` into `table`, converting cells with `convert`.
fn insert_csv<F>(conn: &Connection, table: &str, csv_data: &str, convert: F) -> anyhow::Result<u32>
where
    F: Fn(&str, &str) -> Value,
{
    let header = csv_header(csv_data)?;
    let known = table_columns(conn, table)?;
    if let Some(unknown) = header.iter().find(|h| !known.contains(*h)) {
        return Err(anyhow!("unknown {} column {:?}", table, unknown));
    }

    let columns = header
        .iter()
        .map(|h| quote_ident(h))
        .collect::<Result<Vec<_>, _>>()?;
    let placeholders = (1..=columns.len())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>();
    let sql = format!(
        "INSERT OR REPLACE INTO {} ({}) VALUES ({})",
        quote_ident(table)?,
        columns.join(", "),
        placeholders.join(", ")
    );

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_data.as_bytes());

    let tx = conn.unchecked_transaction()?;
    let mut count = 0u32;
    {
        let mut stmt = tx.prepare(&sql)?;
        for (line, result) in rdr.records().enumerate() {
            let r = result?;
            let values = header
                .iter()
                .enumerate()
                .map(|(i, column)| convert(column, r.get(i).unwrap_or("")))
                .collect::<Vec<_>>();
            stmt.execute(params_from_iter(values.iter()))
                .with_context(|| format!("{} row {}", table, line + 1))?;
            count += 1;
        }
    }
    tx.commit()?;
    Ok(count)
}

fn text_cell(cell: &str) -> Value {
    let cell = cell.trim();
    if cell.is_empty() {
        Value::Null
    } else {
        Value::Text(cell.to_string())
    }
}

fn typed_cell(cell: &str) -> Value {
    let cell = cell.trim();
    if cell.is_empty() {
        Value::Null
    } else if let Ok(i) = cell.parse::<i64>() {
        Value::Integer(i)
    } else if let Ok(f) = cell.parse::<f64>() {
        Value::Real(f)
    } else {
        Value::Text(cell.to_string())
    }
}

#[cfg(test)]
mod tests {
    use crate::Database;

    #[test]
    fn load_countries_uppercases_ids() {
        let db = Database::new().unwrap();
        db.load_countries("id,name\nke,Kenya\nTZ,Tanzania\n").unwrap();

        let conn = db.conn.borrow();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM countries", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 2);

        let name: String = conn
            .query_row("SELECT name FROM countries WHERE id = 'KE'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(name, "Kenya");
    }

    #[test]
    fn load_models_keeps_list_columns_verbatim() {
        let db = Database::new().unwrap();
        let csv = "\
id,country,type,baseYear,timesteps,filters
ABC-ke,ke,abc,2020,\"[2025,2030]\",\"['{\"\"key\"\":\"\"Pop\"\"}']\"
";
        db.load_models(csv).unwrap();

        let conn = db.conn.borrow();
        let (country, base_year, timesteps, filters): (String, i64, String, String) = conn
            .query_row(
                "SELECT country, baseYear, timesteps, filters FROM models WHERE id = 'abc-ke'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .unwrap();
        assert_eq!(country, "KE");
        assert_eq!(base_year, 2020);
        assert_eq!(timesteps, "[2025,2030]");
        assert_eq!(filters, "['{\"key\":\"Pop\"}']");
    }

    #[test]
    fn load_models_rejects_unknown_columns() {
        let db = Database::new().unwrap();
        let err = db
            .load_models("id,country,baseYear,colour\nabc-ke,KE,2020,red\n")
            .unwrap_err();
        assert!(err.to_string().contains("colour"));
    }

    #[test]
    fn load_scenarios_adds_measure_columns() {
        let db = Database::new().unwrap();
        let csv = "\
scenarioId,featureId,Pop2020,ElecCode2025
ABC-KE-1,0,120.5,2
abc-ke-1,1,,99
";
        db.load_scenarios(csv).unwrap();

        let conn = db.conn.borrow();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM scenarios WHERE scenarioId = 'abc-ke-1'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 2);

        let pop: Option<f64> = conn
            .query_row(
                "SELECT Pop2020 FROM scenarios WHERE featureId = 1",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert!(pop.is_none(), "Empty cells should load as NULL");

        let code_type: String = conn
            .query_row(
                "SELECT typeof(ElecCode2025) FROM scenarios WHERE featureId = 0",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(code_type, "integer");
    }

    #[test]
    fn load_scenarios_twice_reuses_columns() {
        let db = Database::new().unwrap();
        db.load_scenarios("scenarioId,featureId,Pop2020\na-b-1,0,1\n").unwrap();
        db.load_scenarios("scenarioId,featureId,Pop2020,Pop2030\na-b-2,0,1,2\n")
            .unwrap();

        let conn = db.conn.borrow();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM scenarios", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn load_scenarios_rejects_bad_column_names() {
        let db = Database::new().unwrap();
        assert!(db
            .load_scenarios("scenarioId,featureId,\"Pop 2020\"\na-b-1,0,1\n")
            .is_err());
        assert!(db.load_scenarios("scenarioId,Pop2020\na-b-1,1\n").is_err());
    }
}
