//! Typed pass-through lookups for countries, models and dataset totals.
//!
//! These are fixed queries with positional parameters. The scenario
//! endpoints build their SQL at runtime and go through
//! [`QueryExecutor`](crate::QueryExecutor) instead.

use crate::models::{CountryInfo, ModelRecord, Stats, Totals};
use crate::{Database, DbError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rusqlite::{params, OptionalExtension};

const MODEL_COLUMNS: &str = "id, country, name, description, type, version, attribution,
        disclaimer, sourceData, map, baseYear, timesteps, filters, levers, updatedAt";

impl Database {
    /// Count countries that have models, and distinct model types.
    pub fn query_stats(&self) -> Result<Stats> {
        let conn = self.conn.borrow();
        let (countries, models) = conn.query_row(
            "SELECT COUNT(DISTINCT country), COUNT(DISTINCT type) FROM models",
            [],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
        )?;
        log::info!(
            "[GEP] query: query_stats returned ({}, {})",
            countries,
            models
        );
        Ok(Stats {
            totals: Totals { countries, models },
        })
    }

    /// Countries with at least one model, ordered by name.
    pub fn query_countries(&self) -> Result<Vec<CountryInfo>> {
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(
            "SELECT id, name FROM countries
             WHERE id IN (SELECT country FROM models)
             ORDER BY name ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(CountryInfo {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        log::info!(
            "[GEP] query: query_countries returned {} records",
            rows.len()
        );
        Ok(rows)
    }

    /// Look up one country by ISO code (case-insensitive).
    pub fn query_country(&self, country_id: &str) -> Result<CountryInfo> {
        let country_id = country_id.to_uppercase();
        let conn = self.conn.borrow();
        conn.query_row(
            "SELECT id, name FROM countries WHERE id = ?1",
            params![country_id],
            |row| {
                Ok(CountryInfo {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            },
        )
        .optional()?
        .ok_or_else(|| DbError::NotFound(format!("country {}", country_id)))
    }

    /// Models of one country, most recently updated first.
    pub fn query_country_models(&self, country_id: &str) -> Result<Vec<ModelRecord>> {
        let country_id = country_id.to_uppercase();
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM models WHERE country = ?1 ORDER BY updatedAt DESC",
            MODEL_COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![country_id], model_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        log::info!(
            "[GEP] query: query_country_models returned {} records",
            rows.len()
        );
        Ok(rows)
    }

    /// Look up one model by id (case-insensitive).
    pub fn query_model(&self, model_id: &str) -> Result<ModelRecord> {
        let model_id = model_id.to_lowercase();
        let conn = self.conn.borrow();
        conn.query_row(
            &format!("SELECT {} FROM models WHERE id = ?1", MODEL_COLUMNS),
            params![model_id],
            model_from_row,
        )
        .optional()?
        .ok_or_else(|| DbError::NotFound(format!("model {}", model_id)))
    }
}

fn model_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ModelRecord> {
    let updated_at: Option<String> = row.get(14)?;
    Ok(ModelRecord {
        id: row.get(0)?,
        country: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        model_type: row.get(4)?,
        version: row.get(5)?,
        attribution: row.get(6)?,
        disclaimer: row.get(7)?,
        source_data: row.get(8)?,
        map: row.get(9)?,
        base_year: row.get(10)?,
        timesteps: row.get(11)?,
        filters: row.get(12)?,
        levers: row.get(13)?,
        updated_at: updated_at.map(|raw| truncate_to_day(&raw)),
    })
}

/// Reduce a timestamp to its `YYYY-MM-DD` day. Unparseable input is kept as is.
fn truncate_to_day(raw: &str) -> String {
    let raw = raw.trim();
    let day = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date()))
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"));
    match day {
        Ok(day) => day.format("%Y-%m-%d").to_string(),
        Err(_) => raw.to_string(),
    }
}
