//! Query result model structs for the pass-through lookups.
//!
//! All structs derive `Serialize` with camelCase field names, which is the
//! shape the API returns.

use serde::Serialize;

/// Country id and display name.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CountryInfo {
    /// ISO 3166 alpha-2 code, upper case.
    pub id: String,
    pub name: String,
}

/// Dataset-wide totals for the landing page.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Stats {
    pub totals: Totals,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Totals {
    /// Countries with at least one model.
    pub countries: i64,
    /// Distinct model types.
    pub models: i64,
}

/// A `models` row as stored.
///
/// The list columns are left as their raw text; decoding them needs the
/// encoding fallbacks in `gep-scenario`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelRecord {
    pub id: String,
    pub country: String,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub model_type: Option<String>,
    pub version: Option<String>,
    pub attribution: Option<String>,
    pub disclaimer: Option<String>,
    pub source_data: Option<String>,
    pub map: Option<String>,
    pub base_year: i64,
    pub timesteps: Option<String>,
    pub filters: Option<String>,
    pub levers: Option<String>,
    /// Last update, truncated to the day (`YYYY-MM-DD`).
    pub updated_at: Option<String>,
}
