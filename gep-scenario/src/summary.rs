//! The scenario summary response and the pipeline that builds it.

use crate::expander::expand_joined;
use crate::filters::{resolve_filters, FilterRequest};
use crate::model_schema::resolve_model;
use crate::query_builder::{Horizon, ScenarioQueries};
use crate::{Result, ScenarioError};
use gep_db::{QueryExecutor, Row};
use rusqlite::types::Value;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::collections::BTreeMap;
use std::str::FromStr;

/// A scenario whose highest feature id exceeds this many slots per stored
/// feature (and [`MIN_FEATURE_SLOTS`]) is rejected before expansion.
const FEATURE_SLOTS_PER_ROW: i64 = 100;
const MIN_FEATURE_SLOTS: i64 = 1_000_000;

/// Totals over the filtered features, rounded to 2 decimal places.
/// Every field is `0.00` when no feature matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    #[serde(with = "rust_decimal::serde::float_option")]
    pub pop_base_year: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub pop_intermediate_year: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub pop_final_year: Option<Decimal>,
    /// Cumulative through the target year.
    #[serde(with = "rust_decimal::serde::float_option")]
    pub investment_cost: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub new_capacity: Option<Decimal>,
}

/// Category code (as a string) to value.
pub type Breakdown = BTreeMap<String, f64>;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryByType {
    pub pop_connected_base_year: Breakdown,
    pub pop_connected_intermediate_year: Breakdown,
    pub pop_connected_final_year: Breakdown,
    pub investment_cost: Breakdown,
    pub new_capacity: Breakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub id: String,
    pub summary: Summary,
    pub summary_by_type: SummaryByType,
    /// Target-year category per feature id, comma-joined, `""` where the
    /// feature is filtered out or absent.
    pub feature_types: String,
}

/// Round half away from zero to 2 decimal places.
///
/// The value goes through its shortest decimal representation first, so
/// `2.675` rounds to `2.68` rather than to the binary neighbour below it.
pub fn round_2dp(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    let mut decimal = Decimal::from_str(&value.to_string())
        .ok()?
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    decimal.rescale(2);
    Some(decimal)
}

/// String key of a category cell; `None` for NULL.
pub fn category_key(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Integer(i) => Some(i.to_string()),
        Value::Real(r) if r.fract() == 0.0 && r.abs() < 1e15 => Some((*r as i64).to_string()),
        Value::Real(r) => Some(r.to_string()),
        Value::Text(t) => Some(t.clone()),
        Value::Null | Value::Blob(_) => None,
    }
}

fn breakdown(rows: &[Row], value_column: &str, drop_falsy: bool) -> Breakdown {
    rows.iter()
        .filter_map(|row| {
            let key = category_key(row.get_value("category"))?;
            if drop_falsy && (key.is_empty() || key == "0") {
                return None;
            }
            Some((key, row.get_f64(value_column).unwrap_or(0.0)))
        })
        .collect()
}

/// Fold per-year breakdowns, oldest first, into running totals: each
/// category's result is its sum over every year up to the last one.
pub fn accumulate<I>(years: I) -> Breakdown
where
    I: IntoIterator<Item = Breakdown>,
{
    years.into_iter().fold(Breakdown::new(), |mut total, year| {
        for (category, value) in year {
            *total.entry(category).or_insert(0.0) += value;
        }
        total
    })
}

/// Build the summary of one scenario.
///
/// `year` defaults to the model's first timestep. `filters` wins when it
/// holds any filter; otherwise filters are read from the legacy bracket
/// keys in `raw_query`.
pub fn build_scenario_summary<E: QueryExecutor>(
    exec: &E,
    scenario_id: &str,
    year: Option<i64>,
    filters: Option<Vec<FilterRequest>>,
    raw_query: Option<&str>,
) -> Result<SummaryResponse> {
    let scenario_id = scenario_id.to_lowercase();
    let model = resolve_model(exec, &scenario_id)?;
    let filters = resolve_filters(filters, raw_query)?;
    let queries = ScenarioQueries::new(&model, &scenario_id, year, &filters)?;
    log::info!(
        "[GEP] summary: scenario {} year {} with {} filters",
        scenario_id,
        queries.year(),
        filters.len()
    );

    let totals = queries.summary()?.run_one(exec)?;
    let max_feature_id = totals
        .get_i64("maxFeatureId")
        .ok_or_else(|| ScenarioError::NotFound(format!("scenario {}", scenario_id)))?;
    let feature_count = totals.get_i64("featureCount").unwrap_or(0);
    let slot_limit = feature_count
        .saturating_mul(FEATURE_SLOTS_PER_ROW)
        .max(MIN_FEATURE_SLOTS);
    if max_feature_id > slot_limit {
        return Err(ScenarioError::InvalidParameter(format!(
            "scenario {} has feature id {} for {} features",
            scenario_id, max_feature_id, feature_count
        )));
    }
    let summary = Summary {
        pop_base_year: totals.get_f64("popBaseYear").and_then(round_2dp),
        pop_intermediate_year: totals.get_f64("popIntermediateYear").and_then(round_2dp),
        pop_final_year: totals.get_f64("popFinalYear").and_then(round_2dp),
        investment_cost: totals.get_f64("investmentCost").and_then(round_2dp),
        new_capacity: totals.get_f64("newCapacity").and_then(round_2dp),
    };

    let base = queries.category_breakdown(Horizon::Base)?.run(exec)?;
    let intermediate = queries.category_breakdown(Horizon::Intermediate)?.run(exec)?;
    let fin = queries.category_breakdown(Horizon::Final)?.run(exec)?;

    let mut investment_years = Vec::new();
    let mut capacity_years = Vec::new();
    for (y, query) in queries.investment_breakdowns()? {
        let rows = query.run(exec)?;
        log::debug!("[GEP] summary: investment breakdown {} has {} categories", y, rows.len());
        investment_years.push(breakdown(&rows, "investmentCost", false));
        capacity_years.push(breakdown(&rows, "newCapacity", false));
    }

    let summary_by_type = SummaryByType {
        pop_connected_base_year: breakdown(&base, "popConnected", true),
        pop_connected_intermediate_year: breakdown(&intermediate, "popConnected", false),
        pop_connected_final_year: breakdown(&fin, "popConnected", false),
        investment_cost: accumulate(investment_years),
        new_capacity: accumulate(capacity_years),
    };

    let features = queries.feature_types()?.run(exec)?;
    let pairs = features.iter().filter_map(|row| {
        let id = row.get_i64("id").and_then(|id| usize::try_from(id).ok());
        if id.is_none() {
            log::warn!("[GEP] summary: skipping feature row without a valid id: {:?}", row);
        }
        Some((id?, category_key(row.get_value("tech")).unwrap_or_default()))
    });
    let feature_types = expand_joined(pairs, usize::try_from(max_feature_id).ok());

    Ok(SummaryResponse {
        id: scenario_id,
        summary,
        summary_by_type,
        feature_types,
    })
}
