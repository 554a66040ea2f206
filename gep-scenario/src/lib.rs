//! Scenario summaries for energy-access planning models.
//!
//! Given a scenario id, an optional target year and optional user filters,
//! this crate resolves the owning model's filter/timestep schema, composes
//! the parameterized aggregate queries for every reporting dimension, runs
//! them through a [`gep_db::QueryExecutor`] and merges the results into one
//! [`SummaryResponse`].
//!
//! # Pipeline
//!
//! 1. [`model_schema::resolve_model`] - scenario id to [`Model`]
//! 2. [`query_builder::ScenarioQueries`] - model + year + filters to SQL
//! 3. [`summary::build_scenario_summary`] - execute, merge, expand
//!
//! The per-feature electrification codes come back sparse (only features
//! matching the filters) and are densified by [`expander::expand`] so the
//! client can index the comma-joined string by feature id.

pub mod catalog;
pub mod encoding;
pub mod error;
pub mod expander;
pub mod filters;
pub mod model_schema;
pub mod query_builder;
pub mod summary;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{Result, ScenarioError};
pub use filters::FilterRequest;
pub use model_schema::{FilterDefinition, Model};
pub use summary::{build_scenario_summary, SummaryResponse};
