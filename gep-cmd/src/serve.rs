//! HTTP API over the scenario database.
//!
//! Every request opens its own read-only connection inside a blocking
//! task; nothing database-related is shared between requests.

use crate::rise;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path as UrlPath, Query, RawQuery, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use gep_db::models::{CountryInfo, Stats};
use gep_db::Database;
use gep_scenario::catalog::{self, CountryDetails, FeatureDetails, ModelDetails};
use gep_scenario::filters::parse_json_filters;
use gep_scenario::{build_scenario_summary, ScenarioError, SummaryResponse};
use log::{error, info, warn};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
struct AppState {
    db_path: Arc<PathBuf>,
}

/// An error response: `{"detail": "..."}` with a status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl From<ScenarioError> for ApiError {
    fn from(err: ScenarioError) -> Self {
        let status = match &err {
            ScenarioError::NotFound(_) => StatusCode::NOT_FOUND,
            ScenarioError::InvalidParameter(_)
            | ScenarioError::InvalidFilter(_)
            | ScenarioError::MalformedInput(_)
            | ScenarioError::Decode { .. } => StatusCode::BAD_REQUEST,
            ScenarioError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            detail: err.to_string(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self {
            status: rejection.status(),
            detail: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self {
            status: rejection.status(),
            detail: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("[GEP] request failed: {}", self.detail);
        } else {
            warn!("[GEP] request rejected ({}): {}", self.status, self.detail);
        }
        (self.status, Json(serde_json::json!({ "detail": self.detail }))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Run `f` against a fresh read-only connection on the blocking pool.
async fn with_db<T, F>(state: &AppState, f: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&Database) -> gep_scenario::Result<T> + Send + 'static,
{
    let path = Arc::clone(&state.db_path);
    let result = tokio::task::spawn_blocking(move || {
        let db = Database::open(path.as_path())?;
        f(&db)
    })
    .await
    .map_err(|e| ApiError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        detail: format!("request task failed: {}", e),
    })?;
    Ok(Json(result?))
}

pub fn router(db_path: PathBuf) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(Duration::from_secs(86400));

    Router::new()
        .route("/", get(root))
        .route("/stats", get(stats))
        .route("/countries", get(countries))
        .route("/countries/:id", get(country))
        .route("/models/:id", get(model))
        .route("/scenarios/:sid/features/:fid", get(feature))
        .route("/scenarios/:sid", get(scenario))
        .with_state(AppState {
            db_path: Arc::new(db_path),
        })
        .layer(cors)
}

pub async fn run_serve(db_path: &Path, bind: &str, rise_scores: &Path) -> anyhow::Result<()> {
    rise::install(rise::load_rise_scores(rise_scores)?);
    // fail at startup rather than on the first request
    Database::open(db_path)
        .map_err(|e| anyhow::anyhow!("Failed to open {}: {}", db_path.display(), e))?;

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("[GEP] serving {} on {}", db_path.display(), listener.local_addr()?);
    axum::serve(listener, router(db_path.to_path_buf())).await?;
    Ok(())
}

async fn root() -> &'static str {
    "GEP API Service"
}

async fn stats(State(state): State<AppState>) -> ApiResult<Stats> {
    with_db(&state, |db| Ok(db.query_stats()?)).await
}

async fn countries(State(state): State<AppState>) -> ApiResult<Vec<CountryInfo>> {
    with_db(&state, |db| Ok(db.query_countries()?)).await
}

async fn country(
    State(state): State<AppState>,
    UrlPath(id): UrlPath<String>,
) -> ApiResult<CountryDetails> {
    with_db(&state, move |db| {
        let mut details = catalog::country_details(db, &id)?;
        details.rise_scores = rise::rise_scores(&details.id);
        Ok(details)
    })
    .await
}

async fn model(
    State(state): State<AppState>,
    UrlPath(id): UrlPath<String>,
) -> ApiResult<ModelDetails> {
    with_db(&state, move |db| catalog::model_details(db, &id)).await
}

#[derive(Debug, Deserialize)]
struct YearParams {
    year: Option<i64>,
}

async fn feature(
    State(state): State<AppState>,
    path: Result<UrlPath<(String, i64)>, PathRejection>,
    params: Result<Query<YearParams>, QueryRejection>,
) -> ApiResult<FeatureDetails> {
    let UrlPath((sid, fid)) = path?;
    let Query(params) = params?;
    with_db(&state, move |db| {
        catalog::feature_details(db, &sid, fid, params.year)
    })
    .await
}

#[derive(Debug, Deserialize)]
struct ScenarioParams {
    year: Option<i64>,
    /// JSON array of filter requests
    filters: Option<String>,
}

async fn scenario(
    State(state): State<AppState>,
    UrlPath(sid): UrlPath<String>,
    params: Result<Query<ScenarioParams>, QueryRejection>,
    RawQuery(raw): RawQuery,
) -> ApiResult<SummaryResponse> {
    let Query(params) = params?;
    with_db(&state, move |db| {
        let filters = params
            .filters
            .as_deref()
            .filter(|f| !f.trim().is_empty())
            .map(parse_json_filters)
            .transpose()?;
        build_scenario_summary(db, &sid, params.year, filters, raw.as_deref())
    })
    .await
}
