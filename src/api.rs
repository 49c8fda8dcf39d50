use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};

use crate::{
    MapQueryError, VERSION,
    history::{HistoryEntry, MemoryHistorySink},
    models::{AggregatedResult, BoundingBox, Coordinate, RoutePath, SearchOutcome},
    pipeline::SearchPipeline,
    polyline,
};

const DEFAULT_HISTORY_LIMIT: usize = 20;
const DEFAULT_EXPLORE_KEYWORD: &str = "cafe";

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<SearchPipeline>,
    pub history: Arc<MemoryHistorySink>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl SearchParams {
    fn reference(&self) -> Result<Option<Coordinate>, MapQueryError> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Coordinate::new(lat, lon).map(Some),
            (None, None) => Ok(None),
            _ => Err(MapQueryError::validation("lat and lon must be given together")),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RouteParams {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Deserialize)]
pub struct ExploreParams {
    pub lat: f64,
    pub lon: f64,
    pub keyword: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiRoute {
    pub distance_km: f64,
    pub duration_hours: f64,
    pub points: Vec<Coordinate>,
    /// Encoded polyline of `points`
    pub geometry: String,
    pub bounds: BoundingBox,
    pub alternatives: usize,
}

impl From<&RoutePath> for ApiRoute {
    fn from(route: &RoutePath) -> Self {
        Self {
            distance_km: route.display_distance_km(),
            duration_hours: route.display_duration_hours(),
            points: route.points.clone(),
            geometry: polyline::encode(&route.points),
            bounds: route.bounds,
            alternatives: route.alternatives,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ApiSearchResult {
    Route(ApiRoute),
    Nearby(AggregatedResult),
    Place(AggregatedResult),
    /// Blank query
    Empty,
}

impl From<Option<SearchOutcome>> for ApiSearchResult {
    fn from(outcome: Option<SearchOutcome>) -> Self {
        match outcome {
            Some(SearchOutcome::Route(route)) => ApiSearchResult::Route(ApiRoute::from(&route)),
            Some(SearchOutcome::Nearby(result)) => ApiSearchResult::Nearby(result),
            Some(SearchOutcome::Place(result)) => ApiSearchResult::Place(result),
            None => ApiSearchResult::Empty,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub kind: String,
    pub message: String,
}

/// Error response carrying the user-facing message
pub struct ApiError(MapQueryError);

impl From<MapQueryError> for ApiError {
    fn from(err: MapQueryError) -> Self {
        Self(err)
    }
}

fn status_for(err: &MapQueryError) -> StatusCode {
    match err {
        MapQueryError::NotFound { .. }
        | MapQueryError::GeocodeFailed { .. }
        | MapQueryError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
        MapQueryError::LocationRequired | MapQueryError::Validation { .. } => {
            StatusCode::BAD_REQUEST
        }
        MapQueryError::AggregationFailed { .. }
        | MapQueryError::NetworkFailure { .. }
        | MapQueryError::Upstream { .. }
        | MapQueryError::Decode { .. } => StatusCode::BAD_GATEWAY,
        MapQueryError::Config { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            tracing::warn!("Request failed: {}", self.0);
        } else {
            tracing::debug!("Request rejected: {}", self.0);
        }
        let body = ApiErrorBody {
            kind: self.0.kind().to_string(),
            message: self.0.user_message(),
        };
        (status, Json(body)).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/search", get(search))
        .route("/route", get(route))
        .route("/explore", get(explore))
        .route("/history", get(history))
        .route("/health", get(health))
        .with_state(state)
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ApiSearchResult>, ApiError> {
    let reference = params.reference()?;
    let outcome = state.pipeline.search(&params.q, reference).await?;
    Ok(Json(outcome.into()))
}

async fn route(
    State(state): State<AppState>,
    Query(params): Query<RouteParams>,
) -> Result<Json<ApiRoute>, ApiError> {
    let path = state.pipeline.route(&params.from, &params.to).await?;
    Ok(Json(ApiRoute::from(&path)))
}

async fn explore(
    State(state): State<AppState>,
    Query(params): Query<ExploreParams>,
) -> Result<Json<AggregatedResult>, ApiError> {
    let at = Coordinate::new(params.lat, params.lon)?;
    let keyword = params.keyword.as_deref().unwrap_or(DEFAULT_EXPLORE_KEYWORD);
    Ok(Json(state.pipeline.explore(at, keyword).await?))
}

async fn history(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Json<Vec<HistoryEntry>> {
    Json(
        state
            .history
            .recent(params.limit.unwrap_or(DEFAULT_HISTORY_LIMIT)),
    )
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok", "version": VERSION }))
}
