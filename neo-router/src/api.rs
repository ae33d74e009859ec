use crate::details::DetailsService;
use crate::lookup::{AsteroidLookupService, LookupError};
use crate::metrics_defs::{REQUEST_DURATION, REQUESTS_INFLIGHT};
use crate::types::AsteroidRecord;
use crate::upstream::UpstreamError;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{MatchedPath, Path, Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use favourites::{AsteroidId, Favourite, FavouritesError, FavouritesGateway};
use serde::{Deserialize, Serialize};
use shared::{gauge, histogram};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Everything the request handlers need, shared across requests
#[derive(Clone)]
pub struct AppState {
    pub lookup: Arc<AsteroidLookupService>,
    pub details: Arc<DetailsService>,
    pub favourites: FavouritesGateway,
    /// Deadline for a whole search request
    pub request_timeout: Duration,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/passthrough/search_by_range", get(search_by_range))
        .route("/passthrough/details_of/{asteroid_id}", get(details_of))
        .route(
            "/passthrough/favourites",
            get(list_favourites).post(create_favourite),
        )
        .route_layer(middleware::from_fn(record_request_metrics))
        .with_state(state)
}

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Favourites(#[from] FavouritesError),

    #[error("request did not complete within {}s", .0.as_secs_f64())]
    Timeout(Duration),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Lookup(LookupError::InvalidRange(_)) => StatusCode::BAD_REQUEST,
            ApiError::Lookup(LookupError::Upstream(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Lookup(LookupError::Internal(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Favourites(FavouritesError::Conflict(_)) => StatusCode::CONFLICT,
            ApiError::Favourites(FavouritesError::Store(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

#[derive(Serialize)]
struct ApiErrorResponse {
    error_message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "Request failed");
        } else {
            tracing::debug!(status = %status, error = %self, "Request rejected");
        }

        let body = Json(ApiErrorResponse {
            error_message: self.to_string(),
        });

        (status, body).into_response()
    }
}

#[derive(Deserialize, Debug)]
struct SearchParams {
    start_date: NaiveDate,
    end_date: NaiveDate,
}

async fn search_by_range(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Vec<AsteroidRecord>>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::InvalidInput(e.body_text()))?;

    // Dropping the lookup on timeout aborts its upstream calls
    let records = tokio::time::timeout(
        state.request_timeout,
        state.lookup.lookup(params.start_date, params.end_date),
    )
    .await
    .map_err(|_| ApiError::Timeout(state.request_timeout))??;

    Ok(Json(records))
}

async fn details_of(
    State(state): State<AppState>,
    asteroid_id: Result<Path<AsteroidId>, PathRejection>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let Path(asteroid_id) = asteroid_id.map_err(|e| ApiError::InvalidInput(e.body_text()))?;
    let details = state.details.details_of(asteroid_id).await?;
    Ok((details.status, Json(details.body)))
}

async fn create_favourite(
    State(state): State<AppState>,
    favourite: Result<Json<Favourite>, JsonRejection>,
) -> Result<(StatusCode, Json<Favourite>), ApiError> {
    let Json(favourite) = favourite.map_err(|e| ApiError::InvalidInput(e.body_text()))?;
    let stored = state.favourites.create(favourite).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

async fn list_favourites(State(state): State<AppState>) -> Result<Json<Vec<Favourite>>, ApiError> {
    Ok(Json(state.favourites.all().await?))
}

async fn record_request_metrics(request: Request, next: Next) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_default();

    let mut metrics = RequestMetrics::start(route);
    let response = next.run(request).await;
    metrics.status = Some(response.status());

    response
}

/// Counts a request as in flight until dropped, then records its duration.
///
/// Dropped without a status when the client goes away before the response is
/// ready. Those requests are recorded with the status `cancelled`.
struct RequestMetrics {
    route: String,
    started: Instant,
    status: Option<StatusCode>,
}

impl RequestMetrics {
    fn start(route: String) -> Self {
        gauge!(REQUESTS_INFLIGHT).increment(1.0);
        RequestMetrics {
            route,
            started: Instant::now(),
            status: None,
        }
    }
}

impl Drop for RequestMetrics {
    fn drop(&mut self) {
        gauge!(REQUESTS_INFLIGHT).decrement(1.0);

        let status = match self.status {
            Some(status) => status.as_u16().to_string(),
            None => "cancelled".to_string(),
        };
        histogram!(
            REQUEST_DURATION,
            "route" => std::mem::take(&mut self.route),
            "status" => status,
        )
        .record(self.started.elapsed().as_secs_f64());
    }
}
