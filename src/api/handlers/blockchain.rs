//! Blockchain snapshot handlers: fetch-and-store trigger and history queries.

use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{PaginationParams, SnapshotDto, SnapshotPageResponse};
use crate::app_state::AppState;
use crate::error::{ApiError, ErrorResponse, GatewayError, ValidationErrorResponse};
use crate::service::SnapshotQuery;

/// `POST /api/blockchain/fetch` — Fetch and store the current chain tips.
///
/// # Errors
///
/// Returns an [`ApiError`] with status 502 when BlockCypher is unreachable
/// as a whole, 500 when the batch cannot be stored.
#[utoipa::path(
    post,
    path = "/api/blockchain/fetch",
    tag = "Blockchain",
    summary = "Fetch and store blockchain data",
    description = "Fetches the current tip of every configured BlockCypher endpoint concurrently, stores the snapshots that were retrieved in one transaction, and invalidates cached query results. Endpoints that fail individually are skipped.",
    responses(
        (status = 200, description = "Newly stored snapshots", body = Vec<SnapshotDto>),
        (status = 500, description = "Snapshots could not be stored", body = ErrorResponse),
        (status = 502, description = "BlockCypher is unavailable", body = ErrorResponse),
    )
)]
pub async fn fetch_and_store(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let stored = state
        .fetch_service
        .fetch_and_store(&state.shutdown)
        .await
        .map_err(|e| e.with_details(state.expose_error_details))?;

    let body: Vec<SnapshotDto> = stored.iter().map(SnapshotDto::from).collect();
    Ok(Json(body))
}

/// `GET /api/blockchain` — Paginated history of all chains.
///
/// # Errors
///
/// Returns an [`ApiError`] with status 400 for malformed pagination
/// parameters, 500 when storage cannot be read.
#[utoipa::path(
    get,
    path = "/api/blockchain",
    tag = "Blockchain",
    summary = "List stored snapshots",
    description = "Returns stored snapshots of every chain, newest first. Results are cached for a few minutes and refreshed after every fetch.",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated snapshot history", body = SnapshotPageResponse),
        (status = 400, description = "Malformed pagination parameters", body = ValidationErrorResponse),
    )
)]
pub async fn list_snapshots(
    State(state): State<AppState>,
    params: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let expose = state.expose_error_details;
    let Query(params) = params.map_err(|r| rejected(r.body_text(), expose))?;

    let page = state
        .query_service
        .execute(SnapshotQuery::All(params.clamped()))
        .await
        .map_err(|e| e.with_details(expose))?;

    Ok(Json(SnapshotPageResponse::from(page.as_ref())))
}

/// `GET /api/blockchain/{name}` — Paginated history of one chain.
///
/// # Errors
///
/// Returns an [`ApiError`] with status 400 when `name` is not a supported
/// chain or the pagination parameters are malformed.
#[utoipa::path(
    get,
    path = "/api/blockchain/{name}",
    tag = "Blockchain",
    summary = "List stored snapshots of one chain",
    description = "Returns stored snapshots of a single chain, newest first. The name is matched case-insensitively and must be one of ETH.main, DASH.main, BTC.main, BTC.test3, LTC.main.",
    params(
        ("name" = String, Path, description = "Chain name, e.g. BTC.main"),
        PaginationParams,
    ),
    responses(
        (status = 200, description = "Paginated snapshot history", body = SnapshotPageResponse),
        (status = 400, description = "Unknown chain name", body = ValidationErrorResponse),
    )
)]
pub async fn list_snapshots_by_name(
    State(state): State<AppState>,
    name: Result<Path<String>, PathRejection>,
    params: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let expose = state.expose_error_details;
    let Path(name) = name.map_err(|r| rejected(r.body_text(), expose))?;
    let Query(params) = params.map_err(|r| rejected(r.body_text(), expose))?;

    let query = SnapshotQuery::ByName {
        name,
        paging: params.clamped(),
    };
    let page = state
        .query_service
        .execute(query)
        .await
        .map_err(|e| e.with_details(expose))?;

    Ok(Json(SnapshotPageResponse::from(page.as_ref())))
}

fn rejected(message: String, expose: bool) -> ApiError {
    GatewayError::Validation(vec![message]).with_details(expose)
}

/// Blockchain routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/blockchain", get(list_snapshots))
        .route("/api/blockchain/fetch", post(fetch_and_store))
        .route("/api/blockchain/{name}", get(list_snapshots_by_name))
}
