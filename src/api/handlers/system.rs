//! System endpoints: health check, supported chains.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::ChainInfoDto;
use crate::app_state::AppState;
use crate::domain::ChainName;

/// `GET /health` — Storage reachability.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns `Healthy` when the snapshot store answers a trivial query, `Unhealthy` otherwise.",
    responses(
        (status = 200, description = "Store is reachable", body = String, content_type = "text/plain"),
        (status = 503, description = "Store is unreachable", body = String, content_type = "text/plain"),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.ping().await {
        Ok(()) => (StatusCode::OK, "Healthy"),
        Err(e) => {
            tracing::warn!(error = %e, "health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "Unhealthy")
        }
    }
}

/// `GET /config/chains` — List supported chains.
#[utoipa::path(
    get,
    path = "/config/chains",
    tag = "System",
    summary = "List supported chains",
    description = "Returns every chain name accepted by the by-name history query with its BlockCypher endpoint and fee family.",
    responses(
        (status = 200, description = "Chain catalog", body = Vec<ChainInfoDto>),
    )
)]
pub async fn chains_handler() -> impl IntoResponse {
    let chains: Vec<ChainInfoDto> = ChainName::ALL.into_iter().map(ChainInfoDto::from).collect();
    (StatusCode::OK, Json(chains))
}

/// System routes mounted at the root level.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config/chains", get(chains_handler))
}
