//! REST API layer: route handlers, DTOs, OpenAPI document and router
//! composition.
//!
//! Snapshot endpoints live under `/api/blockchain`; `/health` and
//! `/config/chains` are mounted at the root. With the `swagger-ui`
//! feature the UI is served at `/swagger-ui` and the document at
//! `/api-docs/openapi.json`.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document for every REST endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "chainsnap-gateway",
        description = "Snapshots BlockCypher chain tips and serves their paginated history."
    ),
    paths(
        handlers::blockchain::fetch_and_store,
        handlers::blockchain::list_snapshots,
        handlers::blockchain::list_snapshots_by_name,
        handlers::system::health_handler,
        handlers::system::chains_handler,
    ),
    components(schemas(
        dto::SnapshotDto,
        dto::SnapshotPageResponse,
        dto::ChainInfoDto,
        crate::error::ErrorResponse,
        crate::error::ValidationErrorResponse,
    )),
    tags(
        (name = "Blockchain", description = "Snapshot ingestion and history"),
        (name = "System", description = "Health and service metadata"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .merge(handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}
