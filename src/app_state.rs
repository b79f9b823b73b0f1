//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::domain::ResponseCache;
use crate::persistence::SnapshotStore;
use crate::service::{FetchService, QueryService};
use crate::shutdown::ShutdownSignal;
use crate::source::BlockchainSource;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Write path: fetch, persist, invalidate.
    pub fetch_service: Arc<FetchService>,
    /// Read path: validated, cached history queries.
    pub query_service: Arc<QueryService>,
    /// Snapshot store, used directly by the health check.
    pub store: SnapshotStore,
    /// Cancels in-flight fetches on shutdown.
    pub shutdown: ShutdownSignal,
    /// Include error details and causes in error responses.
    pub expose_error_details: bool,
}

impl AppState {
    /// Wires both services around a single response cache.
    #[must_use]
    pub fn new(
        config: &GatewayConfig,
        store: SnapshotStore,
        source: Arc<dyn BlockchainSource>,
        shutdown: ShutdownSignal,
    ) -> Self {
        let cache = ResponseCache::new(config.cache_max_capacity);

        let fetch_service = FetchService::new(
            source,
            store.clone(),
            cache.clone(),
            config.blockcypher.endpoints.clone(),
        );
        let query_service = QueryService::new(store.clone(), cache, config.cache_ttl);

        Self {
            fetch_service: Arc::new(fetch_service),
            query_service: Arc::new(query_service),
            store,
            shutdown,
            expose_error_details: config.environment.is_development(),
        }
    }
}
