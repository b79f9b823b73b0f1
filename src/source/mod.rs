//! External data source: BlockCypher chain endpoints.
//!
//! [`BlockchainSource`] is the seam between the fetch-and-store service
//! and the outside world. [`BlockcypherClient`] is the production
//! implementation: it fans out one GET per endpoint, absorbs per-endpoint
//! failures, and only fails as a whole when the stage itself does.

pub mod blockcypher;
pub mod models;

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::BlockchainSnapshot;

pub use blockcypher::BlockcypherClient;
pub use models::BlockcypherResponse;

/// Failure of a single endpoint call. Logged and dropped by the fan-out.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    /// The endpoint path could not be joined onto the base URL.
    #[error("invalid endpoint url: {0}")]
    Url(#[from] url::ParseError),

    /// The request failed, returned a non-success status, or its body
    /// could not be decoded.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a JSON `null` body.
    #[error("empty response body")]
    EmptyBody,
}

/// Failure of the fetch stage as a whole.
///
/// Unlike [`EndpointError`], these abort the fetch-and-store operation and
/// are surfaced to clients as an external-service failure.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The transport failed in a way that affects the whole batch.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The fan-out did not finish within its deadline.
    #[error("fetch timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}

/// Source of chain-tip snapshots.
#[async_trait]
pub trait BlockchainSource: Send + Sync + std::fmt::Debug {
    /// Fetches every endpoint concurrently and returns the snapshots that
    /// were retrieved and mapped successfully, in endpoint order.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] only for stage-level failures; individual
    /// endpoint failures reduce the result set instead.
    async fn fetch_all(&self, endpoints: &[String]) -> Result<Vec<BlockchainSnapshot>, FetchError>;
}
