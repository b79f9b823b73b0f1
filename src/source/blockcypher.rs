//! BlockCypher HTTP client with join-all fan-out.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::join_all;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use url::Url;

use super::{BlockchainSource, BlockcypherResponse, EndpointError, FetchError};
use crate::domain::BlockchainSnapshot;

/// HTTP client for the BlockCypher chain endpoints.
///
/// One attempt per endpoint, no retries. Each request is bounded by the
/// client's request timeout; the fan-out as a whole is bounded by
/// `fetch_timeout`.
#[derive(Debug, Clone)]
pub struct BlockcypherClient {
    http: reqwest::Client,
    base_url: Url,
    fetch_timeout: Duration,
}

impl BlockcypherClient {
    /// Builds a client for `base_url`.
    ///
    /// # Errors
    ///
    /// Returns a [`reqwest::Error`] if the underlying HTTP client cannot be
    /// constructed (e.g. TLS backend initialisation failure).
    pub fn new(
        base_url: Url,
        request_timeout: Duration,
        fetch_timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(request_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url,
            fetch_timeout,
        })
    }

    /// Performs a single GET against `endpoint` and decodes the body.
    ///
    /// # Errors
    ///
    /// Returns an [`EndpointError`] on URL, transport, status, or decode
    /// failure, or when the body is JSON `null`.
    pub async fn fetch_one(&self, endpoint: &str) -> Result<BlockcypherResponse, EndpointError> {
        let url = self.base_url.join(endpoint)?;
        tracing::info!(%url, "fetching blockchain data");

        let body = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<Option<BlockcypherResponse>>()
            .await?;

        body.ok_or(EndpointError::EmptyBody)
    }

    async fn fetch_snapshot(&self, endpoint: &str) -> Option<BlockchainSnapshot> {
        match self.fetch_one(endpoint).await {
            Ok(response) => {
                let snapshot = response.into_snapshot();
                check_fee_family(&snapshot);
                Some(snapshot)
            }
            Err(EndpointError::EmptyBody) => {
                tracing::warn!(endpoint, "received empty response body");
                None
            }
            Err(e) => {
                tracing::warn!(endpoint, error = %e, "failed to fetch blockchain data");
                None
            }
        }
    }
}

#[async_trait]
impl BlockchainSource for BlockcypherClient {
    async fn fetch_all(&self, endpoints: &[String]) -> Result<Vec<BlockchainSnapshot>, FetchError> {
        let calls = endpoints.iter().map(|e| self.fetch_snapshot(e));

        let results = tokio::time::timeout(self.fetch_timeout, join_all(calls))
            .await
            .map_err(|_| FetchError::Timeout(self.fetch_timeout))?;

        let snapshots: Vec<BlockchainSnapshot> = results.into_iter().flatten().collect();
        tracing::info!(
            requested = endpoints.len(),
            fetched = snapshots.len(),
            "endpoint fan-out complete"
        );
        Ok(snapshots)
    }
}

/// Logs a snapshot whose populated fee group does not match its chain.
fn check_fee_family(snapshot: &BlockchainSnapshot) {
    let expected = snapshot.chain().map(|c| c.family());
    let actual = snapshot.fee_family();
    if let (Some(expected), Some(actual)) = (expected, actual) {
        if expected != actual {
            tracing::warn!(
                name = %snapshot.name,
                ?expected,
                ?actual,
                "fee fields do not match chain family"
            );
        }
    }
}
