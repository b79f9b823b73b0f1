//! Request pipeline stages shared by the fetch command and the queries.
//!
//! Stages are plain async functions composed in a fixed order by the
//! services: [`logged`] wraps [`validated`], which wraps the cache lookup,
//! which wraps the handler.

use std::fmt::Display;
use std::future::Future;
use std::time::Instant;

use crate::error::GatewayError;

/// Runs `handler`, logging the request before and its outcome after.
///
/// # Errors
///
/// Returns whatever `handler` returns; the error is logged, not altered.
pub async fn logged<T, R, F>(request: &R, handler: F) -> Result<T, GatewayError>
where
    R: Display + ?Sized,
    F: Future<Output = Result<T, GatewayError>>,
{
    tracing::info!(%request, "handling request");
    let started = Instant::now();

    let result = handler.await;
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    match &result {
        Ok(_) => tracing::info!(%request, elapsed_ms, "handled request"),
        Err(e) if e.status_code().is_client_error() => {
            tracing::warn!(%request, elapsed_ms, error = %e, "request rejected");
        }
        Err(e) => tracing::error!(%request, elapsed_ms, error = %e, "error handling request"),
    }
    result
}

/// Runs `handler` only if `errors` is empty.
///
/// # Errors
///
/// Returns [`GatewayError::Validation`] carrying `errors` when any are
/// present, otherwise whatever `handler` returns.
pub async fn validated<T, F>(errors: Vec<String>, handler: F) -> Result<T, GatewayError>
where
    F: Future<Output = Result<T, GatewayError>>,
{
    if errors.is_empty() {
        handler.await
    } else {
        Err(GatewayError::Validation(errors))
    }
}
