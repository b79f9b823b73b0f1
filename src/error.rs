//! Gateway error types with HTTP status code mapping.
//!
//! [`GatewayError`] is the central error type for the gateway. Each variant
//! maps to a specific HTTP status code and structured JSON error response.
//! [`ApiError`] pairs an error with the deployment mode so that development
//! builds can expose the error text and its causes.

use std::error::Error as _;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::persistence::PersistenceError;
use crate::source::FetchError;

/// Structured JSON error response body.
///
/// All non-validation error responses follow this shape:
/// ```json
/// {
///   "error": "An external service is unavailable.",
///   "detail": "BlockCypher is unavailable: fetch timed out after 30s",
///   "stackTrace": "caused by: fetch timed out after 30s"
/// }
/// ```
/// `detail` and `stackTrace` are only present in development mode.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Generic, user-facing error message.
    pub error: String,
    /// Display text of the underlying error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Chain of underlying causes, one per line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
}

/// Response body for validation failures (HTTP 400).
#[derive(Debug, Serialize, ToSchema)]
pub struct ValidationErrorResponse {
    /// Human-readable validation messages.
    pub errors: Vec<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// | Variant           | HTTP Status               |
/// |-------------------|---------------------------|
/// | `Validation`      | 400 Bad Request           |
/// | `NotFound`        | 404 Not Found             |
/// | `Cancelled`       | 499 Client Closed Request |
/// | `Persistence`     | 500 Internal Server Error |
/// | `Internal`        | 500 Internal Server Error |
/// | `ExternalService` | 502 Bad Gateway           |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The fetch stage failed as a whole (transport failure or timeout).
    #[error("{service} is unavailable: {source}")]
    ExternalService {
        /// Name of the upstream service.
        service: &'static str,
        /// Stage-level failure reported by the source.
        #[source]
        source: FetchError,
    },

    /// A requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Request input was rejected before any handler ran.
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Storage read or write failed.
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// The caller cancelled the operation before it committed.
    #[error("operation cancelled")]
    Cancelled,

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Classifies a fetch-stage failure as a BlockCypher outage.
    #[must_use]
    pub fn external(source: FetchError) -> Self {
        Self::ExternalService {
            service: "BlockCypher",
            source,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ExternalService { .. } => StatusCode::BAD_GATEWAY,
            Self::Cancelled => {
                StatusCode::from_u16(499).unwrap_or(StatusCode::SERVICE_UNAVAILABLE)
            }
            Self::Persistence(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the generic message shown to clients for this variant.
    #[must_use]
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::ExternalService { .. } => "An external service is unavailable.",
            Self::NotFound(_) => "The requested resource was not found.",
            Self::Validation(_) => "One or more validation errors occurred.",
            Self::Cancelled => "The request was cancelled.",
            Self::Persistence(_) | Self::Internal(_) => "An unexpected error occurred.",
        }
    }

    /// Wraps the error for rendering, optionally exposing its details.
    #[must_use]
    pub fn with_details(self, expose_details: bool) -> ApiError {
        ApiError {
            error: self,
            expose_details,
        }
    }

    fn cause_chain(&self) -> Option<String> {
        let mut causes = Vec::new();
        let mut current = self.source();
        while let Some(cause) = current {
            causes.push(format!("caused by: {cause}"));
            current = cause.source();
        }
        if causes.is_empty() {
            None
        } else {
            Some(causes.join("\n"))
        }
    }
}

/// A [`GatewayError`] ready to be rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    error: GatewayError,
    expose_details: bool,
}

impl From<GatewayError> for ApiError {
    fn from(error: GatewayError) -> Self {
        error.with_details(false)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.error.status_code();

        if let GatewayError::Validation(errors) = self.error {
            let mut response = axum::Json(ValidationErrorResponse { errors }).into_response();
            *response.status_mut() = status;
            return response;
        }

        if status.is_server_error() {
            tracing::error!(error = %self.error, status = status.as_u16(), "request failed");
        } else {
            tracing::warn!(error = %self.error, status = status.as_u16(), "request rejected");
        }

        let body = if self.expose_details {
            ErrorResponse {
                error: self.error.public_message().to_string(),
                detail: Some(self.error.to_string()),
                stack_trace: self.error.cause_chain(),
            }
        } else {
            ErrorResponse {
                error: self.error.public_message().to_string(),
                detail: None,
                stack_trace: None,
            }
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}
