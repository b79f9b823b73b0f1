//! Shared DTO types used across multiple endpoints.

use serde::Deserialize;
use utoipa::IntoParams;

use crate::service::PageRequest;

/// Pagination query parameters for list endpoints.
///
/// Both values are optional and clamped by the service: `page` to at
/// least 1, `pageSize` to `[1, 200]`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// Page number (1-indexed). Defaults to 1.
    pub page: Option<i64>,
    /// Items per page (max 200). Defaults to 50.
    pub page_size: Option<i64>,
}

impl PaginationParams {
    /// Applies defaults and clamping.
    #[must_use]
    pub fn clamped(&self) -> PageRequest {
        PageRequest::new(self.page, self.page_size)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn missing_params_use_defaults() {
        let paging = PaginationParams::default().clamped();
        assert_eq!((paging.page(), paging.page_size()), (1, 50));
    }

    #[test]
    fn params_deserialize_from_camel_case() {
        let parsed: Result<PaginationParams, _> =
            serde_json::from_str(r#"{"page":3,"pageSize":500}"#);
        let Ok(params) = parsed else {
            panic!("params should deserialize");
        };
        let paging = params.clamped();
        assert_eq!((paging.page(), paging.page_size()), (3, 200));
    }
}
