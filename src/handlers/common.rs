use crate::errors::{ApiError, ServiceError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::IntoParams;
use validator::Validate;

use crate::entities::grn::ReceiptStatus;

/// Standard success response
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(data)).into_response()
}

/// Standard no content response
pub fn no_content_response() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// Validate request input
pub fn validate_input<T: Validate>(input: &T) -> Result<(), ApiError> {
    input
        .validate()
        .map_err(|e| ApiError::ValidationError(format!("Validation failed: {}", e)))
}

/// Map service errors to API errors
pub fn map_service_error(err: ServiceError) -> ApiError {
    ApiError::ServiceError(err)
}

/// Parses a wire status (`Pending`, `OK`, `Rejected`) into a bad request on failure.
pub fn parse_status(raw: &str) -> Result<ReceiptStatus, ApiError> {
    ReceiptStatus::from_str(raw.trim()).map_err(|_| {
        ApiError::ValidationError(format!(
            "Invalid status value '{}'; expected Pending, OK or Rejected",
            raw
        ))
    })
}

/// Offsets are bound as signed 64-bit integers by the SQL drivers.
const MAX_OFFSET: u64 = i64::MAX as u64;

/// Pagination parameters for list operations
#[derive(Debug, Default, Deserialize, Serialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// 1-based page number, defaults to 1
    pub page: Option<u64>,
    /// Page size, defaults to the configured page size and is capped at the configured maximum
    pub limit: Option<u64>,
}

impl PaginationParams {
    /// Resolves `(page, limit)` against the configured default and cap.
    /// Pages past the largest representable offset resolve to that last page.
    pub fn resolve(&self, default_limit: u64, max_limit: u64) -> (u64, u64) {
        let limit = self
            .limit
            .filter(|limit| *limit > 0)
            .unwrap_or(default_limit)
            .clamp(1, max_limit.max(1));
        let last_page = (MAX_OFFSET / limit).max(1);
        let page = self.page.unwrap_or(1).clamp(1, last_page);
        (page, limit)
    }
}

pub fn total_pages(total: u64, limit: u64) -> u64 {
    if limit == 0 {
        0
    } else {
        total.div_ceil(limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, None, (1, 10))]
    #[case(Some(0), Some(0), (1, 10))]
    #[case(Some(3), Some(25), (3, 25))]
    #[case(Some(2), Some(1000), (2, 100))]
    #[case(Some(u64::MAX), Some(10), (i64::MAX as u64 / 10, 10))]
    #[case(Some(u64::MAX), None, (i64::MAX as u64 / 10, 10))]
    fn pagination_defaults_and_cap(
        #[case] page: Option<u64>,
        #[case] limit: Option<u64>,
        #[case] expected: (u64, u64),
    ) {
        let params = PaginationParams { page, limit };
        assert_eq!(params.resolve(10, 100), expected);
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
    }

    #[test]
    fn unknown_status_is_a_bad_request() {
        assert_eq!(parse_status("OK").unwrap(), ReceiptStatus::Ok);
        assert!(matches!(
            parse_status("Done"),
            Err(ApiError::ValidationError(_))
        ));
    }
}
