//! API error mapping
//!
//! Every failure leaves the service as `{ success: false, error, code }`.
//! Nothing propagates past the handler boundary.
//!
//! Negative results the operator can act on (bad input, no reference row) are
//! answered with 200 so scan clients read the body instead of failing on the
//! status. Only store failures use server error statuses.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use imd_common::part_code::PartCodeError;
use imd_common::StoreUnavailable;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Request-level failures
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing, blank or malformed request field
    #[error("{0}")]
    InvalidInput(String),

    /// No reference row for the requested key
    #[error("{0}")]
    NotFound(String),

    /// No store profile could be reached
    #[error("{0}")]
    StoreUnavailable(String),

    /// Query or write failed on a reachable store
    #[error("{0}")]
    Store(String),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::InvalidInput(_) => (StatusCode::OK, "invalid_input"),
            ApiError::NotFound(_) => (StatusCode::OK, "not_found"),
            ApiError::StoreUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable"),
            ApiError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "store_error"),
        }
    }
}

/// Failure response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            error!("Request failed ({}): {}", code, self);
        }

        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<imd_common::Error> for ApiError {
    fn from(err: imd_common::Error) -> Self {
        use imd_common::Error;

        match err {
            Error::InvalidInput(msg) => ApiError::InvalidInput(msg),
            Error::StoreUnavailable(e) => e.into(),
            other => ApiError::Store(other.to_string()),
        }
    }
}

impl From<StoreUnavailable> for ApiError {
    fn from(err: StoreUnavailable) -> Self {
        ApiError::StoreUnavailable(err.to_string())
    }
}

impl From<PartCodeError> for ApiError {
    fn from(err: PartCodeError) -> Self {
        ApiError::InvalidInput(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidInput(format!("Invalid JSON body: {}", rejection.body_text()))
    }
}

/// API result type
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::InvalidInput("x".into()).status_and_code(),
            (StatusCode::OK, "invalid_input")
        );
        assert_eq!(
            ApiError::NotFound("x".into()).status_and_code(),
            (StatusCode::OK, "not_found")
        );
        assert_eq!(
            ApiError::StoreUnavailable("x".into()).status_and_code().0,
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::Store("x".into()).status_and_code().0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_common_errors_map_by_kind() {
        let err: ApiError = imd_common::Error::InvalidInput("line is required".into()).into();
        assert!(matches!(err, ApiError::InvalidInput(ref m) if m == "line is required"));

        let err: ApiError = imd_common::Error::Config("boom".into()).into();
        assert!(matches!(err, ApiError::Store(_)));

        let err: ApiError = imd_common::Error::StoreUnavailable(StoreUnavailable {
            attempted: 1,
            last_profile: "primary".into(),
            last_error: "unable to open database file".into(),
        })
        .into();
        assert!(matches!(err, ApiError::StoreUnavailable(ref m) if m.contains("primary")));
    }

    #[test]
    fn test_part_code_error_is_input_error() {
        let err: ApiError = PartCodeError::Empty.into();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }
}
