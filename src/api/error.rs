//! API Error Types
//!
//! Defines error types for the API layer and implements conversion
//! to HTTP responses with appropriate status codes.

use crate::analysis::AnalysisError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not enough symptom data to analyze
    #[error("{0}")]
    Analysis(#[from] AnalysisError),

    /// Storage layer error
    #[error("Storage error: {0}")]
    Storage(#[from] crate::storage::StorageError),

    /// Recommendation service failed
    #[error("Recommendation failed: {0}")]
    Recommendation(#[from] crate::recommend::RecommendError),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Service unavailable (dependency down)
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// HTTP status and machine-readable code
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::Analysis(AnalysisError::NoData) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "NO_SYMPTOM_DATA")
            }
            ApiError::Analysis(AnalysisError::InsufficientSeries { .. }) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "INSUFFICIENT_DATA")
            }
            ApiError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
            ApiError::Recommendation(_) => (StatusCode::BAD_GATEWAY, "RECOMMENDATION_FAILED"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::ServiceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
            }
            ApiError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
        }
    }
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
    pub request_id: String,
}

/// Error details
#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let request_id = uuid::Uuid::new_v4().to_string();

        // Data conditions are expected outcomes, not failures
        if status.is_server_error() {
            tracing::error!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "API error occurred"
            );
        } else {
            tracing::debug!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "Request rejected"
            );
        }

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: self.to_string(),
            },
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommend::RecommendError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::Validation("bad".into()), 400, "VALIDATION_ERROR"),
            (ApiError::Analysis(AnalysisError::NoData), 422, "NO_SYMPTOM_DATA"),
            (
                ApiError::Analysis(AnalysisError::InsufficientSeries { found: 1 }),
                422,
                "INSUFFICIENT_DATA",
            ),
            (
                ApiError::Recommendation(RecommendError::Timeout),
                502,
                "RECOMMENDATION_FAILED",
            ),
            (ApiError::ServiceUnavailable("db".into()), 503, "SERVICE_UNAVAILABLE"),
        ];

        for (error, status, code) in cases {
            let (actual_status, actual_code) = error.status_and_code();
            assert_eq!(actual_status.as_u16(), status);
            assert_eq!(actual_code, code);
        }
    }

    #[test]
    fn test_analysis_message_passes_through() {
        let error = ApiError::from(AnalysisError::NoData);
        assert_eq!(error.to_string(), "No symptom data");
    }
}
