use actix_web::{error, http::StatusCode, HttpRequest, HttpResponse, ResponseError};
use thiserror::Error;

use crate::core::CoreError;
use crate::models::ErrorResponse;

/// Errors returned by HTTP handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("{message}")]
    Payload { error: &'static str, message: String },
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::Core(CoreError::NotFound(_)) => "not_found",
            ApiError::Core(CoreError::InvalidArgument(_)) => "invalid_argument",
            ApiError::Core(CoreError::AlreadyExists(_)) => "already_exists",
            ApiError::Core(CoreError::InvalidState(_)) => "invalid_state",
            ApiError::Core(CoreError::Store(_)) => "internal_error",
            ApiError::Validation(_) => "validation_failed",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::Payload { error, .. } => *error,
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Core(CoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Core(CoreError::InvalidArgument(_)) => StatusCode::BAD_REQUEST,
            ApiError::Core(CoreError::AlreadyExists(_)) => StatusCode::CONFLICT,
            ApiError::Core(CoreError::InvalidState(_)) => StatusCode::CONFLICT,
            ApiError::Core(CoreError::Store(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Validation(_) | ApiError::Payload { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = match self {
            ApiError::Core(CoreError::Store(e)) => {
                tracing::error!("Store failure: {}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(status).json(ErrorResponse {
            error: self.code().to_string(),
            message,
            status_code: status.as_u16(),
        })
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &HttpRequest) -> error::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    ApiError::Payload {
        error: "invalid_json",
        message: format!("Invalid JSON: {}", err),
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &HttpRequest) -> error::Error {
    ApiError::Payload {
        error: "invalid_query",
        message: format!("Invalid query: {}", err),
    }
    .into()
}

/// Handle malformed path segments such as a non-numeric id
pub fn handle_path_error(err: error::PathError, _req: &HttpRequest) -> error::Error {
    ApiError::Payload {
        error: "invalid_path",
        message: format!("Invalid path: {}", err),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::StoreError;

    #[test]
    fn test_core_errors_map_to_distinct_statuses() {
        let cases = [
            (ApiError::from(CoreError::not_found("x")), StatusCode::NOT_FOUND),
            (ApiError::from(CoreError::invalid_argument("x")), StatusCode::BAD_REQUEST),
            (ApiError::from(CoreError::already_exists("x")), StatusCode::CONFLICT),
            (ApiError::from(CoreError::invalid_state("x")), StatusCode::CONFLICT),
            (
                ApiError::from(CoreError::Store(StoreError::Corrupt("x".into()))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(error.status_code(), status);
        }
    }

    #[test]
    fn test_invalid_state_and_already_exists_have_distinct_codes() {
        assert_eq!(ApiError::from(CoreError::invalid_state("x")).code(), "invalid_state");
        assert_eq!(ApiError::from(CoreError::already_exists("x")).code(), "already_exists");
    }
}
