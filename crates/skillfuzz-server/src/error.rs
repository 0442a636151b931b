//! HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use skillfuzz_core::FuzzyError;

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: String,
}

/// An error on its way back to the client.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ErrorBody {
                error: message.into(),
                kind: "internal".to_string(),
            },
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

/// Request errors are the caller's problem (422); anything else means the
/// loaded pipeline is broken (500).
impl From<FuzzyError> for ApiError {
    fn from(err: FuzzyError) -> Self {
        let status = if err.is_request_error() {
            tracing::debug!(kind = err.kind(), "rejected request: {err}");
            StatusCode::UNPROCESSABLE_ENTITY
        } else {
            tracing::error!(kind = err.kind(), "pipeline failure: {err}");
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self {
            status,
            body: ErrorBody {
                error: err.to_string(),
                kind: err.kind().to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_errors_map_to_422() {
        assert_eq!(
            ApiError::from(FuzzyError::NoTopics).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::from(FuzzyError::DegenerateAggregate("adjusted_score".into())).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn configuration_errors_map_to_500() {
        let err = ApiError::from(FuzzyError::MissingInput("penalty".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.body.kind, "missing_input");
    }
}
