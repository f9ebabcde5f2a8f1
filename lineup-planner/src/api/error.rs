//! API error type
//!
//! Every handler error becomes `{"error": {"code", "message"}}` with a status
//! derived from the underlying failure.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::warn;

use crate::planner::PlannerError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Planner rejection or labelled store failure
    #[error(transparent)]
    Planner(#[from] PlannerError),

    /// Store error outside a planner session
    #[error(transparent)]
    Common(#[from] lineup_common::Error),
}

fn classify(err: &lineup_common::Error) -> (StatusCode, &'static str) {
    match err {
        lineup_common::Error::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        lineup_common::Error::InvalidInput(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR"),
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        self.parts().0
    }

    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Planner(PlannerError::Validation(_)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
            }
            ApiError::Planner(PlannerError::Overlap(_)) => (StatusCode::CONFLICT, "SCHEDULE_OVERLAP"),
            ApiError::Planner(PlannerError::Store { source, .. }) => classify(source),
            ApiError::Common(err) => classify(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.parts();
        let message = match &self {
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) => msg.clone(),
            other => other.to_string(),
        };

        if status.is_server_error() {
            warn!("Request failed ({}): {}", status, message);
        }

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::Operation;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (PlannerError::Validation("blank".into()).into(), StatusCode::BAD_REQUEST),
            (PlannerError::Overlap("clash".into()).into(), StatusCode::CONFLICT),
            (
                PlannerError::store(
                    Operation::MoveArtist,
                    lineup_common::Error::NotFound("Assignment".into()),
                )
                .into(),
                StatusCode::NOT_FOUND,
            ),
            (
                PlannerError::store(
                    Operation::AssignArtist,
                    lineup_common::Error::Internal("boom".into()),
                )
                .into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                lineup_common::Error::InvalidInput("no venue".into()).into(),
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.status(), expected, "{}", err);
        }
    }

    #[test]
    fn test_store_failure_message_keeps_label() {
        let err: ApiError = PlannerError::store(
            Operation::MoveArtist,
            lineup_common::Error::Internal("boom".into()),
        )
        .into();

        assert_eq!(err.to_string(), "Failed to move artist: Internal error: boom");
    }
}
