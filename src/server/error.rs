use crate::error::{ErrorCode, StructuredError, TrackerError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::error;

/// JSON error body: `{"detail": ..., "code": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
    pub code: String,
}

/// A [`TrackerError`] on its way out of a handler.
#[derive(Debug)]
pub struct ApiError(pub TrackerError);

impl From<TrackerError> for ApiError {
    fn from(err: TrackerError) -> Self {
        Self(err)
    }
}

/// HTTP status for an error code.
#[must_use]
pub const fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::ValidationFailed
        | ErrorCode::InvalidStatus
        | ErrorCode::InvalidPriority
        | ErrorCode::InvalidOrderBy => StatusCode::BAD_REQUEST,
        ErrorCode::TicketNotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict | ErrorCode::DuplicateTitle => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let structured = StructuredError::from_error(&self.0);
        let status = status_for(structured.code);

        if status.is_server_error() {
            error!(code = structured.code.as_str(), error = %self.0, "Request failed");
        }

        let body = ErrorBody {
            detail: structured.message,
            code: structured.code.as_str().to_string(),
        };
        (status, Json(body)).into_response()
    }
}
