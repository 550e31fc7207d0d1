//! Mapping of pipeline errors onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tunegrab_core::PipelineError;

/// Error body returned by every endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Stable snake_case error kind.
    pub kind: String,
}

/// An error that renders as a JSON response.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorResponse {
                error: message.into(),
                kind: "invalid_request".to_string(),
            },
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        let status = match &e {
            PipelineError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            PipelineError::AlreadyRegistered { .. } => StatusCode::CONFLICT,
            PipelineError::NoItemsFound => StatusCode::NOT_FOUND,
            PipelineError::Extraction(_) => StatusCode::BAD_GATEWAY,
            PipelineError::Cancelled => StatusCode::CONFLICT,
            PipelineError::Transcode(_)
            | PipelineError::FileLocation { .. }
            | PipelineError::Io(_)
            | PipelineError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        Self {
            status,
            body: ErrorResponse {
                error: e.user_message(),
                kind: e.kind().to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
