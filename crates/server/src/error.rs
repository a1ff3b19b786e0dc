use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use quizsift_core::SessionError;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Session protocol misuse; the message is meant for the user.
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::Session(SessionError::NoSession) => "NO_SESSION",
            ApiError::Session(SessionError::EmptySubmission) => "EMPTY_SUBMISSION",
            ApiError::Session(SessionError::NoPendingUrls) => "NO_PENDING_URLS",
            ApiError::Session(SessionError::NoValidUrls { .. }) => "NO_VALID_URLS",
            ApiError::Session(SessionError::AlreadyProcessing) => "ALREADY_PROCESSING",
            ApiError::Session(SessionError::NotProcessing) => "NOT_PROCESSING",
            ApiError::Session(SessionError::InvalidPhase { .. }) => "INVALID_PHASE",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Session(_) => StatusCode::CONFLICT,
        };
        tracing::debug!(error = %self, "request rejected");

        let body = ErrorBody { error: ErrorDetail { code: self.code(), message: self.to_string() } };
        (status, Json(body)).into_response()
    }
}
