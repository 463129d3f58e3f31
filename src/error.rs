#[cfg(feature = "rest-api")]
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
#[cfg(feature = "rest-api")]
use serde_json::json;
use thiserror::Error;

use crate::link::LinkError;

/// A specialized `Result` type for REST handlers.
pub type AppResult<T> = Result<T, AppError>;

/// Errors surfaced to HTTP clients.
#[derive(Debug, Error)]
pub enum AppError {
    /// A link operation failed.
    #[error(transparent)]
    Link(#[from] LinkError),

    /// A required query parameter was absent or empty.
    #[error("Query parameter '{0}' is required")]
    MissingParameter(&'static str),

    /// The device did not confirm the token.
    #[error("Invalid Token")]
    InvalidToken,
}

impl AppError {
    /// Stable error type name for response bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Link(e) => e.kind(),
            Self::MissingParameter(_) => "MissingParameter",
            Self::InvalidToken => "InvalidToken",
        }
    }

    /// HTTP status code for this error.
    #[cfg(feature = "rest-api")]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingParameter(_) => StatusCode::BAD_REQUEST,
            Self::InvalidToken => StatusCode::FORBIDDEN,
            Self::Link(LinkError::InvalidArgument(_)) => StatusCode::BAD_REQUEST,
            Self::Link(LinkError::DeviceNotFound) => StatusCode::NOT_FOUND,
            Self::Link(
                LinkError::NotConnected
                | LinkError::Io(_)
                | LinkError::Enumeration(_)
                | LinkError::Worker(_),
            ) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Allows Axum to convert `AppError` into an HTTP response.
#[cfg(feature = "rest-api")]
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = axum::Json(json!({
            "status": "error",
            "error": { "type": self.kind(), "message": self.to_string() }
        }));
        (status, body).into_response()
    }
}
