//! Error → HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::Message;
use crate::Error;

impl Error {
    /// Returns the HTTP status code for this error.
    ///
    /// - NotFound: 404 Not Found
    /// - Conflict: 409 Conflict (participant in the wrong state)
    /// - WriteConflict / WriteFailed: 410 Gone (the transition did not persist)
    /// - InvalidInput: 400 Bad Request
    /// - StoreFailure / MalformedOrigin / Io: 500 Internal Server Error
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::WriteConflict { .. } | Self::WriteFailed(_) => StatusCode::GONE,
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::StoreFailure(_) | Self::MalformedOrigin { .. } | Self::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            Self::Conflict(conflict) => conflict.message().to_string(),
            Self::NotFound { .. } | Self::WriteConflict { .. } | Self::InvalidInput(_) => {
                self.to_string()
            }
            Self::WriteFailed(_) => {
                tracing::error!(error = %self, "write failed");
                "Write failed".to_string()
            }
            Self::StoreFailure(_) | Self::MalformedOrigin { .. } | Self::Io(_) => {
                tracing::error!(error = %self, "request failed");
                "Internal server error".to_string()
            }
        };

        (status, Json(Message { message })).into_response()
    }
}
