//! HTTP error handling
//!
//! Every failure leaves the server as the same JSON body, with the status
//! derived from the machine-readable code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use orgtree_core::{ErrorKind, NodeServiceError, ValidationError};
use serde::{Deserialize, Serialize};

/// HTTP error response body
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpError {
    /// User-facing error message
    pub message: String,
    /// Machine-readable error code
    pub code: String,
    /// Optional detailed error information for debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl HttpError {
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: None,
        }
    }

    pub fn with_details(
        message: impl Into<String>,
        code: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: Some(details.into()),
        }
    }

    pub fn not_found() -> Self {
        Self::new("Not found", "NOT_FOUND")
    }

    pub fn rate_limited() -> Self {
        Self::new("Too many requests. Please try again later.", "RATE_LIMITED")
    }

    pub fn status(&self) -> StatusCode {
        match self.code.as_str() {
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "INVALID_OPERATION" | "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "RATE_LIMITED" => StatusCode::TOO_MANY_REQUESTS,
            "UNAVAILABLE" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<ValidationError> for HttpError {
    fn from(err: ValidationError) -> Self {
        HttpError::new(err.to_string(), "VALIDATION_ERROR")
    }
}

impl From<NodeServiceError> for HttpError {
    fn from(err: NodeServiceError) -> Self {
        match err.kind() {
            ErrorKind::NotFound => HttpError::new(err.to_string(), "NOT_FOUND"),
            ErrorKind::InvalidOperation => HttpError::new(err.to_string(), "INVALID_OPERATION"),
            ErrorKind::ValidationFailed => HttpError::new(err.to_string(), "VALIDATION_ERROR"),
            ErrorKind::Unavailable => {
                // Store internals stay in the logs and the details field
                tracing::error!("Request failed on the store: {}", err);
                HttpError::with_details(
                    "Service temporarily unavailable",
                    "UNAVAILABLE",
                    format!("{:?}", err),
                )
            }
        }
    }
}
