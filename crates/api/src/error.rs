//! API error types with HTTP response mapping.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::ApplicationError;
use serde_json::json;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Request body that could not be read as JSON.
    Body(JsonRejection),
    /// Error raised by the application service.
    Application(ApplicationError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            ApiError::Body(rejection) => (
                rejection.status(),
                json!({ "error": rejection.body_text() }),
            ),
            ApiError::Application(err) => application_error_to_response(err),
        };

        (status, axum::Json(body)).into_response()
    }
}

fn application_error_to_response(err: ApplicationError) -> (StatusCode, serde_json::Value) {
    match err {
        ApplicationError::Validation(e) => (
            StatusCode::BAD_REQUEST,
            json!({ "error": e.to_string(), "section": e.section }),
        ),
        ApplicationError::Conflict { message } => {
            (StatusCode::CONFLICT, json!({ "error": message }))
        }
        ApplicationError::Timeout { .. } => (
            StatusCode::GATEWAY_TIMEOUT,
            json!({ "error": "operation timed out" }),
        ),
        ApplicationError::Storage(e) => {
            tracing::error!(error = %e, "internal server error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "internal server error" }),
            )
        }
    }
}

impl From<ApplicationError> for ApiError {
    fn from(err: ApplicationError) -> Self {
        ApiError::Application(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Body(rejection)
    }
}
