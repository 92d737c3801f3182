//! Application error type rendered as the failure envelope.
//!
//! Every handler returns `Result<_, AppError>`. An `AppError` carries the HTTP
//! status, a machine-readable code, the underlying [`anyhow::Error`] and an
//! optional list of per-field validation failures. It renders as:
//!
//! ```json
//! { "success": false, "error": { "code": "NOT_FOUND", "message": "Thread not found" } }
//! ```
//!
//! Server errors (5xx) pass the underlying message through. The rest of the
//! error chain is only attached when [`set_expose_error_chain`] was called with
//! `true`, which the binary does outside production.

use std::borrow::Cow;
use std::sync::OnceLock;

use anyhow::{Error, anyhow};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::response::{ApiResponse, ErrorBody};

static EXPOSE_ERROR_CHAIN: OnceLock<bool> = OnceLock::new();

/// Enables or disables the error chain in 5xx responses. Only the first call wins.
pub fn set_expose_error_chain(expose: bool) {
    let _ = EXPOSE_ERROR_CHAIN.set(expose);
}

fn expose_error_chain() -> bool {
    EXPOSE_ERROR_CHAIN.get().copied().unwrap_or(false)
}

/// Machine-readable error codes used in the failure envelope.
pub mod codes {
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const FORBIDDEN: &str = "FORBIDDEN";
    pub const TWO_FACTOR_REQUIRED: &str = "TWO_FACTOR_REQUIRED";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const CONFLICT: &str = "CONFLICT";
    pub const RATE_LIMITED: &str = "RATE_LIMITED";
    pub const SERVICE_UNAVAILABLE: &str = "SERVICE_UNAVAILABLE";
    pub const INTERNAL_SERVER_ERROR: &str = "INTERNAL_SERVER_ERROR";
}

/// A single failing input field, e.g. `body.title`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub code: Cow<'static, str>,
    pub error: Error,
    pub details: Vec<FieldError>,
}

fn default_code(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => codes::BAD_REQUEST,
        StatusCode::UNAUTHORIZED => codes::UNAUTHORIZED,
        StatusCode::FORBIDDEN => codes::FORBIDDEN,
        StatusCode::NOT_FOUND => codes::NOT_FOUND,
        StatusCode::CONFLICT => codes::CONFLICT,
        StatusCode::UNPROCESSABLE_ENTITY => codes::VALIDATION_ERROR,
        StatusCode::TOO_MANY_REQUESTS => codes::RATE_LIMITED,
        StatusCode::SERVICE_UNAVAILABLE => codes::SERVICE_UNAVAILABLE,
        s if s.is_client_error() => codes::BAD_REQUEST,
        _ => codes::INTERNAL_SERVER_ERROR,
    }
}

impl AppError {
    pub fn new<E>(status: StatusCode, err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            status,
            code: Cow::Borrowed(default_code(status)),
            error: err.into(),
            details: Vec::new(),
        }
    }

    /// Replaces the default code derived from the status.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<Cow<'static, str>>) -> Self {
        self.code = code.into();
        self
    }

    /// A 400 `VALIDATION_ERROR` listing every failing field.
    pub fn validation(details: Vec<FieldError>) -> Self {
        let mut err = Self::new(StatusCode::BAD_REQUEST, anyhow!("Validation failed"))
            .with_code(codes::VALIDATION_ERROR);
        err.details = details;
        err
    }

    pub fn internal<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::internal(anyhow!(message.into()))
    }

    pub fn not_found<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::NOT_FOUND, err)
    }

    pub fn bad_request<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::BAD_REQUEST, err)
    }

    pub fn conflict<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::CONFLICT, err)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, anyhow!(message.into()))
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, anyhow!(message.into()))
    }

    pub fn too_many_requests() -> Self {
        Self::new(
            StatusCode::TOO_MANY_REQUESTS,
            anyhow!("Too many requests, please try again later"),
        )
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, anyhow!(message.into()))
    }

    pub fn database<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err)
    }

    pub fn body(&self) -> ErrorBody {
        let details = if !self.details.is_empty() {
            Some(json!(self.details))
        } else if self.status.is_server_error() && expose_error_chain() {
            let chain: Vec<String> = self.error.chain().skip(1).map(|c| c.to_string()).collect();
            (!chain.is_empty()).then(|| json!({ "chain": chain }))
        } else {
            None
        };

        ErrorBody {
            code: self.code.to_string(),
            message: self.error.to_string(),
            details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(code = %self.code, error = ?self.error, "request failed");
        }

        let body = ApiResponse::<()>::failure(self.body());
        (self.status, Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        AppError::internal(err)
    }
}
