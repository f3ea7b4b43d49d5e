use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sqlx::Error as SqlxError;

/// Application error type for unified error handling across the app.
///
/// Rendered as `{ "message": ..., "code": ... }` with the matching status.
#[derive(Debug)]
pub enum AppError {
    /// No caller identity on the request (401).
    Unauthorized,

    /// Organization or resource absent (404).
    NotFound(String),

    /// Caller lacks the required membership or role (403).
    Forbidden(String),

    /// Invalid input data (400).
    Validation(String),

    /// Request conflicts with current state, e.g. duplicate slug (409).
    Conflict(String),

    /// Database errors (500). Logged, never echoed to the client.
    Database(SqlxError),

    /// Generic internal errors (500).
    Internal,
}

impl AppError {
    /// Machine-readable code sent to clients.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Database(_) | AppError::Internal => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn forbidden() -> Self {
        AppError::Forbidden("Insufficient permissions".to_string())
    }

    pub fn invalid_input() -> Self {
        AppError::Validation("Invalid input".to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Unauthorized => f.write_str("Unauthorized"),
            AppError::NotFound(msg)
            | AppError::Forbidden(msg)
            | AppError::Validation(msg)
            | AppError::Conflict(msg) => f.write_str(msg),
            AppError::Database(_) | AppError::Internal => f.write_str("Internal server error"),
        }
    }
}

impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(%rejection, "rejected JSON body");
        AppError::invalid_input()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Database(err) => tracing::error!(%err, "database error"),
            AppError::Internal => tracing::error!("internal error"),
            _ => {}
        }

        let body = Json(json!({
            "message": self.to_string(),
            "code": self.code(),
        }));

        (self.status(), body).into_response()
    }
}

/// True when a database error is a UNIQUE/PRIMARY KEY violation.
pub fn is_unique_violation(err: &SqlxError) -> bool {
    err.as_database_error()
        .map_or(false, |db_err| db_err.is_unique_violation())
}
