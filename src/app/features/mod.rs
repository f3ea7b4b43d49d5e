pub mod activity;
pub mod members;
pub mod metrics;
pub mod organizations;
pub mod workspaces;

use time::OffsetDateTime;
use validator::Validate;

use crate::app::{domain::timestamp, error::AppError};

/// Stored unix seconds to a datetime for JSON responses.
pub(crate) fn datetime(ts: i64) -> Result<OffsetDateTime, AppError> {
    timestamp::from_unix(ts).ok_or(AppError::Internal)
}

/// Run `validator` rules, collapsing any failure into a 400.
pub(crate) fn validate_request<T: Validate>(request: &T) -> Result<(), AppError> {
    request.validate().map_err(|errors| {
        tracing::debug!(%errors, "request failed validation");
        AppError::invalid_input()
    })
}

/// Map a `&'static str` validation message into a 400.
pub(crate) fn invalid(message: &'static str) -> AppError {
    AppError::Validation(message.to_string())
}
