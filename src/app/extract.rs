use axum::extract::FromRequest;

use crate::app::error::AppError;

/// JSON body extractor whose rejection renders as an [`AppError`] instead of
/// axum's plain-text response.
///
/// Handlers that check access take `Result<ApiJson<T>, AppError>` and unwrap it
/// after the tenant and permission checks, so a bad body never masks a 404 or 403.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);
