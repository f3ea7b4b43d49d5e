//! Request-scoped caller identity.
//!
//! Identity is established by the upstream auth layer and forwarded in headers.
//! Handlers receive it as an explicit [`RequestContext`] and thread it through
//! tenant and permission checks; nothing reads the headers ad hoc.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};

use crate::app::{domain::UserId, error::AppError};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const SESSION_ID_HEADER: &str = "x-session-id";

/// Authenticated caller for the current request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub user_id: UserId,
    /// Forwarded for correlation only; never validated here.
    pub session_id: Option<String>,
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

impl RequestContext {
    /// Build the context from forwarded identity headers.
    /// Missing or malformed `x-user-id` is `Unauthorized`.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, AppError> {
        let raw = header_str(headers, USER_ID_HEADER).ok_or(AppError::Unauthorized)?;
        let user_id = UserId::from_string(raw).map_err(|_| AppError::Unauthorized)?;
        let session_id = header_str(headers, SESSION_ID_HEADER).map(str::to_string);
        Ok(Self { user_id, session_id })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ctx = Self::from_headers(&parts.headers)?;
        tracing::Span::current().record("user_id", tracing::field::display(&ctx.user_id));
        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn missing_user_header_is_unauthorized() {
        let headers = HeaderMap::new();
        assert!(matches!(
            RequestContext::from_headers(&headers),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn blank_or_malformed_user_header_is_unauthorized() {
        for value in ["", "   ", "not-a-ulid"] {
            let mut headers = HeaderMap::new();
            headers.insert(USER_ID_HEADER, HeaderValue::from_static(value));
            assert!(RequestContext::from_headers(&headers).is_err(), "{value:?}");
        }
    }

    #[test]
    fn reads_user_and_session() {
        let user_id = UserId::new();
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_str(&user_id.as_str()).unwrap());
        headers.insert(SESSION_ID_HEADER, HeaderValue::from_static("sess-1"));

        let ctx = RequestContext::from_headers(&headers).unwrap();
        assert_eq!(ctx.user_id, user_id);
        assert_eq!(ctx.session_id.as_deref(), Some("sess-1"));
    }
}
