//! Bearer token authentication.
//!
//! [`require_auth`] guards the protected `/v1` routes. It resolves the token
//! to an [`Identity`] and stores it in request extensions, where handlers
//! pick it up with the [`CurrentUser`] extractor.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::error::{AppError, set_sentry_user};
use crate::services::{AuthError, Identity};
use crate::state::AppState;

/// Pull the token out of an `Authorization: Bearer <token>` header.
///
/// # Errors
///
/// Returns `AuthError::MissingToken` when the header is absent or not a
/// bearer credential.
pub fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingToken)?;

    let (scheme, token) = header.split_once(' ').ok_or(AuthError::MissingToken)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MissingToken);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}

/// Reject the request unless it carries a valid bearer token.
///
/// # Errors
///
/// 401 "Missing authentication" without a token, 401 "Invalid token" when
/// the token fails validation or its user no longer exists.
pub async fn require_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = request.into_parts();

    let token = bearer_token(&parts)?;
    let identity = state.auth().authenticate(token).await?;

    set_sentry_user(identity.user_id.as_i32(), identity.email.as_str());
    tracing::Span::current().record("user_id", identity.user_id.as_i32());

    parts.extensions.insert(identity);
    Ok(next.run(Request::from_parts(parts, body)).await)
}

/// Extractor for the identity resolved by [`require_auth`].
///
/// ```rust,ignore
/// async fn handler(CurrentUser(me): CurrentUser) -> String {
///     me.email.to_string()
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(Self)
            .ok_or_else(|| AuthError::MissingToken.into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/v1/contacts");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_extracted() {
        let parts = parts_with(Some("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&parts).unwrap(), "abc.def.ghi");

        let parts = parts_with(Some("bearer   abc.def.ghi "));
        assert_eq!(bearer_token(&parts).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_bearer_token_missing() {
        for header in [None, Some("Basic dXNlcjpwYXNz"), Some("Bearer"), Some("Bearer   ")] {
            assert!(matches!(
                bearer_token(&parts_with(header)),
                Err(AuthError::MissingToken)
            ));
        }
    }
}
