//! Unified error handling for the API.
//!
//! Every failure leaves the service as
//! `{"statusCode": …, "error": "<reason phrase>", "message": …, "details"?: {…}}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::AuthError;
use crate::validation::FieldErrors;

/// Message returned with every validation failure.
pub const VALIDATION_FAILED: &str = "This request cannot be completed due to invalid input";

/// Message returned for server-side failures.
pub const INTERNAL_ERROR: &str = "An internal server error occurred";

/// Everything a handler can fail with.
///
/// `Database` and `Internal` are reported to Sentry and hidden from the
/// client behind [`INTERNAL_ERROR`].
#[derive(Debug, Error)]
pub enum AppError {
    #[error("repository: {0}")]
    Database(#[from] RepositoryError),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("invalid input: {0:?}")]
    Validation(FieldErrors),

    #[error("internal: {0}")]
    Internal(String),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody<'a> {
    status_code: u16,
    error: &'static str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a FieldErrors>,
}

impl AppError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::BadRequest(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    /// Message safe to show to clients.
    fn public_message(&self) -> &str {
        match self {
            Self::Database(_) | Self::Internal(_) => INTERNAL_ERROR,
            Self::Validation(_) => VALIDATION_FAILED,
            Self::NotFound(m)
            | Self::Unauthorized(m)
            | Self::Conflict(m)
            | Self::BadRequest(m)
            | Self::PayloadTooLarge(m) => m,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(self, Self::Database(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "request failed"
            );
        }

        let status = self.status();
        let details = match &self {
            Self::Validation(fields) => Some(fields),
            _ => None,
        };
        let body = ErrorBody {
            status_code: status.as_u16(),
            error: status.canonical_reason().unwrap_or("Error"),
            message: self.public_message(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => Self::Unauthorized("Invalid credentials".to_owned()),
            AuthError::MissingToken => Self::Unauthorized("Missing authentication".to_owned()),
            AuthError::InvalidToken => Self::Unauthorized("Invalid token".to_owned()),
            AuthError::UserAlreadyExists => Self::Conflict("User already exists".to_owned()),
            AuthError::WeakPassword(msg) => Self::BadRequest(msg),
            AuthError::Repository(e) => Self::Database(e),
            e @ (AuthError::TokenSigning(_) | AuthError::PasswordHash) => {
                Self::Internal(e.to_string())
            }
        }
    }
}

/// Set the Sentry user context from an authenticated user.
pub fn set_sentry_user(user_id: i32, email: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: Some(email.to_owned()),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;
    use serde_json::Value;

    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_client_errors_display_their_message() {
        let err = AppError::NotFound("Contact does not exist".to_owned());
        assert_eq!(err.to_string(), "Contact does not exist");
        assert_eq!(err.public_message(), "Contact does not exist");
    }

    #[test]
    fn test_server_errors_hide_detail() {
        let err = AppError::Internal("pool exhausted".to_owned());
        assert_eq!(err.to_string(), "internal: pool exhausted");
        assert_eq!(err.public_message(), INTERNAL_ERROR);
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::NotFound(String::new()), StatusCode::NOT_FOUND),
            (AppError::Unauthorized(String::new()), StatusCode::UNAUTHORIZED),
            (AppError::Conflict(String::new()), StatusCode::CONFLICT),
            (AppError::BadRequest(String::new()), StatusCode::BAD_REQUEST),
            (AppError::PayloadTooLarge(String::new()), StatusCode::PAYLOAD_TOO_LARGE),
            (AppError::Validation(FieldErrors::default()), StatusCode::BAD_REQUEST),
            (AppError::Internal(String::new()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(err.status(), expected, "{err:?}");
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let (status, body) = body_json(AppError::Conflict(
            "This contact already exists".to_string(),
        ))
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["statusCode"], 409);
        assert_eq!(body["error"], "Conflict");
        assert_eq!(body["message"], "This contact already exists");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_validation_body_has_details() {
        let mut fields = FieldErrors::default();
        fields.push("email", "\"email\" must be a valid email");
        let (_, body) = body_json(AppError::Validation(fields)).await;

        assert_eq!(body["error"], "Bad Request");
        assert_eq!(body["message"], VALIDATION_FAILED);
        assert_eq!(body["details"]["email"][0], "\"email\" must be a valid email");
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let (_, body) = body_json(AppError::Internal("pool exhausted".to_string())).await;

        assert_eq!(body["error"], "Internal Server Error");
        assert_eq!(body["message"], INTERNAL_ERROR);
        assert!(!body.to_string().contains("pool exhausted"));
    }

    #[test]
    fn test_auth_error_mapping() {
        let err: AppError = AuthError::MissingToken.into();
        assert!(matches!(err, AppError::Unauthorized(ref m) if m == "Missing authentication"));

        let err: AppError = AuthError::InvalidToken.into();
        assert!(matches!(err, AppError::Unauthorized(ref m) if m == "Invalid token"));

        let err: AppError = AuthError::InvalidCredentials.into();
        assert!(matches!(err, AppError::Unauthorized(ref m) if m == "Invalid credentials"));
    }
}
