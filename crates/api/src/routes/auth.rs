//! Sign-in route.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use sms_manager_core::Email;

use crate::error::AppError;
use crate::models::UserProfile;
use crate::services::auth::MIN_PASSWORD_LENGTH;
use crate::state::AppState;
use crate::validation::{Field, Rule, Schema, Validate, ValidatedJson};

/// Sign-in request body.
#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    pub email: Email,
    pub password: String,
}

impl Validate for SigninRequest {
    const SCHEMA: Schema = Schema {
        fields: &[
            Field::required("email", &[Rule::Email]),
            Field::required("password", &[Rule::MinLength(MIN_PASSWORD_LENGTH)]),
        ],
    };
}

/// Sign-in response body. Unlike other routes the token sits beside `data`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SigninResponse {
    pub status_code: u16,
    pub data: UserProfile,
    pub token: String,
}

/// POST /v1/auth/signin
pub async fn signin(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<SigninRequest>,
) -> Result<Json<SigninResponse>, AppError> {
    let signed_in = state.auth().signin(&req.email, &req.password).await?;

    Ok(Json(SigninResponse {
        status_code: StatusCode::OK.as_u16(),
        data: signed_in.user,
        token: signed_in.token,
    }))
}
