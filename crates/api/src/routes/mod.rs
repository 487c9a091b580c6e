//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                - Liveness check
//! GET    /health/ready          - Readiness check (database reachable)
//!
//! # Auth
//! POST   /v1/auth/signin        - Email/password sign-in, returns a JWT
//!
//! # Contacts (bearer token required)
//! POST   /v1/contacts           - Create contact
//! GET    /v1/contacts           - List contacts
//! GET    /v1/contacts/{number}  - Fetch contact
//! DELETE /v1/contacts/{number}  - Delete contact (cascades sent messages)
//!
//! # Messages (bearer token required)
//! POST   /v1/messages           - Create message and schedule delivery
//! GET    /v1/messages           - List messages
//! GET    /v1/messages/{id}      - Fetch message
//! DELETE /v1/messages/{id}      - Delete message
//! ```
//!
//! Anything else answers 404 "Resource not found", whatever the method.

pub mod auth;
pub mod contacts;
pub mod messages;

use std::time::Duration;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Serialize;
use tower::Layer;
use tower_http::cors::CorsLayer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::error::AppError;
use crate::middleware::{request_id_middleware, require_auth};
use crate::state::AppState;

/// Success body: `{"statusCode", "message", "data"?}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub status_code: u16,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// Build a success response carrying `data`.
pub fn respond<T: Serialize>(
    status: StatusCode,
    message: &'static str,
    data: T,
) -> (StatusCode, Json<Envelope<T>>) {
    (
        status,
        Json(Envelope {
            status_code: status.as_u16(),
            message,
            data: Some(data),
        }),
    )
}

/// Build a 200 response with a message only.
pub fn respond_ok(message: &'static str) -> (StatusCode, Json<Envelope<()>>) {
    (
        StatusCode::OK,
        Json(Envelope {
            status_code: StatusCode::OK.as_u16(),
            message,
            data: None,
        }),
    )
}

/// The `/v1` API.
pub fn routes(state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/contacts", post(contacts::create).get(contacts::fetch_all))
        .route(
            "/contacts/{number}",
            get(contacts::fetch).delete(contacts::destroy),
        )
        .route("/messages", post(messages::create).get(messages::fetch_all))
        .route(
            "/messages/{id}",
            get(messages::fetch).delete(messages::destroy),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/auth/signin", post(auth::signin))
        .merge(protected)
        .method_not_allowed_fallback(not_found)
}

/// The full application with every layer applied.
pub fn app(state: AppState) -> NormalizePath<Router> {
    let router = Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/v1", routes(&state))
        .fallback(not_found)
        .method_not_allowed_fallback(not_found)
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        user_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(|response: &axum::http::Response<_>, latency: Duration, span: &Span| {
                    span.record("status", response.status().as_u16());
                    span.record(
                        "latency_ms",
                        u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                    );
                    DefaultOnResponse::default().on_response(response, latency, span);
                }),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    NormalizePathLayer::trim_trailing_slash().layer(router)
}

async fn not_found() -> AppError {
    AppError::NotFound("Resource not found".to_owned())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    match state.stores().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
