//! Test harness driving the real router over in-memory stores.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p sms-manager-integration-tests
//! ```
//!
//! No database is needed: [`TestApp`] wires the production router, auth
//! service and delivery worker to a [`MemoryStore`] seeded with one admin.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::time::Duration;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use jsonwebtoken::Algorithm;
use secrecy::SecretString;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use tower_http::normalize_path::NormalizePath;

use sms_manager_api::config::JwtConfig;
use sms_manager_api::db::{MemoryStore, Stores};
use sms_manager_api::services::auth::create_user;
use sms_manager_api::services::{AuthService, DeliverySimulator, TokenService};
use sms_manager_api::{AppState, app};
use sms_manager_core::{Email, PersonName};

pub const ADMIN_EMAIL: &str = "admin@sms.dev";
pub const ADMIN_PASSWORD: &str = "correct horse battery";

/// JWT settings shared by the app and tests that forge tokens.
#[must_use]
pub fn jwt_config() -> JwtConfig {
    JwtConfig {
        secret: SecretString::from("q7$Lm2!xV9@rT4#nB8^kW1&zP5*cH3%d"),
        issuer: "sms-manager".to_owned(),
        audience: "sms-clients".to_owned(),
        algorithm: Algorithm::HS256,
        ttl: Duration::from_secs(3600),
    }
}

/// A decoded response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// JSON body, or the raw text as a JSON string when it isn't JSON.
    pub body: Value,
}

/// A running application instance.
pub struct TestApp {
    pub store: MemoryStore,
    /// Bearer token for the seeded admin.
    pub token: String,
    app: NormalizePath<Router>,
    cancel: CancellationToken,
}

impl TestApp {
    /// Spawn with a 1 ms delivery page.
    pub async fn spawn() -> Self {
        Self::spawn_with_page(Duration::from_millis(1)).await
    }

    pub async fn spawn_with_page(page: Duration) -> Self {
        let store = MemoryStore::new();
        let stores = Stores::in_memory(&store);

        create_user(
            stores.users.as_ref(),
            PersonName::parse("Admin").unwrap(),
            Some(PersonName::parse("Admin").unwrap()),
            Email::parse(ADMIN_EMAIL).unwrap(),
            ADMIN_PASSWORD,
        )
        .await
        .unwrap();

        let auth = AuthService::new(stores.users.clone(), TokenService::new(&jwt_config()));
        let token = auth
            .signin(&Email::parse(ADMIN_EMAIL).unwrap(), ADMIN_PASSWORD)
            .await
            .unwrap()
            .token;

        let cancel = CancellationToken::new();
        let (delivery, _worker) =
            DeliverySimulator::spawn(stores.messages.clone(), page, cancel.clone());

        Self {
            store,
            token,
            app: app(AppState::new(stores, auth, delivery)),
            cancel,
        }
    }

    /// Send a request with an optional JSON body and bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<&Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        self.send(builder.body(body).unwrap()).await
    }

    /// Send a prepared request.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None, Some(self.token.as_str())).await
    }

    pub async fn post(&self, uri: &str, body: &Value) -> TestResponse {
        self.request(Method::POST, uri, Some(body), Some(self.token.as_str()))
            .await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.request(Method::DELETE, uri, None, Some(self.token.as_str()))
            .await
    }

    /// Create a contact and return its JSON.
    pub async fn create_contact(&self, firstname: &str, number: &str) -> Value {
        let response = self
            .post(
                "/v1/contacts",
                &serde_json::json!({ "firstname": firstname, "number": number }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["data"].clone()
    }

    /// Poll a message until it leaves `pending`, returning its final JSON.
    pub async fn wait_for_delivery(&self, id: i64) -> Value {
        let uri = format!("/v1/messages/{id}");
        for _ in 0..200 {
            let response = self.get(&uri).await;
            if response.body["data"]["status"] != "pending" {
                return response.body["data"].clone();
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("message {id} never left pending");
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
