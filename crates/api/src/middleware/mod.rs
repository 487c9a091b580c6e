//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transaction per request)
//! 2. `TraceLayer` (`http_request` span)
//! 3. Request ID (read or generate `x-request-id`)
//! 4. CORS
//! 5. Bearer auth (protected `/v1` routes only, via `route_layer`)

pub mod auth;
pub mod request_id;

pub use auth::{CurrentUser, require_auth};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
