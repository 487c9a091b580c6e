//! SMS Manager API library.
//!
//! A REST service that stores contacts and SMS messages behind JWT bearer
//! authentication and simulates message delivery in the background. The
//! router is exposed as a library so it can be driven directly in tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod validation;

pub use routes::app;
pub use state::AppState;
