//! `sms-manager-api`: the JSON REST service.
//!
//! Users are provisioned out of band with `sms-cli admin`; this binary only
//! signs them in, serves contacts and messages, and runs the delivery
//! simulator in the background. Schema migrations are likewise left to
//! `sms-cli migrate`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::borrow::Cow;
use std::sync::Arc;

use axum::extract::Request;
use sentry::integrations::tracing::{self as sentry_tracing, EventFilter};
use tokio_util::sync::CancellationToken;
use axum::ServiceExt;
use tracing::Level;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use sms_manager_api::config::{ApiConfig, SentryConfig};
use sms_manager_api::db::{self, Stores};
use sms_manager_api::services::{AuthService, DeliverySimulator, TokenService};
use sms_manager_api::{AppState, app};

const DEFAULT_LOG_FILTER: &str = "sms_manager_api=info,tower_http=debug";

/// Start the Sentry client. The guard flushes on drop, so hold it for the
/// life of the process.
fn init_sentry(config: &SentryConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.dsn.as_deref()?;

    let options = sentry::ClientOptions {
        release: sentry::release_name!(),
        environment: config.environment.clone().map(Cow::Owned),
        sample_rate: config.sample_rate,
        traces_sample_rate: config.traces_sample_rate,
        attach_stacktrace: true,
        // Contact records are personal phone numbers
        send_default_pii: false,
        ..Default::default()
    };
    Some(sentry::init((dsn, options)))
}

/// Warnings and errors become Sentry events; info and debug ride along as
/// breadcrumbs.
fn sentry_filter(metadata: &tracing::Metadata<'_>) -> EventFilter {
    let level = *metadata.level();
    if level <= Level::WARN {
        EventFilter::Event
    } else if level <= Level::DEBUG {
        EventFilter::Breadcrumb
    } else {
        EventFilter::Ignore
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let (json_layer, text_layer) = if json {
        (Some(tracing_subscriber::fmt::layer().json().flatten_event(true)), None)
    } else {
        (None, Some(tracing_subscriber::fmt::layer()))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let config = ApiConfig::from_env().expect("invalid configuration");

    // Sentry has to exist before its tracing layer is installed
    let _sentry = init_sentry(&config.sentry);
    init_tracing(config.json_logs);
    if config.sentry.dsn.is_some() {
        tracing::info!("Sentry reporting enabled");
    }

    let pool = db::create_pool(&config.database_url)
        .await
        .expect("could not connect to PostgreSQL");
    let stores = Stores::postgres(pool);
    let auth = AuthService::new(Arc::clone(&stores.users), TokenService::new(&config.jwt));

    let shutdown = CancellationToken::new();
    let (delivery, worker) = DeliverySimulator::spawn(
        Arc::clone(&stores.messages),
        config.delivery_page,
        shutdown.child_token(),
    );

    let router = app(AppState::new(stores, auth, delivery));

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| panic!("cannot listen on {addr}: {e}"));
    tracing::info!(%addr, "sms-manager-api listening");

    axum::serve(listener, ServiceExt::<Request>::into_make_service(router))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server terminated with an error");

    // Deliveries still sleeping are dropped and their rows stay pending
    shutdown.cancel();
    match worker.await {
        Ok(()) => tracing::info!("delivery worker stopped"),
        Err(e) => tracing::warn!(error = %e, "delivery worker did not stop cleanly"),
    }
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => {},
        () = terminate => {},
    }
    tracing::info!("shutting down");
}
