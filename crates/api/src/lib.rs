//! HTTP API server for loan applications.
//!
//! Exposes the application service over REST with structured logging
//! (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use application_store::ApplicationStore;
use axum::Router;
use axum::routing::{get, post};
use domain::{Actor, LoanApplicationService, ServiceConfig};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use routes::applications::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: ApplicationStore + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/applications", post(routes::applications::create::<S>))
        .route("/applications/{id}", get(routes::applications::get::<S>))
        .route(
            "/applications/{id}/audit",
            get(routes::applications::audit::<S>),
        )
        .route(
            "/applications/{id}/submit",
            post(routes::applications::submit::<S>),
        )
        .route(
            "/applications/{id}/cancel",
            post(routes::applications::cancel::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Wraps a store in the service and handler state described by `config`.
pub fn create_state<S: ApplicationStore>(store: S, config: &Config) -> Arc<AppState<S>> {
    let service = LoanApplicationService::with_config(
        store,
        ServiceConfig {
            operation_timeout: config.operation_timeout,
        },
    );

    Arc::new(AppState {
        service,
        default_actor: Actor::new(config.default_actor.clone()),
    })
}
