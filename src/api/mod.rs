pub mod error;
pub mod routes;
pub mod types;

use std::sync::Arc;

use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::AppState;

/// Build the streaming-transport router (§4.10): the one streaming RPC.
/// Bound separately from the health/metrics router so a slow or wedged
/// subscriber can never starve liveness checks (`config::listen_port`).
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/v1/contract-invocations",
            axum::routing::post(routes::stream_contract_invocations),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Build the health/metrics router, bound on `config::health_port`.
pub fn health_router(state: Arc<AppState>, metrics_handle: Option<PrometheusHandle>) -> Router {
    let mut app = Router::new().route("/health", axum::routing::get(routes::health));

    if let Some(handle) = metrics_handle {
        app = app.route(
            "/metrics",
            axum::routing::get(move || std::future::ready(handle.render())),
        );
    }

    app.layer(TraceLayer::new_for_http()).with_state(state)
}
