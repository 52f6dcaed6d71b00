pub mod deck;
pub mod health;
pub mod webhook;

use crate::config::AppConfig;
use crate::services::AppState;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower::limit::ConcurrencyLimitLayer;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Maximum upload size (pitch decks are image-heavy PDFs)
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

pub fn create_router(state: AppState, config: &AppConfig, metrics_handle: PrometheusHandle) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/api/pitch-deck/upload", post(deck::upload_pitch_deck))
        .route("/api/pitch-deck/analyze/{file_id}", post(deck::analyze_pitch_deck))
        .route(
            "/api/pitch-deck/analyze-with-agents/{file_id}",
            post(deck::analyze_with_agents),
        )
        .route("/api/email/webhook", post(webhook::email_webhook))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state.clone());

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .with_state(state);

    let metrics_route = Router::new().route(
        "/metrics",
        get(move || std::future::ready(metrics_handle.render())),
    );

    Router::new()
        .merge(api_routes)
        .merge(health_routes)
        .merge(metrics_route)
        .layer(
            ServiceBuilder::new()
                // Request ID assignment (outermost so traces carry it)
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                // Request timeout (pipeline runs span several model calls)
                .layer(TimeoutLayer::new(config.request_timeout()))
                // Concurrency limit for backpressure
                .layer(ConcurrencyLimitLayer::new(config.server.max_concurrent_requests))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(cors),
        )
}
