//! HTTP surface of the forecast service

pub mod health;
pub mod metrics;
pub mod predict;

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use tower_http::cors::CorsLayer;

use crate::forecast::{Predictor, RecordStore};
use crate::metrics::AppMetrics;

/// State shared by every handler.
pub struct AppState {
    pub predictor: Arc<Predictor>,
    pub store: Arc<dyn RecordStore + Send + Sync>,
    pub metrics: Arc<AppMetrics>,
    pub default_location: String,
    pub predict_timeout: Duration,
}

pub type ApiState = Arc<AppState>;

/// Assemble the full router. `main.rs` and the integration tests both use
/// this so they serve the same routes.
pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/predict", get(predict::predict))
        .route("/health", get(health::health))
        .route("/health/db", get(health::database_health))
        .route("/metrics", get(metrics::metrics))
        .route_layer(middleware::from_fn_with_state(state.clone(), track_http))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Record request count and latency per matched route.
async fn track_http(State(state): State<ApiState>, request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let started = Instant::now();
    let response = next.run(request).await;

    state
        .metrics
        .http_requests_total
        .with_label_values(&[method.as_str(), path.as_str(), response.status().as_str()])
        .inc();
    state
        .metrics
        .http_request_duration
        .observe(started.elapsed().as_secs_f64());

    response
}
