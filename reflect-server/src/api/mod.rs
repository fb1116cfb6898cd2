//! HTTP API surface
//!
//! Routes are grouped by concern: entry CRUD, analytics reports, and
//! analysis endpoints. Owner identity arrives in the `x-owner-id`
//! header, injected by the upstream auth proxy.

mod ai;
mod analytics;
mod entries;
mod error;
mod owner;

pub use error::ApiError;
pub use owner::OwnerId;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::{Json, Router};
use reflect_core::provider::AnalysisProvider;
use reflect_core::{Config, Database};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared state for all handlers
pub struct AppState {
    pub db: Database,
    pub provider: Option<Arc<dyn AnalysisProvider>>,
    pub config: Config,
}

/// Build the full application router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/entries",
            post(entries::create).get(entries::list),
        )
        .route("/api/entries/tags", get(entries::tags))
        .route(
            "/api/entries/{id}",
            get(entries::fetch)
                .put(entries::update)
                .delete(entries::delete),
        )
        .route("/api/analytics/mood-trends", get(analytics::mood_trends))
        .route("/api/analytics/distortions", get(analytics::distortions))
        .route("/api/analytics/progress", get(analytics::progress))
        .route("/api/analytics/insights", get(analytics::insights))
        .route("/api/analytics/stats", get(analytics::stats))
        .route("/api/analytics/dashboard", get(analytics::dashboard))
        .route("/api/ai/analyze/{id}", post(ai::analyze))
        .route("/api/ai/batch-analyze", post(ai::batch_analyze))
        .route("/api/ai/detect-mood", post(ai::detect_mood))
        .route("/api/ai/distortions", get(ai::distortion_info))
        .route("/api/ai/status", get(ai::status))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
