//! Axum router — maps all URL paths to handlers.

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    services::ServeDir,
    trace::TraceLayer,
    compression::CompressionLayer,
};
use std::sync::Arc;
use crate::state::{AppState, SharedState};
use crate::handlers::{
    index, overview_page, eda_page, predict_page, predict_submit,
    api::{api_overview, api_health},
    predict::api_predict,
};

/// Build and return the full Axum router.
pub fn build_router(state: AppState) -> Router {
    let static_dir = state.config.web.static_dir.clone();
    let shared: SharedState = Arc::new(state);

    Router::new()
        // Pages
        .route("/",         get(index))
        .route("/overview", get(overview_page))
        .route("/eda",      get(eda_page))
        .route("/predict",  get(predict_page).post(predict_submit))

        // API endpoints
        .route("/api/predict",  post(api_predict))
        .route("/api/overview", get(api_overview))
        .route("/api/health",   get(api_health))

        // Static files
        .nest_service("/static", ServeDir::new(static_dir))

        // Middleware
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}
