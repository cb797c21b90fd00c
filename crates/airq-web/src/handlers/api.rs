//! JSON endpoints: dataset profile and health.

use airq_common::error::AirqError;
use airq_data::profile::{self, DatasetProfile};
use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::handlers::ApiError;
use crate::state::SharedState;

/// `GET /api/overview` — metrics, column info and summaries.
pub async fn api_overview(
    State(state): State<SharedState>,
) -> Result<Json<DatasetProfile>, ApiError> {
    let prof = tokio::task::spawn_blocking(move || profile::profile(&state.dataset))
        .await
        .map_err(|e| ApiError(AirqError::Task(e.to_string())))??;
    Ok(Json(prof))
}

/// `GET /api/health`
pub async fn api_health(State(state): State<SharedState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "rows": state.dataset.n_rows(),
        "cols": state.dataset.n_cols(),
        "pages": state.registry.pages().iter().map(|p| p.slug()).collect::<Vec<_>>(),
        "regressor_features": state.models.regressor_features(),
        "classifier_features": state.models.classifier_features(),
    }))
}
