//! AQI prediction — pollutant form, model inference, result cards.

use std::collections::HashMap;

use airq_common::error::{AirqError, Result};
use airq_common::pollutants::POLLUTANTS;
use airq_model::{FeatureRecord, Prediction};
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::handlers::layout::{error_card, html_escape, page_shell};
use crate::handlers::ApiError;
use crate::registry::{Page, PageRequest};
use crate::state::{AppState, SharedState};

pub fn render(state: &AppState, req: &PageRequest) -> Result<String> {
    let outcome = match &req.form {
        None => String::new(),
        Some(fields) => match predict_form(state, fields) {
            Ok(p) => result_cards(&p),
            Err(e) => {
                warn!(error = %e, "Prediction rejected");
                error_card(&e.to_string())
            }
        },
    };
    let body = outcome + &form_html(req.form.as_ref());
    Ok(page_shell(&state.registry, Page::Prediction, "Predict AQI value and AQI category", &body))
}

fn predict_form(state: &AppState, fields: &HashMap<String, String>) -> Result<Prediction> {
    let record = FeatureRecord::from_form_fields(fields)?;
    let prediction = state.models.predict(&record)?;
    info!(aqi = prediction.aqi, bucket = %prediction.bucket, "Prediction served");
    Ok(prediction)
}

fn result_cards(p: &Prediction) -> String {
    format!(
        r#"<h2 class="section-title">Prediction Results</h2>
<div class="result-grid">
    <div class="result-card"><div class="result-label">AQI</div><div class="result-value">{:.2}</div></div>
    <div class="result-card" style="border-color: {}"><div class="result-label">Category</div><div class="result-value">{}</div></div>
</div>"#,
        p.aqi,
        p.bucket.color(),
        html_escape(p.bucket.label())
    )
}

/// Twelve inputs in a three-column grid; submitted values are kept.
fn form_html(submitted: Option<&HashMap<String, String>>) -> String {
    let inputs: String = POLLUTANTS
        .iter()
        .map(|p| {
            let value = submitted
                .and_then(|f| f.get(p.name))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| "0".to_string());
            format!(
                r#"<div class="form-field"><label for="{id}">{label} ({unit})</label><input type="number" id="{id}" name="{name}" min="0" step="any" value="{value}"></div>"#,
                id = html_escape(&p.name.replace('.', "_")),
                name = html_escape(p.name),
                label = html_escape(p.label),
                unit = html_escape(p.unit),
                value = html_escape(&value),
            )
        })
        .collect();
    format!(
        r#"<form method="post" action="/predict" class="card predict-form">
    <div class="form-grid">{}</div>
    <button type="submit" class="btn btn-primary">Predict Air Quality</button>
</form>"#,
        inputs
    )
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub aqi: f64,
    pub bucket: String,
    pub code: i64,
}

/// `POST /api/predict` with a JSON object of pollutant readings. Bodies that
/// are not such an object are answered with 422 and a JSON error.
pub async fn api_predict(
    State(state): State<SharedState>,
    payload: std::result::Result<Json<HashMap<String, f64>>, JsonRejection>,
) -> std::result::Result<Json<PredictResponse>, ApiError> {
    let Json(readings) = payload.map_err(|rejection| {
        ApiError(AirqError::InvalidRequest(rejection.body_text()))
    })?;
    let record = FeatureRecord::from_readings(&readings)?;
    let p = state.models.predict(&record)?;
    Ok(Json(PredictResponse {
        aqi: p.aqi,
        bucket: p.bucket.label().to_string(),
        code: p.code,
    }))
}
