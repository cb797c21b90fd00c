//! HTTP handlers for all web routes.

pub mod api;
pub mod eda;
pub mod layout;
pub mod overview;
pub mod predict;

use std::collections::HashMap;

use airq_common::error::AirqError;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Form, Json,
};
use axum_extra::extract::Query;
use serde_json::json;
use tracing::warn;

use crate::registry::{Page, PageQuery, PageRegistry, PageRequest};
use crate::state::SharedState;

/// The three dashboard pages in navigation order.
pub fn page_registry() -> airq_common::Result<PageRegistry> {
    let mut registry = PageRegistry::new();
    registry.register(Page::Overview, overview::render)?;
    registry.register(Page::Eda, eda::render)?;
    registry.register(Page::Prediction, predict::render)?;
    Ok(registry)
}

pub fn status_for(err: &AirqError) -> StatusCode {
    match err {
        AirqError::UnknownPage(_) => StatusCode::NOT_FOUND,
        AirqError::InvalidReading { .. }
        | AirqError::InvalidRequest(_)
        | AirqError::UnknownCategory(_)
        | AirqError::MissingFeature(_) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Error rendered as a small HTML page.
#[derive(Debug)]
pub struct PageError(pub AirqError);

impl From<AirqError> for PageError {
    fn from(e: AirqError) -> Self {
        Self(e)
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        warn!(status = status.as_u16(), error = %self.0, "Page request failed");
        let body = format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="UTF-8"><title>{code} — {site}</title><link rel="stylesheet" href="/static/css/main.css"></head>
<body><main class="main-content"><h1 class="page-title">{code}</h1>{err}<p><a href="/">Back to the dashboard</a></p></main></body>
</html>"#,
            code = status.as_u16(),
            site = layout::SITE_TITLE,
            err = layout::error_card(&self.0.to_string()),
        );
        (status, Html(body)).into_response()
    }
}

/// Error rendered as `{ "error": text }`.
#[derive(Debug)]
pub struct ApiError(pub AirqError);

impl From<AirqError> for ApiError {
    fn from(e: AirqError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        warn!(status = status.as_u16(), error = %self.0, "API request failed");
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// Pages aggregate the whole dataset, so rendering runs on the blocking pool.
async fn render_page(state: SharedState, page: Page, req: PageRequest) -> Result<Html<String>, PageError> {
    let html = tokio::task::spawn_blocking(move || state.registry.run_page(page, &state, &req))
        .await
        .map_err(|e| PageError(AirqError::Task(e.to_string())))??;
    Ok(Html(html))
}

/// `GET /` — `?page=<slug or title>`, first registered page when absent.
pub async fn index(
    State(state): State<SharedState>,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>, PageError> {
    let page = state.registry.resolve(query.page.as_deref())?;
    render_page(state, page, PageRequest::from_query(query)).await
}

pub async fn overview_page(
    State(state): State<SharedState>,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>, PageError> {
    render_page(state, Page::Overview, PageRequest::from_query(query)).await
}

pub async fn eda_page(
    State(state): State<SharedState>,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>, PageError> {
    render_page(state, Page::Eda, PageRequest::from_query(query)).await
}

pub async fn predict_page(State(state): State<SharedState>) -> Result<Html<String>, PageError> {
    render_page(state, Page::Prediction, PageRequest::default()).await
}

pub async fn predict_submit(
    State(state): State<SharedState>,
    Form(form): Form<HashMap<String, String>>,
) -> Result<Html<String>, PageError> {
    render_page(state, Page::Prediction, PageRequest::submitted(form)).await
}
