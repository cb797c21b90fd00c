//! Shared fixtures: a small city dataset and two tiny forests keyed on PM2.5.
#![allow(dead_code)]

use airq_data::Dataset;
use airq_model::{ForestClassifier, ForestRegressor, ModelBundle};
use airq_web::config::Config;
use airq_web::state::AppState;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

pub const CSV: &str = "\
City,Date,PM2.5,PM10,NO2,CO,AQI,AQI_Bucket
Delhi,2020-01-01,120.5,210.0,45.2,1.2,310,Very Poor
Delhi,2020-01-02,98.0,180.0,40.1,1.0,250,Poor
Mumbai,2020-01-01,45.0,90.0,20.0,0.6,110,Moderate
Mumbai,2020-01-02,,85.0,18.5,0.5,95,Satisfactory
Chennai,2020-01-01,30.0,60.0,12.0,0.4,70,Satisfactory
Chennai,2020-01-02,28.5,55.0,11.0,0.3,48,Good
Kolkata,2020-01-01,80.0,150.0,35.0,0.9,200,Moderate
";

/// Trained order differs from the form order; PM2.5 is the last feature.
pub const REGRESSOR: &str = r#"{
    "feature_names": ["Xylene", "Toluene", "Benzene", "O3", "SO2", "CO",
                      "NH3", "NOx", "NO2", "NO", "PM10", "PM2.5"],
    "trees": [{"nodes": [
        {"feature": 11, "threshold": 60.0, "left": 1, "right": 2},
        {"value": [80.0]},
        {"value": [240.0]}
    ]}]
}"#;

pub fn classifier_json(classes: &str) -> String {
    format!(
        r#"{{
    "feature_names": ["PM10", "PM2.5", "NO", "NO2", "NOx", "NH3",
                      "CO", "SO2", "O3", "Benzene", "Toluene", "Xylene"],
    "classes": {},
    "trees": [{{"nodes": [
        {{"feature": 1, "threshold": 60.0, "left": 1, "right": 2}},
        {{"value": [0.0, 1.0, 0.0, 0.0, 0.0, 0.0]}},
        {{"value": [0.0, 0.0, 0.0, 0.0, 1.0, 0.0]}}
    ]}}]
}}"#,
        classes
    )
}

pub fn state_with_classes(classes: &str) -> AppState {
    let dataset = Dataset::from_csv_reader(CSV.as_bytes()).unwrap();
    let models = ModelBundle::new(
        Box::new(ForestRegressor::from_json(REGRESSOR).unwrap()),
        Box::new(ForestClassifier::from_json(&classifier_json(classes)).unwrap()),
    );
    AppState::new(Config::default(), dataset, models).unwrap()
}

pub fn test_state() -> AppState {
    state_with_classes("[0, 1, 2, 3, 4, 5]")
}

pub fn app() -> Router {
    airq_web::router::build_router(test_state())
}

pub async fn send(app: Router, req: Request<Body>) -> (StatusCode, String) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

pub async fn get(app: Router, uri: &str) -> (StatusCode, String) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

pub async fn post_form(app: Router, uri: &str, body: &str) -> (StatusCode, String) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, req).await
}

pub async fn post_json(app: Router, uri: &str, body: &str) -> (StatusCode, String) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, req).await
}
