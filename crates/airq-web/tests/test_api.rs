//! JSON endpoints.

mod common;

use axum::http::StatusCode;
use common::{app, get, post_json};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn readings(pm25: f64) -> Value {
    json!({
        "PM2.5": pm25, "PM10": 40.0, "NO": 3.0, "NO2": 12.0, "NOx": 15.0, "NH3": 8.0,
        "CO": 0.7, "SO2": 6.0, "O3": 30.0, "Benzene": 1.0, "Toluene": 2.5, "Xylene": 0.4
    })
}

#[tokio::test]
async fn test_api_predict() {
    let (status, body) = post_json(app(), "/api/predict", &readings(25.0).to_string()).await;
    assert_eq!(status, StatusCode::OK);
    let v: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v, json!({ "aqi": 80.0, "bucket": "Satisfactory", "code": 1 }));

    let (_, body) = post_json(app(), "/api/predict", &readings(150.0).to_string()).await;
    let v: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v, json!({ "aqi": 240.0, "bucket": "Very Poor", "code": 4 }));
}

#[tokio::test]
async fn test_api_predict_missing_feature_is_422() {
    let (status, body) = post_json(app(), "/api/predict", r#"{"PM2.5": 10.0}"#).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let v: Value = serde_json::from_str(&body).unwrap();
    assert!(v["error"].as_str().unwrap().contains("Model expects feature"));
}

#[tokio::test]
async fn test_api_predict_negative_is_422() {
    let mut r = readings(25.0);
    r["SO2"] = json!(-1.0);
    let (status, body) = post_json(app(), "/api/predict", &r.to_string()).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body.contains("Invalid reading for SO2"));
}

#[tokio::test]
async fn test_api_predict_malformed_body_is_422_json() {
    let (status, body) = post_json(app(), "/api/predict", "{not json").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let v: Value = serde_json::from_str(&body).unwrap();
    assert!(v["error"].as_str().unwrap().starts_with("Invalid request body"));

    let (status, body) = post_json(app(), "/api/predict", r#"{"PM2.5": "high"}"#).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let v: Value = serde_json::from_str(&body).unwrap();
    assert!(v["error"].is_string());
}

#[tokio::test]
async fn test_api_overview_totals() {
    let (status, body) = get(app(), "/api/overview").await;
    assert_eq!(status, StatusCode::OK);
    let v: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v["rows"], json!(7));
    assert_eq!(v["cols"], json!(8));
    let per_column: u64 = v["columns"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["missing"].as_u64().unwrap())
        .sum();
    assert_eq!(v["total_missing"].as_u64().unwrap(), per_column);
    assert_eq!(per_column, 1);
}

#[tokio::test]
async fn test_api_health() {
    let (status, body) = get(app(), "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    let v: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v["status"], "ok");
    assert_eq!(v["pages"], json!(["overview", "eda", "predict"]));
    assert_eq!(v["regressor_features"][11], "PM2.5");
}
