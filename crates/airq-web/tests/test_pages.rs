//! Page rendering through the full router.

mod common;

use axum::http::StatusCode;
use common::{app, get, post_form, state_with_classes};

#[tokio::test]
async fn test_index_defaults_to_first_page() {
    let (status, html) = get(app(), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("<title>Dataset Overview"));

    // navigation lists pages in registration order
    let nav = html.split("<nav").nth(1).unwrap().split("</nav>").next().unwrap();
    let pos = |t: &str| nav.find(t).unwrap();
    assert!(pos(">Dataset Overview<") < pos(">EDA<"));
    assert!(pos(">EDA<") < pos(">AQI Prediction<"));
}

#[tokio::test]
async fn test_page_selector_in_query() {
    let (status, html) = get(app(), "/?page=eda").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("<title>EDA"));

    let (status, html) = get(app(), "/?page=AQI%20Prediction").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("<title>AQI Prediction"));
}

#[tokio::test]
async fn test_unknown_page_is_404() {
    let (status, html) = get(app(), "/?page=settings").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(html.contains("Unknown page: settings"));
}

#[tokio::test]
async fn test_overview_metrics_match_dataset() {
    let (status, html) = get(app(), "/overview").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains(r#"<div class="stat-value">7</div><div class="stat-label">Total Rows</div>"#));
    assert!(html.contains(r#"<div class="stat-value">8</div><div class="stat-label">Total Columns</div>"#));
    assert!(html.contains(r#"<div class="stat-value">1</div><div class="stat-label">Missing Values</div>"#));
    assert!(html.contains(r#"<div class="stat-value">0</div><div class="stat-label">Duplicate Rows</div>"#));
    // PM2.5 has one missing of seven rows
    assert!(html.contains("<td>PM2.5</td><td>numeric</td><td>1</td><td>14.29</td>"));
    assert!(html.contains("<td>Date</td><td>date</td>"));
    assert!(html.contains("Correlation Heatmap"));
}

#[tokio::test]
async fn test_overview_value_counts() {
    let (_, html) = get(app(), "/overview?column=City").await;
    // ties by count resolve alphabetically
    assert!(html.contains(
        "<tbody><tr><td>Chennai</td><td>2</td></tr><tr><td>Delhi</td><td>2</td></tr>\
         <tr><td>Mumbai</td><td>2</td></tr><tr><td>Kolkata</td><td>1</td></tr></tbody>"
    ));
    assert!(html.contains(r#"<option value="City" selected>"#));

    let (status, html) = get(app(), "/overview?column=Nope").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Column not found: Nope"));
}

#[tokio::test]
async fn test_eda_defaults_to_first_three_cities_and_two_pollutants() {
    let (status, html) = get(app(), "/eda").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains(r#"value="Delhi" checked"#));
    assert!(html.contains(r#"value="Chennai" checked"#));
    assert!(html.contains(r#"value="Kolkata"> Kolkata"#));
    assert!(html.contains(r#"value="PM2.5" checked"#));
    assert!(html.contains(r#"value="PM10" checked"#));
    assert!(html.contains(r#"value="NO2"> NO2"#));
    assert!(html.contains("PM2.5 Trend Over Time"));
    assert!(html.contains("Average PM10 by City"));
    assert!(html.contains("Proportion of AQI Buckets"));
}

#[tokio::test]
async fn test_eda_cleared_cities_render_placeholders() {
    let (status, html) = get(app(), "/eda?filtered=true&pollutant=PM2.5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(html.matches("Select at least one city to see this chart.").count(), 8);
    assert!(!html.contains("<svg"));
}

#[tokio::test]
async fn test_eda_single_pollutant_has_no_correlation() {
    let (_, html) = get(app(), "/eda?city=Delhi&city=Mumbai&pollutant=NO2").await;
    assert!(html.contains("Select at least 2 pollutants for correlation matrix."));
    assert!(html.contains("NO2 Heatmap: City vs Date"));
    assert!(html.contains(r#"value="Kolkata"> Kolkata"#));
}

#[tokio::test]
async fn test_eda_unknown_city_is_ignored() {
    let (status, html) = get(app(), "/eda?city=Atlantis&city=Delhi&pollutant=PM2.5&pollutant=CO").await;
    assert_eq!(status, StatusCode::OK);
    assert!(!html.contains("Atlantis"));
    assert!(html.contains(r#"value="Delhi" checked"#));
    assert!(html.contains("Correlation Matrix"));
}

#[tokio::test]
async fn test_predict_form_has_twelve_inputs() {
    let (status, html) = get(app(), "/predict").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(html.matches(r#"type="number""#).count(), 12);
    assert!(!html.contains("Prediction Results"));
}

#[tokio::test]
async fn test_predict_submit_renders_result() {
    let (status, html) = post_form(app(), "/predict", "PM2.5=100&PM10=50").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Prediction Results"));
    assert!(html.contains(r#"<div class="result-value">240.00</div>"#));
    assert!(html.contains(r#"<div class="result-value">Very Poor</div>"#));
    // submitted values stay in the form
    assert!(html.contains(r#"name="PM2.5" min="0" step="any" value="100""#));
}

#[tokio::test]
async fn test_predict_is_independent_of_field_order() {
    let (_, a) = post_form(app(), "/predict", "PM2.5=20&NO2=5&CO=1").await;
    let (_, b) = post_form(app(), "/predict", "CO=1&NO2=5&PM2.5=20").await;
    assert_eq!(a, b);
    assert!(a.contains(r#"<div class="result-value">80.00</div>"#));
    assert!(a.contains(r#"<div class="result-value">Satisfactory</div>"#));
}

#[tokio::test]
async fn test_predict_all_zero_readings() {
    let (status, html) = post_form(app(), "/predict", "").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains(r#"<div class="result-value">80.00</div>"#));
}

#[tokio::test]
async fn test_predict_rejects_negative_reading() {
    let (status, html) = post_form(app(), "/predict", "NO2=-4").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Invalid reading for NO2: must not be negative"));
    assert!(!html.contains("Prediction Results"));
}

#[tokio::test]
async fn test_predict_unknown_category_is_visible_error() {
    let app = airq_web::router::build_router(state_with_classes("[0, 1, 2, 3, 9, 5]"));
    let (status, html) = post_form(app, "/predict", "PM2.5=100").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("alert-error"));
    assert!(html.contains("Unknown AQI category code: 9"));
}
