//! Page registry dispatch against a real application state.

mod common;

use airq_common::error::{AirqError, Result};
use airq_web::registry::{Page, PageRegistry, PageRequest};
use airq_web::state::AppState;
use common::test_state;

fn render_overview(_: &AppState, _: &PageRequest) -> Result<String> {
    Ok("overview".to_string())
}

fn render_eda(_: &AppState, _: &PageRequest) -> Result<String> {
    Ok("eda".to_string())
}

fn render_prediction(_: &AppState, _: &PageRequest) -> Result<String> {
    Ok("prediction".to_string())
}

#[test]
fn test_selector_runs_its_own_callback() {
    let state = test_state();
    let req = PageRequest::default();
    let mut reg = PageRegistry::new();
    reg.register(Page::Eda, render_eda).unwrap();
    reg.register(Page::Prediction, render_prediction).unwrap();
    reg.register(Page::Overview, render_overview).unwrap();

    assert_eq!(reg.run("eda", &state, &req).unwrap(), "eda");
    assert_eq!(reg.run("predict", &state, &req).unwrap(), "prediction");
    assert_eq!(reg.run("Dataset Overview", &state, &req).unwrap(), "overview");
}

#[test]
fn test_unregistered_page_fails() {
    let state = test_state();
    let mut reg = PageRegistry::new();
    reg.register(Page::Overview, render_overview).unwrap();
    assert!(matches!(
        reg.run("eda", &state, &PageRequest::default()),
        Err(AirqError::UnknownPage(_))
    ));
}

#[test]
fn test_default_registry_order() {
    let state = test_state();
    assert_eq!(state.registry.pages(), vec![Page::Overview, Page::Eda, Page::Prediction]);
    let html = state.registry.run("overview", &state, &PageRequest::default()).unwrap();
    assert!(html.contains("Total Rows"));
}
