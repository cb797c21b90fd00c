//! Page registry — the closed set of dashboard pages and their render functions.

use std::collections::HashMap;

use airq_common::error::{AirqError, Result};
use serde::Deserialize;
use tracing::debug;

use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Overview,
    Eda,
    Prediction,
}

impl Page {
    pub fn title(self) -> &'static str {
        match self {
            Page::Overview => "Dataset Overview",
            Page::Eda => "EDA",
            Page::Prediction => "AQI Prediction",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Page::Overview => "overview",
            Page::Eda => "eda",
            Page::Prediction => "predict",
        }
    }

    /// Accepts either the slug or the display title.
    pub fn from_selector(selector: &str) -> Result<Self> {
        let s = selector.trim();
        [Page::Overview, Page::Eda, Page::Prediction]
            .into_iter()
            .find(|p| p.slug() == s || p.title() == s)
            .ok_or_else(|| AirqError::UnknownPage(s.to_string()))
    }
}

/// Query parameters any page may read. Repeated keys collect into the vectors.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub column: Option<String>,
    #[serde(default)]
    pub city: Vec<String>,
    #[serde(default)]
    pub pollutant: Vec<String>,
    #[serde(default)]
    pub filtered: bool,
}

/// Everything one render pass gets from the request.
#[derive(Debug, Clone, Default)]
pub struct PageRequest {
    pub query: PageQuery,
    /// Submitted form fields, present only for a POST.
    pub form: Option<HashMap<String, String>>,
}

impl PageRequest {
    pub fn from_query(query: PageQuery) -> Self {
        Self { query, form: None }
    }

    pub fn submitted(form: HashMap<String, String>) -> Self {
        Self { query: PageQuery::default(), form: Some(form) }
    }
}

pub type RenderFn = fn(&AppState, &PageRequest) -> Result<String>;

/// Ordered association list; registration order is navigation order.
#[derive(Clone, Default)]
pub struct PageRegistry {
    entries: Vec<(Page, RenderFn)>,
}

impl std::fmt::Debug for PageRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.pages()).finish()
    }
}

impl PageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, page: Page, render: RenderFn) -> Result<()> {
        if self.entries.iter().any(|(p, _)| *p == page) {
            return Err(AirqError::DuplicatePage(page.title().to_string()));
        }
        self.entries.push((page, render));
        Ok(())
    }

    pub fn pages(&self) -> Vec<Page> {
        self.entries.iter().map(|(p, _)| *p).collect()
    }

    pub fn first(&self) -> Option<Page> {
        self.entries.first().map(|(p, _)| *p)
    }

    /// Resolve an optional selector; absent means the first registered page.
    pub fn resolve(&self, selector: Option<&str>) -> Result<Page> {
        let page = match selector {
            Some(s) if !s.trim().is_empty() => Page::from_selector(s)?,
            _ => self.first().ok_or_else(|| AirqError::UnknownPage(String::new()))?,
        };
        if !self.entries.iter().any(|(p, _)| *p == page) {
            return Err(AirqError::UnknownPage(page.slug().to_string()));
        }
        Ok(page)
    }

    pub fn run_page(&self, page: Page, state: &AppState, req: &PageRequest) -> Result<String> {
        let render = self
            .entries
            .iter()
            .find(|(p, _)| *p == page)
            .map(|(_, f)| *f)
            .ok_or_else(|| AirqError::UnknownPage(page.slug().to_string()))?;
        debug!(page = page.slug(), "Rendering page");
        render(state, req)
    }

    pub fn run(&self, selector: &str, state: &AppState, req: &PageRequest) -> Result<String> {
        let page = self.resolve(Some(selector))?;
        self.run_page(page, state, req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_matches_slug_and_title() {
        assert_eq!(Page::from_selector("eda").unwrap(), Page::Eda);
        assert_eq!(Page::from_selector("AQI Prediction").unwrap(), Page::Prediction);
        assert!(matches!(Page::from_selector("settings"), Err(AirqError::UnknownPage(_))));
    }

    fn noop(_: &AppState, _: &PageRequest) -> Result<String> {
        Ok(String::new())
    }

    #[test]
    fn test_register_keeps_order_and_rejects_duplicates() {
        let mut reg = PageRegistry::new();
        reg.register(Page::Prediction, noop).unwrap();
        reg.register(Page::Overview, noop).unwrap();
        assert_eq!(reg.pages(), vec![Page::Prediction, Page::Overview]);
        assert!(matches!(reg.register(Page::Overview, noop), Err(AirqError::DuplicatePage(_))));
        assert_eq!(reg.pages().len(), 2);
    }

    #[test]
    fn test_resolve_defaults_to_first_and_rejects_unregistered() {
        let mut reg = PageRegistry::new();
        reg.register(Page::Eda, noop).unwrap();
        assert_eq!(reg.resolve(None).unwrap(), Page::Eda);
        assert_eq!(reg.resolve(Some("  ")).unwrap(), Page::Eda);
        assert!(matches!(reg.resolve(Some("overview")), Err(AirqError::UnknownPage(_))));
        assert!(matches!(PageRegistry::new().resolve(None), Err(AirqError::UnknownPage(_))));
    }
}
