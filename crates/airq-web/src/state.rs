//! Shared application state for the web server.

use std::sync::Arc;

use airq_data::Dataset;
use airq_model::ModelBundle;
use anyhow::Context;
use tracing::info;

use crate::config::Config;
use crate::handlers;
use crate::registry::PageRegistry;

/// Shared state injected into every Axum handler. Loaded once, never mutated.
#[derive(Debug)]
pub struct AppState {
    pub config: Config,
    pub dataset: Dataset,
    pub models: ModelBundle,
    pub registry: PageRegistry,
}

impl AppState {
    pub fn new(config: Config, dataset: Dataset, models: ModelBundle) -> anyhow::Result<Self> {
        let registry = handlers::page_registry()?;
        Ok(Self { config, dataset, models, registry })
    }

    /// Read the dataset and both model artifacts named by `config`.
    pub fn load(config: Config) -> anyhow::Result<Self> {
        let dataset = Dataset::from_csv_path(&config.data.csv_path)
            .with_context(|| format!("loading dataset {}", config.data.csv_path.display()))?;
        let models = ModelBundle::load(&config.models.regressor_path, &config.models.classifier_path)
            .context("loading prediction models")?;
        info!(
            rows = dataset.n_rows(),
            cols = dataset.n_cols(),
            "Application state ready"
        );
        Self::new(config, dataset, models)
    }
}

pub type SharedState = Arc<AppState>;
