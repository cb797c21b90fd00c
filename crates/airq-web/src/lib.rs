//! airq-web — Web dashboard for the India air-quality dataset.
//! Serves three pages:
//!   - Dataset overview (shape, column info, summaries, distributions)
//!   - Exploratory data analysis filtered by city and pollutant
//!   - AQI prediction from twelve pollutant readings

pub mod charts;
pub mod config;
pub mod handlers;
pub mod registry;
pub mod router;
pub mod state;
