//! airq-data — Air-quality dataset loading and analysis.
//!
//! Provides:
//!   - CSV loading into a type-normalised polars frame (`Dataset`)
//!   - Dataset profiling for the overview page (`profile`)
//!   - Filtered aggregations behind the EDA chart views (`eda`)
//!   - Statistics over polars float columns shared by both (`stats`)

pub mod dataset;
pub mod stats;
pub mod profile;
pub mod eda;

pub use dataset::{DType, Dataset};
