//! airq-common — Shared types and errors used across all airq crates.

pub mod error;
pub mod bucket;
pub mod pollutants;

// Re-export commonly used types
pub use bucket::AqiBucket;
pub use error::{AirqError, Result};
pub use pollutants::{Pollutant, POLLUTANTS};
