//! airq-model — Predict-only AQI models.
//!
//! Two artifacts are served: a regressor for the AQI value and a classifier
//! for the AQI category code. Both are tree ensembles shipped as JSON with
//! the exact feature order they were trained on, so inputs are always
//! reordered from that metadata rather than from how a form lists them.

pub mod features;
pub mod forest;
pub mod predictor;

pub use features::FeatureRecord;
pub use forest::{ForestClassifier, ForestRegressor};
pub use predictor::{Classifier, ModelBundle, Prediction, Regressor};
