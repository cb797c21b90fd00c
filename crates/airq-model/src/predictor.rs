//! Prediction flow: reorder inputs per model, run both models, map the class code.

use std::path::Path;

use airq_common::bucket::AqiBucket;
use airq_common::error::Result;
use serde::Serialize;
use tracing::debug;

use crate::features::FeatureRecord;
use crate::forest::{ForestClassifier, ForestRegressor};

/// Predicts the AQI value from a row in `feature_names()` order.
pub trait Regressor: Send + Sync {
    fn feature_names(&self) -> &[String];
    fn predict(&self, row: &[f64]) -> Result<f64>;
}

/// Predicts the AQI category code from a row in `feature_names()` order.
pub trait Classifier: Send + Sync {
    fn feature_names(&self) -> &[String];
    fn predict_code(&self, row: &[f64]) -> Result<i64>;
}

impl Regressor for ForestRegressor {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict(&self, row: &[f64]) -> Result<f64> {
        self.predict_row(row)
    }
}

impl Classifier for ForestClassifier {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict_code(&self, row: &[f64]) -> Result<i64> {
        self.predict_row(row)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub aqi: f64,
    pub bucket: AqiBucket,
    pub code: i64,
}

/// The two models loaded once at startup and shared read-only.
pub struct ModelBundle {
    regressor: Box<dyn Regressor>,
    classifier: Box<dyn Classifier>,
}

impl std::fmt::Debug for ModelBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelBundle")
            .field("regressor_features", &self.regressor.feature_names())
            .field("classifier_features", &self.classifier.feature_names())
            .finish()
    }
}

impl ModelBundle {
    pub fn new(regressor: Box<dyn Regressor>, classifier: Box<dyn Classifier>) -> Self {
        Self { regressor, classifier }
    }

    pub fn load(regressor_path: &Path, classifier_path: &Path) -> Result<Self> {
        let regressor = ForestRegressor::load(regressor_path)?;
        let classifier = ForestClassifier::load(classifier_path)?;
        Ok(Self::new(Box::new(regressor), Box::new(classifier)))
    }

    pub fn regressor_features(&self) -> &[String] {
        self.regressor.feature_names()
    }

    pub fn classifier_features(&self) -> &[String] {
        self.classifier.feature_names()
    }

    /// Each model sees the record in its own training order. A class code
    /// outside the bucket table is an error, never a silent fallback.
    pub fn predict(&self, record: &FeatureRecord) -> Result<Prediction> {
        record.validate()?;

        let reg_row = record.ordered(self.regressor.feature_names())?;
        let aqi = self.regressor.predict(&reg_row)?;

        let cls_row = record.ordered(self.classifier.feature_names())?;
        let code = self.classifier.predict_code(&cls_row)?;
        let bucket = AqiBucket::from_code(code)?;

        debug!(aqi, code, bucket = %bucket, "Prediction complete");
        Ok(Prediction { aqi, bucket, code })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use airq_common::error::AirqError;
    use std::sync::Mutex;

    /// Returns the first feature as the AQI and remembers the rows it saw.
    struct EchoRegressor {
        names: Vec<String>,
        seen: Mutex<Vec<Vec<f64>>>,
    }

    impl Regressor for EchoRegressor {
        fn feature_names(&self) -> &[String] {
            &self.names
        }
        fn predict(&self, row: &[f64]) -> Result<f64> {
            self.seen.lock().unwrap().push(row.to_vec());
            Ok(row[0])
        }
    }

    struct FixedClassifier {
        names: Vec<String>,
        code: i64,
    }

    impl Classifier for FixedClassifier {
        fn feature_names(&self) -> &[String] {
            &self.names
        }
        fn predict_code(&self, _row: &[f64]) -> Result<i64> {
            Ok(self.code)
        }
    }

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn bundle(code: i64) -> ModelBundle {
        ModelBundle::new(
            Box::new(EchoRegressor { names: strings(&["NO2", "PM2.5"]), seen: Mutex::new(vec![]) }),
            Box::new(FixedClassifier { names: strings(&["PM2.5"]), code }),
        )
    }

    #[test]
    fn test_prediction_independent_of_entry_order() {
        let b = bundle(3);
        let a = FeatureRecord::new().with("PM2.5", 120.0).with("NO2", 40.0);
        let c = FeatureRecord::new().with("NO2", 40.0).with("PM2.5", 120.0);
        let pa = b.predict(&a).unwrap();
        let pc = b.predict(&c).unwrap();
        assert_eq!(pa, pc);
        assert_eq!(pa.aqi, 40.0);
        assert_eq!(pa.bucket, AqiBucket::Poor);
        assert_eq!(pa.code, 3);
    }

    #[test]
    fn test_out_of_range_code_is_error() {
        let b = bundle(9);
        let r = FeatureRecord::zeros();
        assert!(matches!(b.predict(&r), Err(AirqError::UnknownCategory(9))));
    }

    #[test]
    fn test_missing_feature() {
        let b = bundle(0);
        let r = FeatureRecord::new().with("PM2.5", 1.0);
        assert!(matches!(b.predict(&r), Err(AirqError::MissingFeature(ref n)) if n == "NO2"));
    }

    #[test]
    fn test_negative_reading_rejected_before_models_run() {
        let b = bundle(0);
        let r = FeatureRecord::zeros().with("NO2", -3.0);
        assert!(matches!(b.predict(&r), Err(AirqError::InvalidReading { .. })));
    }

    #[test]
    fn test_all_zero_readings_with_forests() {
        let reg = ForestRegressor::from_json(
            r#"{"feature_names": ["PM2.5", "PM10"], "trees": [{"nodes": [
                {"feature": 1, "threshold": 20.0, "left": 1, "right": 2},
                {"value": [35.0]}, {"value": [150.0]}]}]}"#,
        )
        .unwrap();
        let cls = ForestClassifier::from_json(
            r#"{"feature_names": ["PM10", "PM2.5"], "classes": [0, 1, 2, 3, 4, 5],
                "trees": [{"nodes": [
                {"feature": 1, "threshold": 30.0, "left": 1, "right": 2},
                {"value": [0.9, 0.1, 0.0, 0.0, 0.0, 0.0]},
                {"value": [0.0, 0.0, 0.2, 0.8, 0.0, 0.0]}]}]}"#,
        )
        .unwrap();
        let b = ModelBundle::new(Box::new(reg), Box::new(cls));
        let p = b.predict(&FeatureRecord::zeros()).unwrap();
        assert!(p.aqi.is_finite());
        assert_eq!(p.aqi, 35.0);
        assert_eq!(p.bucket, AqiBucket::Good);

        let high = FeatureRecord::zeros().with("PM2.5", 90.0).with("PM10", 140.0);
        let p = b.predict(&high).unwrap();
        assert_eq!(p.aqi, 150.0);
        assert_eq!(p.bucket, AqiBucket::Poor);
    }

    #[test]
    fn test_load_bundle_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let reg = dir.path().join("regressor.json");
        let cls = dir.path().join("classifier.json");
        std::fs::write(&reg, r#"{"feature_names": ["CO"], "trees": [{"nodes": [{"value": [42.0]}]}]}"#).unwrap();
        std::fs::write(
            &cls,
            r#"{"feature_names": ["CO"], "classes": [0, 1], "trees": [{"nodes": [{"value": [0.1, 0.9]}]}]}"#,
        )
        .unwrap();
        let b = ModelBundle::load(&reg, &cls).unwrap();
        assert_eq!(b.regressor_features(), &["CO".to_string()]);
        let p = b.predict(&FeatureRecord::zeros()).unwrap();
        assert_eq!(p.aqi, 42.0);
        assert_eq!(p.bucket, AqiBucket::Satisfactory);
    }
}
