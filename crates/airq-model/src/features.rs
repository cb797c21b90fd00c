//! Single-row feature records built from user input.

use std::collections::HashMap;

use airq_common::error::{AirqError, Result};
use airq_common::pollutants::POLLUTANTS;
use serde::Serialize;

/// Named numeric inputs in the order they were entered.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeatureRecord {
    fields: Vec<(String, f64)>,
}

impl FeatureRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, replacing an earlier value of the same name.
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Values laid out in `order`. Every name in `order` must be present.
    pub fn ordered(&self, order: &[String]) -> Result<Vec<f64>> {
        order
            .iter()
            .map(|name| {
                self.get(name)
                    .ok_or_else(|| AirqError::MissingFeature(name.clone()))
            })
            .collect()
    }

    /// Pollutant readings must be finite and non-negative.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in &self.fields {
            if !value.is_finite() {
                return Err(AirqError::InvalidReading {
                    field: name.clone(),
                    reason: "must be a finite number".to_string(),
                });
            }
            if *value < 0.0 {
                return Err(AirqError::InvalidReading {
                    field: name.clone(),
                    reason: "must not be negative".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Build from submitted form text. Fields are read in pollutant order;
    /// absent or blank fields default to 0, unparseable ones are rejected.
    pub fn from_form_fields(fields: &HashMap<String, String>) -> Result<Self> {
        let mut record = Self::new();
        for p in POLLUTANTS.iter() {
            let value = match fields.get(p.name).map(|s| s.trim()).filter(|s| !s.is_empty()) {
                None => 0.0,
                Some(text) => text.parse::<f64>().map_err(|_| AirqError::InvalidReading {
                    field: p.name.to_string(),
                    reason: format!("'{}' is not a number", text),
                })?,
            };
            record.set(p.name, value);
        }
        record.validate()?;
        Ok(record)
    }

    /// Build from a JSON-style map. Only known pollutants are kept, in pollutant order.
    pub fn from_readings(readings: &HashMap<String, f64>) -> Result<Self> {
        let mut record = Self::new();
        for p in POLLUTANTS.iter() {
            if let Some(v) = readings.get(p.name) {
                record.set(p.name, *v);
            }
        }
        record.validate()?;
        Ok(record)
    }

    /// All twelve pollutants at zero.
    pub fn zeros() -> Self {
        POLLUTANTS.iter().fold(Self::new(), |r, p| r.with(p.name, 0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_ordered_follows_requested_order() {
        let r = FeatureRecord::new().with("NO2", 2.0).with("PM10", 10.0).with("PM2.5", 25.0);
        assert_eq!(r.ordered(&names(&["PM2.5", "PM10", "NO2"])).unwrap(), vec![25.0, 10.0, 2.0]);
        assert_eq!(r.ordered(&names(&["NO2"])).unwrap(), vec![2.0]);
    }

    #[test]
    fn test_ordered_missing_feature() {
        let r = FeatureRecord::new().with("PM2.5", 1.0);
        match r.ordered(&names(&["PM2.5", "O3"])) {
            Err(AirqError::MissingFeature(n)) => assert_eq!(n, "O3"),
            other => panic!("expected MissingFeature, got {:?}", other),
        }
    }

    #[test]
    fn test_set_replaces() {
        let r = FeatureRecord::new().with("CO", 1.0).with("CO", 3.0);
        assert_eq!(r.len(), 1);
        assert_eq!(r.get("CO"), Some(3.0));
    }

    #[test]
    fn test_validate_rejects_negative_and_nan() {
        assert!(matches!(
            FeatureRecord::new().with("SO2", -1.0).validate(),
            Err(AirqError::InvalidReading { ref field, .. }) if field == "SO2"
        ));
        assert!(FeatureRecord::new().with("SO2", f64::NAN).validate().is_err());
        assert!(FeatureRecord::zeros().validate().is_ok());
    }

    #[test]
    fn test_from_form_fields() {
        let mut form = HashMap::new();
        form.insert("PM2.5".to_string(), "81.4".to_string());
        form.insert("CO".to_string(), " ".to_string());
        let r = FeatureRecord::from_form_fields(&form).unwrap();
        assert_eq!(r.len(), 12);
        assert_eq!(r.get("PM2.5"), Some(81.4));
        assert_eq!(r.get("CO"), Some(0.0));
        assert_eq!(r.names().next(), Some("PM2.5"));

        form.insert("O3".to_string(), "lots".to_string());
        assert!(matches!(
            FeatureRecord::from_form_fields(&form),
            Err(AirqError::InvalidReading { ref field, .. }) if field == "O3"
        ));
    }

    #[test]
    fn test_from_readings_keeps_known_pollutants() {
        let mut m = HashMap::new();
        m.insert("Xylene".to_string(), 1.5);
        m.insert("Ozone".to_string(), 9.0);
        let r = FeatureRecord::from_readings(&m).unwrap();
        assert_eq!(r.len(), 1);
        assert_eq!(r.get("Xylene"), Some(1.5));
    }
}
