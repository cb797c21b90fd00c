//! Tree-ensemble artifacts serialized as JSON.
//!
//! A tree is a flat node list rooted at index 0. Split nodes send a row
//! left when `row[feature] <= threshold`. Children always sit at a higher
//! index than their parent, which makes evaluation loop-free.

use std::path::Path;

use airq_common::error::{AirqError, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: Vec<f64>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    /// Leaf payload reached by `row`. Callers check the row width first.
    pub(crate) fn leaf(&self, row: &[f64]) -> &[f64] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Split { feature, threshold, left, right } => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
                Node::Leaf { value } => return value,
            }
        }
    }

    fn validate(&self, n_features: usize, leaf_width: usize) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(AirqError::InvalidModel("tree has no nodes".into()));
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Split { feature, threshold, left, right } => {
                    if *feature >= n_features {
                        return Err(AirqError::InvalidModel(format!(
                            "node {} splits on feature {} but model has {}",
                            idx, feature, n_features
                        )));
                    }
                    if !threshold.is_finite() {
                        return Err(AirqError::InvalidModel(format!(
                            "node {} has a non-finite threshold",
                            idx
                        )));
                    }
                    for child in [*left, *right] {
                        if child <= idx || child >= self.nodes.len() {
                            return Err(AirqError::InvalidModel(format!(
                                "node {} has invalid child {}",
                                idx, child
                            )));
                        }
                    }
                }
                Node::Leaf { value } => {
                    if value.len() != leaf_width {
                        return Err(AirqError::InvalidModel(format!(
                            "leaf {} holds {} values, expected {}",
                            idx,
                            value.len(),
                            leaf_width
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

fn validate_features(names: &[String]) -> Result<()> {
    if names.is_empty() {
        return Err(AirqError::InvalidModel("feature_names is empty".into()));
    }
    for (i, name) in names.iter().enumerate() {
        if names[..i].contains(name) {
            return Err(AirqError::InvalidModel(format!("duplicate feature '{}'", name)));
        }
    }
    Ok(())
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn check_width(row: &[f64], names: &[String]) -> Result<()> {
    if row.len() != names.len() {
        return Err(AirqError::InvalidModel(format!(
            "expected {} features, got {}",
            names.len(),
            row.len()
        )));
    }
    Ok(())
}

/// Averages single-value leaves across trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestRegressor {
    pub feature_names: Vec<String>,
    pub trees: Vec<Tree>,
}

impl ForestRegressor {
    pub fn validate(&self) -> Result<()> {
        validate_features(&self.feature_names)?;
        if self.trees.is_empty() {
            return Err(AirqError::InvalidModel("regressor has no trees".into()));
        }
        for tree in &self.trees {
            tree.validate(self.feature_names.len(), 1)?;
        }
        Ok(())
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let model: Self = serde_json::from_str(text)?;
        model.validate()?;
        Ok(model)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let model: Self = read_json(path)?;
        model.validate()?;
        info!(
            path = %path.display(),
            trees = model.trees.len(),
            features = model.feature_names.len(),
            "Loaded regressor"
        );
        Ok(model)
    }

    pub fn predict_row(&self, row: &[f64]) -> Result<f64> {
        check_width(row, &self.feature_names)?;
        let sum: f64 = self.trees.iter().map(|t| t.leaf(row)[0]).sum();
        Ok(sum / self.trees.len() as f64)
    }
}

/// Averages per-class probability leaves across trees and takes the argmax.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestClassifier {
    pub feature_names: Vec<String>,
    /// Class code for each probability slot.
    pub classes: Vec<i64>,
    pub trees: Vec<Tree>,
}

impl ForestClassifier {
    pub fn validate(&self) -> Result<()> {
        validate_features(&self.feature_names)?;
        if self.classes.is_empty() {
            return Err(AirqError::InvalidModel("classifier has no classes".into()));
        }
        if self.trees.is_empty() {
            return Err(AirqError::InvalidModel("classifier has no trees".into()));
        }
        for tree in &self.trees {
            tree.validate(self.feature_names.len(), self.classes.len())?;
        }
        Ok(())
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let model: Self = serde_json::from_str(text)?;
        model.validate()?;
        Ok(model)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let model: Self = read_json(path)?;
        model.validate()?;
        info!(
            path = %path.display(),
            trees = model.trees.len(),
            classes = model.classes.len(),
            "Loaded classifier"
        );
        Ok(model)
    }

    /// Mean class probabilities, one per entry of `classes`.
    pub fn probabilities(&self, row: &[f64]) -> Result<Vec<f64>> {
        check_width(row, &self.feature_names)?;
        let mut acc = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            for (slot, p) in acc.iter_mut().zip(tree.leaf(row)) {
                *slot += p;
            }
        }
        let n = self.trees.len() as f64;
        Ok(acc.into_iter().map(|v| v / n).collect())
    }

    /// Ties resolve to the earliest class.
    pub fn predict_row(&self, row: &[f64]) -> Result<i64> {
        let probs = self.probabilities(row)?;
        let mut best = 0;
        for (i, p) in probs.iter().enumerate() {
            if *p > probs[best] {
                best = i;
            }
        }
        Ok(self.classes[best])
    }
}
