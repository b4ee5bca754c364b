//! Loading and evaluating trained models.
//!
//! A model file is JSON describing the ordered feature list the model was
//! trained on and an estimator over those features. For example, a single
//! regression stump on molecular weight:
//!
//! ```json
//! {
//!   "name": "ret-v804m-pic50",
//!   "target": "pIC50",
//!   "features": ["MolWt"],
//!   "task": "regression",
//!   "estimator": {
//!     "kind": "random_forest",
//!     "trees": [{"nodes": [
//!       {"feature": 0, "threshold": 300.0, "left": 1, "right": 2},
//!       {"value": 5.0},
//!       {"value": 7.0}
//!     ]}]
//!   }
//! }
//! ```

use std::{fs::read_to_string, path::Path};

use log::{info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{table::FeatureTable, Error};

/// Anything that maps one aligned descriptor row to a prediction.
pub trait Model: Send + Sync {
    /// the descriptor names this model expects, in column order
    fn features(&self) -> &[String];

    /// predict a single row, laid out as [Model::features]
    fn predict(&self, row: &[f64]) -> f64;

    /// label for the prediction column of exported results
    fn target(&self) -> Option<&str> {
        None
    }

    /// predict every row of a table that has already been aligned to
    /// [Model::features]
    fn predict_table(&self, table: &FeatureTable) -> Vec<f64> {
        table
            .matrix()
            .rows()
            .par_iter()
            .map(|row| self.predict(row))
            .collect()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Task {
    #[default]
    Regression,
    /// binary classification, predicting 0 or 1
    Classification,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// A binary decision tree stored as a flat node array rooted at index 0.
/// Children always come after their parent.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// follow `row` from the root to a leaf. features past the end of `row`
    /// count as missing, like NaN
    pub fn eval(&self, row: &[f64]) -> f64 {
        let mut i = 0;
        loop {
            match self.nodes[i] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    // NaN fails the comparison and goes right
                    let x = row.get(feature).copied().unwrap_or(f64::NAN);
                    i = if x <= threshold { left } else { right };
                }
            }
        }
    }

    fn validate(&self, nfeatures: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree with no nodes".to_owned());
        }
        let n = self.nodes.len();
        for (i, node) in self.nodes.iter().enumerate() {
            match *node {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature >= nfeatures {
                        return Err(format!(
                            "node {i} splits on feature {feature} but the \
                             model has {nfeatures} features"
                        ));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {i} has threshold {threshold}"));
                    }
                    for child in [left, right] {
                        if child <= i || child >= n {
                            return Err(format!(
                                "node {i} has child {child} outside {}..{n}",
                                i + 1
                            ));
                        }
                    }
                }
                Node::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(format!("leaf {i} has value {value}"));
                    }
                }
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Estimator {
    /// `init + learning_rate * sum(trees)`, a log-odds score for
    /// classification
    GradientBoosting {
        init: f64,
        learning_rate: f64,
        trees: Vec<Tree>,
    },
    /// mean of the trees, whose leaves hold the positive class probability
    /// for classification
    RandomForest { trees: Vec<Tree> },
    /// `intercept + coefficients . row`, a log-odds score for classification
    Linear {
        intercept: f64,
        coefficients: Vec<f64>,
    },
}

impl Estimator {
    fn raw(&self, row: &[f64]) -> f64 {
        match self {
            Estimator::GradientBoosting {
                init,
                learning_rate,
                trees,
            } => init + learning_rate * trees.iter().map(|t| t.eval(row)).sum::<f64>(),
            Estimator::RandomForest { trees } => {
                trees.iter().map(|t| t.eval(row)).sum::<f64>() / trees.len() as f64
            }
            Estimator::Linear {
                intercept,
                coefficients,
            } => {
                intercept
                    + coefficients
                        .iter()
                        .zip(row)
                        .map(|(c, x)| c * x)
                        .sum::<f64>()
            }
        }
    }

    fn validate(&self, nfeatures: usize) -> Result<(), String> {
        match self {
            Estimator::GradientBoosting { trees, .. }
            | Estimator::RandomForest { trees } => {
                if trees.is_empty() {
                    return Err("ensemble with no trees".to_owned());
                }
                for (i, tree) in trees.iter().enumerate() {
                    tree.validate(nfeatures)
                        .map_err(|e| format!("tree {i}: {e}"))?;
                }
                Ok(())
            }
            Estimator::Linear { coefficients, .. } => {
                if coefficients.len() != nfeatures {
                    return Err(format!(
                        "{} coefficients for {nfeatures} features",
                        coefficients.len()
                    ));
                }
                Ok(())
            }
        }
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// A validated model loaded from a JSON file.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ModelArtifact {
    name: String,
    #[serde(default)]
    target: Option<String>,
    features: Vec<String>,
    #[serde(default)]
    task: Task,
    estimator: Estimator,
}

impl ModelArtifact {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let model = Self::from_json(&read_to_string(path)?)?;
        info!(
            "loaded model {} from {} with {} features",
            model.name,
            path.display(),
            model.features.len()
        );
        Ok(model)
    }

    pub fn from_json(s: &str) -> Result<Self, Error> {
        let model: Self = serde_json::from_str(s)?;
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.features.is_empty() {
            return Err(Error::InvalidModel("no features".to_owned()));
        }
        self.estimator
            .validate(self.features.len())
            .map_err(Error::InvalidModel)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn task(&self) -> Task {
        self.task
    }

    /// the positive class probability for classifiers, `None` for regressors
    pub fn probability(&self, row: &[f64]) -> Option<f64> {
        if self.task != Task::Classification {
            return None;
        }
        let raw = self.estimator.raw(row);
        Some(match self.estimator {
            Estimator::RandomForest { .. } => raw,
            _ => sigmoid(raw),
        })
    }
}

impl Model for ModelArtifact {
    fn features(&self) -> &[String] {
        &self.features
    }

    /// NaN for a row that is not laid out as [Model::features]
    fn predict(&self, row: &[f64]) -> f64 {
        if row.len() != self.features.len() {
            warn!(
                "{} values for the {} features of {}",
                row.len(),
                self.features.len(),
                self.name
            );
            return f64::NAN;
        }
        match self.probability(row) {
            Some(p) if p >= 0.5 => 1.0,
            Some(_) => 0.0,
            None => self.estimator.raw(row),
        }
    }

    fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    const STUMP: &str = r#"{"nodes": [
        {"feature": 0, "threshold": 100.0, "left": 1, "right": 2},
        {"value": 1.0},
        {"value": 3.0}
    ]}"#;

    fn artifact(task: &str, estimator: &str) -> Result<ModelArtifact, Error> {
        ModelArtifact::from_json(&format!(
            r#"{{"name": "test", "features": ["MolWt", "TPSA"],
                "task": "{task}", "estimator": {estimator}}}"#
        ))
    }

    #[test]
    fn boosting_regression() {
        let m = artifact(
            "regression",
            &format!(
                r#"{{"kind": "gradient_boosting", "init": 5.0,
                    "learning_rate": 0.5, "trees": [{STUMP}, {STUMP}]}}"#
            ),
        )
        .unwrap();
        assert_eq!(m.task(), Task::Regression);
        assert_abs_diff_eq!(m.predict(&[50.0, 0.0]), 6.0);
        assert_abs_diff_eq!(m.predict(&[150.0, 0.0]), 8.0);
        // the threshold itself goes left
        assert_abs_diff_eq!(m.predict(&[100.0, 0.0]), 6.0);
        assert_abs_diff_eq!(m.predict(&[f64::NAN, 0.0]), 8.0);
        assert!(m.probability(&[50.0, 0.0]).is_none());
    }

    #[test]
    fn forest_classification() {
        let leaf = |v: f64| format!(r#"{{"nodes": [{{"value": {v}}}]}}"#);
        let m = artifact(
            "classification",
            &format!(
                r#"{{"kind": "random_forest", "trees": [{}, {}]}}"#,
                leaf(0.2),
                leaf(0.9)
            ),
        )
        .unwrap();
        assert_abs_diff_eq!(m.probability(&[0.0, 0.0]).unwrap(), 0.55, epsilon = 1e-12);
        assert_eq!(m.predict(&[0.0, 0.0]), 1.0);
    }

    #[test]
    fn linear() {
        let m = artifact(
            "regression",
            r#"{"kind": "linear", "intercept": 1.0, "coefficients": [0.01, -0.1]}"#,
        )
        .unwrap();
        assert_abs_diff_eq!(m.predict(&[200.0, 20.0]), 1.0, epsilon = 1e-12);

        let c = artifact(
            "classification",
            r#"{"kind": "linear", "intercept": -1.0, "coefficients": [0.01, 0.0]}"#,
        )
        .unwrap();
        assert_eq!(c.predict(&[50.0, 0.0]), 0.0);
        assert_eq!(c.predict(&[150.0, 0.0]), 1.0);
        assert_abs_diff_eq!(c.probability(&[100.0, 0.0]).unwrap(), 0.5);
    }

    #[test]
    fn defaults() {
        let m = ModelArtifact::from_json(
            r#"{"name": "m", "features": ["MolWt"],
                "estimator": {"kind": "linear", "intercept": 0.0,
                              "coefficients": [1.0]}}"#,
        )
        .unwrap();
        assert_eq!(m.task(), Task::Regression);
        assert_eq!(m.target(), None);
        assert_eq!(m.name(), "m");
    }

    #[test]
    fn invalid() {
        let cases = [
            r#"{"kind": "linear", "intercept": 0.0, "coefficients": [1.0]}"#,
            r#"{"kind": "random_forest", "trees": []}"#,
            r#"{"kind": "random_forest", "trees": [{"nodes": []}]}"#,
            r#"{"kind": "random_forest", "trees": [{"nodes": [
                {"feature": 2, "threshold": 1.0, "left": 1, "right": 2},
                {"value": 0.0}, {"value": 1.0}]}]}"#,
            r#"{"kind": "random_forest", "trees": [{"nodes": [
                {"feature": 0, "threshold": 1.0, "left": 0, "right": 1},
                {"value": 0.0}]}]}"#,
            r#"{"kind": "random_forest", "trees": [{"nodes": [
                {"feature": 0, "threshold": 1.0, "left": 1, "right": 5},
                {"value": 0.0}]}]}"#,
        ];
        for case in cases {
            let err = artifact("regression", case).unwrap_err();
            assert!(matches!(err, Error::InvalidModel(_)), "{case}: {err}");
        }
        let err = ModelArtifact::from_json(
            r#"{"name": "m", "features": [],
                "estimator": {"kind": "linear", "intercept": 0.0,
                              "coefficients": []}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidModel(_)));
        assert!(matches!(
            ModelArtifact::from_json("{"),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn misaligned_rows() {
        let tree: Tree = serde_json::from_str(STUMP).unwrap();
        assert_eq!(tree.eval(&[]), 3.0);
        let m = artifact(
            "regression",
            &format!(
                r#"{{"kind": "gradient_boosting", "init": 5.0,
                    "learning_rate": 0.5, "trees": [{STUMP}]}}"#
            ),
        )
        .unwrap();
        assert!(m.predict(&[50.0]).is_nan());
        assert!(m.predict(&[50.0, 0.0, 1.0]).is_nan());
        assert_abs_diff_eq!(m.predict(&[50.0, 0.0]), 5.5);
    }

    #[test]
    fn fixture() {
        let m = ModelArtifact::load("testfiles/model.json").unwrap();
        assert_eq!(m.target(), Some("pIC50"));
        assert!(!m.features().is_empty());
    }
}
