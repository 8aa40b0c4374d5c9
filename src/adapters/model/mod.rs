//! Exported model adapter: Implementation of `Classifier` over a JSON model.
//!
//! The training notebook exports the fitted estimator to `model.json`. Two
//! estimator families are supported:
//!
//! - `logistic`: linear decision function, sigmoid probability
//! - `forest`: averaged decision trees with per-leaf class weights
//!
//! # Model Format
//!
//! ```json
//! {
//!   "kind": "forest",
//!   "feature_names": ["A1_Score", "...", "relation"],
//!   "trees": [
//!     { "nodes": [
//!         {"feature": 17, "threshold": 6.5, "left": 1, "right": 2},
//!         {"value": [120.0, 3.0]},
//!         {"value": [2.0, 40.0]}
//!     ] }
//!   ]
//! }
//! ```
//!
//! Nodes are stored in pre-order: children always sit after their parent, so
//! traversal always terminates. A row goes left when
//! `x[feature] <= threshold`.

use serde::{Deserialize, Serialize};

use crate::domain::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
use crate::ports::{Classifier, InferenceError};

/// Problems found while validating a model export.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("Malformed model JSON: {0}")]
    Parse(String),

    #[error("Feature names do not match the screening schema: {0}")]
    SchemaMismatch(String),

    #[error("Expected {expected} coefficients, got {got}")]
    CoefficientCount { expected: usize, got: usize },

    #[error("Non-finite parameter: {0}")]
    NonFinite(String),

    #[error("Forest has no trees")]
    EmptyForest,

    #[error("Tree {tree} is invalid: {reason}")]
    InvalidTree { tree: usize, reason: String },
}

/// A tree node as exported by the training notebook.
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
        /// Class weights `[w0, w1]` (counts or fractions)
        value: [f64; 2],
    },
}

/// A single decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    fn validate(&self, index: usize) -> Result<(), ModelError> {
        let invalid = |reason: String| ModelError::InvalidTree {
            tree: index,
            reason,
        };

        if self.nodes.is_empty() {
            return Err(invalid("no nodes".into()));
        }

        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= FEATURE_COUNT {
                        return Err(invalid(format!(
                            "node {i} splits on feature {feature}, schema has {FEATURE_COUNT}"
                        )));
                    }
                    if !threshold.is_finite() {
                        return Err(invalid(format!("node {i} has a non-finite threshold")));
                    }
                    for child in [*left, *right] {
                        if child <= i || child >= self.nodes.len() {
                            return Err(invalid(format!(
                                "node {i} points to child {child} (must be in {}..{})",
                                i + 1,
                                self.nodes.len()
                            )));
                        }
                    }
                }
                Node::Leaf { value } => {
                    if value.iter().any(|w| !w.is_finite() || *w < 0.0) {
                        return Err(invalid(format!("leaf {i} has a negative or non-finite weight")));
                    }
                    if value[0] + value[1] <= 0.0 {
                        return Err(invalid(format!("leaf {i} has zero total weight")));
                    }
                }
            }
        }
        Ok(())
    }

    /// Class probabilities of the leaf reached by `x`.
    fn leaf_proba(&self, x: &[f64]) -> [f64; 2] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if x[*feature] <= *threshold { *left } else { *right };
                }
                Node::Leaf { value } => {
                    let total = value[0] + value[1];
                    return [value[0] / total, value[1] / total];
                }
            }
        }
    }
}

/// Estimator parameters exported by the training notebook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Estimator {
    Logistic { coefficients: Vec<f64>, intercept: f64 },
    Forest { trees: Vec<Tree> },
}

/// On-disk layout of `model.json`, before validation.
#[derive(Deserialize)]
struct ModelExport {
    #[serde(default)]
    feature_names: Option<Vec<String>>,

    #[serde(flatten)]
    estimator: Estimator,
}

/// A validated model export.
///
/// Only constructed through [`ExportedModel::new`], [`ExportedModel::from_json`]
/// or deserialization, all of which validate against the screening schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ModelExport")]
pub struct ExportedModel {
    /// Column names the model was fitted on, in order
    #[serde(skip_serializing_if = "Option::is_none")]
    feature_names: Option<Vec<String>>,

    #[serde(flatten)]
    estimator: Estimator,
}

impl TryFrom<ModelExport> for ExportedModel {
    type Error = ModelError;

    fn try_from(export: ModelExport) -> Result<Self, Self::Error> {
        Self::new(export.feature_names, export.estimator)
    }
}

impl ExportedModel {
    /// Build a model from its parts.
    ///
    /// # Errors
    /// Returns the first schema or parameter problem found.
    pub fn new(
        feature_names: Option<Vec<String>>,
        estimator: Estimator,
    ) -> Result<Self, ModelError> {
        let model = Self {
            feature_names,
            estimator,
        };
        model.validate()?;
        Ok(model)
    }

    /// Parse and validate a model export.
    ///
    /// # Errors
    /// Returns `ModelError::Parse` for malformed JSON and the validation
    /// error otherwise.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ModelError> {
        let export: ModelExport =
            serde_json::from_slice(bytes).map_err(|e| ModelError::Parse(e.to_string()))?;
        Self::try_from(export)
    }

    #[must_use]
    pub fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    #[must_use]
    pub fn estimator(&self) -> &Estimator {
        &self.estimator
    }

    fn validate(&self) -> Result<(), ModelError> {
        if let Some(names) = &self.feature_names {
            if names.len() != FEATURE_COUNT {
                return Err(ModelError::SchemaMismatch(format!(
                    "model has {} columns, schema has {FEATURE_COUNT}",
                    names.len()
                )));
            }
            if let Some((i, (got, want))) = names
                .iter()
                .zip(FEATURE_NAMES.iter())
                .enumerate()
                .find(|(_, (got, want))| got.as_str() != **want)
            {
                return Err(ModelError::SchemaMismatch(format!(
                    "column {i} is {got:?}, expected {want:?}"
                )));
            }
        } else {
            tracing::warn!("Model export has no feature_names; column order cannot be verified");
        }

        match &self.estimator {
            Estimator::Logistic {
                coefficients,
                intercept,
            } => {
                if coefficients.len() != FEATURE_COUNT {
                    return Err(ModelError::CoefficientCount {
                        expected: FEATURE_COUNT,
                        got: coefficients.len(),
                    });
                }
                if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
                    return Err(ModelError::NonFinite("logistic coefficients".into()));
                }
            }
            Estimator::Forest { trees } => {
                if trees.is_empty() {
                    return Err(ModelError::EmptyForest);
                }
                for (i, tree) in trees.iter().enumerate() {
                    tree.validate(i)?;
                }
            }
        }
        Ok(())
    }

    fn row_proba(&self, x: &[f64]) -> [f64; 2] {
        match &self.estimator {
            Estimator::Logistic {
                coefficients,
                intercept,
            } => {
                let p = sigmoid(decision_value(coefficients, *intercept, x));
                [1.0 - p, p]
            }
            Estimator::Forest { trees } => {
                let mut acc = [0.0; 2];
                for tree in trees {
                    let p = tree.leaf_proba(x);
                    acc[0] += p[0];
                    acc[1] += p[1];
                }
                let n = trees.len() as f64;
                [acc[0] / n, acc[1] / n]
            }
        }
    }

    fn row_label(&self, x: &[f64]) -> u8 {
        match &self.estimator {
            Estimator::Logistic {
                coefficients,
                intercept,
            } => u8::from(decision_value(coefficients, *intercept, x) > 0.0),
            Estimator::Forest { .. } => {
                let p = self.row_proba(x);
                // argmax, first class wins ties
                u8::from(p[1] > p[0])
            }
        }
    }
}

fn decision_value(coefficients: &[f64], intercept: f64, x: &[f64]) -> f64 {
    coefficients
        .iter()
        .zip(x)
        .map(|(w, v)| w * v)
        .sum::<f64>()
        + intercept
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn check_rows(rows: &[FeatureVector]) -> Result<(), InferenceError> {
    for (r, row) in rows.iter().enumerate() {
        if let Some(col) = row.as_slice().iter().position(|v| !v.is_finite()) {
            return Err(InferenceError::MalformedInput(format!(
                "row {r} column {} ({}) is not finite",
                col, FEATURE_NAMES[col]
            )));
        }
    }
    Ok(())
}

impl Classifier for ExportedModel {
    fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<u8>, InferenceError> {
        check_rows(rows)?;
        Ok(rows.iter().map(|r| self.row_label(r.as_slice())).collect())
    }

    fn predict_proba(&self, rows: &[FeatureVector]) -> Result<Vec<[f64; 2]>, InferenceError> {
        check_rows(rows)?;
        Ok(rows.iter().map(|r| self.row_proba(r.as_slice())).collect())
    }

    fn describe(&self) -> String {
        match &self.estimator {
            Estimator::Logistic { .. } => format!("logistic regression ({FEATURE_COUNT} features)"),
            Estimator::Forest { trees } => {
                format!("decision forest ({} trees, {FEATURE_COUNT} features)", trees.len())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Option<Vec<String>> {
        Some(FEATURE_NAMES.iter().map(|s| s.to_string()).collect())
    }

    fn row(score: f64) -> FeatureVector {
        let mut v = [0.0; FEATURE_COUNT];
        v[crate::domain::column::BEHAVIORAL_SCORE] = score;
        FeatureVector::from_array(v)
    }

    fn stump(threshold: f64, low: [f64; 2], high: [f64; 2]) -> Tree {
        Tree {
            nodes: vec![
                Node::Split {
                    feature: crate::domain::column::BEHAVIORAL_SCORE,
                    threshold,
                    left: 1,
                    right: 2,
                },
                Node::Leaf { value: low },
                Node::Leaf { value: high },
            ],
        }
    }

    fn score_only_logistic(weight: f64, intercept: f64) -> ExportedModel {
        let mut coefficients = vec![0.0; FEATURE_COUNT];
        coefficients[crate::domain::column::BEHAVIORAL_SCORE] = weight;
        ExportedModel::new(
            names(),
            Estimator::Logistic {
                coefficients,
                intercept,
            },
        )
        .expect("valid model")
    }

    #[test]
    fn test_logistic_probability_and_label() {
        let model = score_only_logistic(1.0, -6.0);

        let proba = model.predict_proba(&[row(6.0), row(8.0)]).expect("proba");
        assert!((proba[0][1] - 0.5).abs() < 1e-12);
        let expected = 1.0 / (1.0 + (-2.0f64).exp());
        assert!((proba[1][1] - expected).abs() < 1e-12);
        assert!((proba[1][0] + proba[1][1] - 1.0).abs() < 1e-12);

        // Decision value of exactly zero is class 0.
        assert_eq!(model.predict(&[row(6.0), row(8.0)]).expect("labels"), vec![0, 1]);
    }

    #[test]
    fn test_forest_averages_normalized_leaves() {
        let model = ExportedModel::new(
            names(),
            Estimator::Forest {
                trees: vec![
                    stump(5.5, [90.0, 10.0], [5.0, 15.0]),
                    stump(7.5, [1.0, 0.0], [0.0, 1.0]),
                ],
            },
        )
        .expect("valid model");

        // score 6: tree1 right -> 0.75, tree2 left -> 0.0 => 0.375
        let p = model.predict_proba(&[row(6.0)]).expect("proba");
        assert!((p[0][1] - 0.375).abs() < 1e-12);
        assert_eq!(model.predict(&[row(6.0)]).expect("label"), vec![0]);

        // score 8: 0.75 and 1.0 => 0.875
        let p = model.predict_proba(&[row(8.0)]).expect("proba");
        assert!((p[0][1] - 0.875).abs() < 1e-12);
        assert_eq!(model.predict(&[row(8.0)]).expect("label"), vec![1]);

        // threshold is inclusive on the left branch
        let p = model.predict_proba(&[row(5.5)]).expect("proba");
        assert!((p[0][1] - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_forest_tie_goes_to_class_zero() {
        let model = ExportedModel::new(
            names(),
            Estimator::Forest {
                trees: vec![stump(5.0, [1.0, 1.0], [1.0, 1.0])],
            },
        )
        .expect("valid model");
        assert_eq!(model.predict(&[row(3.0)]).expect("label"), vec![0]);
    }

    #[test]
    fn test_schema_mismatch_rejected() {
        let estimator = score_only_logistic(1.0, 0.0).estimator().clone();
        let mut swapped = names().expect("names");
        swapped.swap(12, 15);
        assert!(matches!(
            ExportedModel::new(Some(swapped), estimator.clone()),
            Err(ModelError::SchemaMismatch(_))
        ));
        assert!(matches!(
            ExportedModel::new(Some(vec!["age".into()]), estimator),
            Err(ModelError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_coefficient_count_rejected() {
        let model = ExportedModel::new(
            None,
            Estimator::Logistic {
                coefficients: vec![0.5; 17],
                intercept: 0.0,
            },
        );
        assert_eq!(
            model,
            Err(ModelError::CoefficientCount {
                expected: FEATURE_COUNT,
                got: 17
            })
        );
    }

    #[test]
    fn test_invalid_trees_rejected() {
        let backwards = Tree {
            nodes: vec![
                Node::Leaf { value: [1.0, 0.0] },
                Node::Split {
                    feature: 0,
                    threshold: 0.5,
                    left: 0,
                    right: 0,
                },
            ],
        };
        let out_of_schema = Tree {
            nodes: vec![
                Node::Split {
                    feature: FEATURE_COUNT,
                    threshold: 0.5,
                    left: 1,
                    right: 2,
                },
                Node::Leaf { value: [1.0, 0.0] },
                Node::Leaf { value: [0.0, 1.0] },
            ],
        };
        let empty_leaf = Tree {
            nodes: vec![Node::Leaf { value: [0.0, 0.0] }],
        };

        for tree in [backwards, out_of_schema, empty_leaf] {
            let model = ExportedModel::new(names(), Estimator::Forest { trees: vec![tree] });
            assert!(matches!(model, Err(ModelError::InvalidTree { .. })));
        }

        let model = ExportedModel::new(names(), Estimator::Forest { trees: vec![] });
        assert_eq!(model, Err(ModelError::EmptyForest));
    }

    #[test]
    fn test_unvalidated_parameters_never_reach_prediction() {
        // A split pointing past the end of its tree.
        let dangling = Tree {
            nodes: vec![Node::Split {
                feature: 0,
                threshold: 0.5,
                left: 8,
                right: 8,
            }],
        };
        assert!(matches!(
            ExportedModel::new(names(), Estimator::Forest { trees: vec![dangling] }),
            Err(ModelError::InvalidTree { tree: 0, .. })
        ));

        // Too few coefficients would silently drop columns from the dot product.
        let short = serde_json::json!({
            "kind": "logistic",
            "coefficients": [1.0, 1.0, 1.0],
            "intercept": 0.0
        });
        let err = serde_json::from_value::<ExportedModel>(short.clone())
            .expect_err("direct deserialization validates");
        assert!(err.to_string().contains("Expected 19 coefficients, got 3"));

        let bytes = serde_json::to_vec(&short).expect("serialize");
        assert_eq!(
            ExportedModel::from_json(&bytes),
            Err(ModelError::CoefficientCount {
                expected: FEATURE_COUNT,
                got: 3
            })
        );
    }

    #[test]
    fn test_serialized_model_reloads() {
        let model = score_only_logistic(0.5, -3.0);
        let bytes = serde_json::to_vec(&model).expect("serialize");
        assert_eq!(ExportedModel::from_json(&bytes).expect("reload"), model);
    }

    #[test]
    fn test_non_finite_input_rejected() {
        let model = score_only_logistic(1.0, 0.0);
        let mut v = [0.0; FEATURE_COUNT];
        v[10] = f64::NAN;
        let err = model
            .predict_proba(&[FeatureVector::from_array(v)])
            .expect_err("NaN age");
        assert!(matches!(err, InferenceError::MalformedInput(_)));
        assert!(err.to_string().contains("age"));
    }

    #[test]
    fn test_parse_json_export() {
        let json = serde_json::json!({
            "kind": "forest",
            "feature_names": FEATURE_NAMES,
            "trees": [{
                "nodes": [
                    {"feature": 17, "threshold": 6.5, "left": 1, "right": 2},
                    {"value": [120.0, 3.0]},
                    {"value": [2.0, 40.0]}
                ]
            }]
        });
        let bytes = serde_json::to_vec(&json).expect("serialize");
        let model = ExportedModel::from_json(&bytes).expect("valid export");
        assert!(model.describe().contains("1 trees"));

        let json = serde_json::json!({"kind": "svm", "support": []});
        let bytes = serde_json::to_vec(&json).expect("serialize");
        assert!(matches!(
            ExportedModel::from_json(&bytes),
            Err(ModelError::Parse(_))
        ));
    }
}
