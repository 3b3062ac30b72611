//! Regression model artifacts: linear models and decision tree ensembles.
//!
//! Tree nodes use the flat array layout of fitted scikit-learn trees:
//! node `i` is a leaf when `children_left[i] == -1`, otherwise a sample goes
//! left when `x[feature[i]] <= threshold[i]`.

use serde::{Deserialize, Serialize};

use crate::ports::{ModelError, Regressor};

const LEAF: i64 = -1;

fn default_learning_rate() -> f64 {
    1.0
}

/// How per-tree outputs are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Random forest: average of the trees.
    Mean,
    /// Gradient boosting: learning-rate weighted sum of the trees.
    Sum,
}

/// A single fitted regression tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    children_left: Vec<i64>,
    children_right: Vec<i64>,
    feature: Vec<i64>,
    threshold: Vec<f64>,
    value: Vec<f64>,
}

impl DecisionTree {
    fn validate(&self) -> Result<(), String> {
        let n = self.children_left.len();
        if n == 0 {
            return Err("tree has no nodes".into());
        }
        if self.children_right.len() != n
            || self.feature.len() != n
            || self.threshold.len() != n
            || self.value.len() != n
        {
            return Err("tree node arrays differ in length".into());
        }

        for i in 0..n {
            let (left, right) = (self.children_left[i], self.children_right[i]);
            if left == LEAF {
                if right != LEAF {
                    return Err(format!("node {i} has only one child"));
                }
                if !self.value[i].is_finite() {
                    return Err(format!("leaf {i} has a non-finite value"));
                }
                continue;
            }
            // Children always follow their parent, so traversal terminates.
            for child in [left, right] {
                if child <= i as i64 || child >= n as i64 {
                    return Err(format!("node {i} has invalid child index {child}"));
                }
            }
            if self.feature[i] < 0 {
                return Err(format!("node {i} has invalid feature index"));
            }
            if !self.threshold[i].is_finite() {
                return Err(format!("node {i} has a non-finite threshold"));
            }
        }
        Ok(())
    }

    /// Largest feature index referenced by a split node.
    fn max_feature(&self) -> Option<usize> {
        self.children_left
            .iter()
            .zip(&self.feature)
            .filter(|(left, _)| **left != LEAF)
            .filter_map(|(_, f)| usize::try_from(*f).ok())
            .max()
    }

    fn predict(&self, features: &[f64]) -> Result<f64, ModelError> {
        let mut node = 0usize;
        for _ in 0..self.children_left.len() {
            let left = self.children_left.get(node).copied().unwrap_or(LEAF);
            if left == LEAF {
                break;
            }
            let index = usize::try_from(self.feature[node]).unwrap_or(usize::MAX);
            let x = features
                .get(index)
                .copied()
                .ok_or(ModelError::DimensionMismatch {
                    expected: index.saturating_add(1),
                    actual: features.len(),
                })?;
            let next = if x <= self.threshold[node] {
                left
            } else {
                self.children_right[node]
            };
            node = usize::try_from(next).unwrap_or(usize::MAX);
        }

        self.value
            .get(node)
            .copied()
            .ok_or(ModelError::DimensionMismatch {
                expected: node,
                actual: self.value.len(),
            })
    }
}

/// Ensemble of regression trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEnsemble {
    pub aggregation: Aggregation,
    #[serde(default)]
    pub base_score: f64,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    pub trees: Vec<DecisionTree>,
}

/// Fitted score regressor loaded from `<subject>_model.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegressionModel {
    Linear {
        coefficients: Vec<f64>,
        intercept: f64,
    },
    TreeEnsemble(TreeEnsemble),
}

impl RegressionModel {
    pub(crate) fn validate(&self) -> Result<(), String> {
        match self {
            Self::Linear {
                coefficients,
                intercept,
            } => {
                if coefficients.is_empty() {
                    return Err("linear model has no coefficients".into());
                }
                if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
                    return Err("linear model parameters must be finite".into());
                }
            }
            Self::TreeEnsemble(ensemble) => {
                if ensemble.trees.is_empty() {
                    return Err("tree ensemble has no trees".into());
                }
                if !ensemble.base_score.is_finite() || !ensemble.learning_rate.is_finite() {
                    return Err("tree ensemble parameters must be finite".into());
                }
                for (i, tree) in ensemble.trees.iter().enumerate() {
                    tree.validate().map_err(|reason| format!("tree {i}: {reason}"))?;
                }
            }
        }
        Ok(())
    }
}

impl Regressor for RegressionModel {
    fn supports_input_width(&self, width: usize) -> bool {
        match self {
            Self::Linear { coefficients, .. } => coefficients.len() == width,
            Self::TreeEnsemble(ensemble) => ensemble
                .trees
                .iter()
                .filter_map(DecisionTree::max_feature)
                .all(|f| f < width),
        }
    }

    fn predict(&self, features: &[f64]) -> Result<f64, ModelError> {
        match self {
            Self::Linear {
                coefficients,
                intercept,
            } => {
                if coefficients.len() != features.len() {
                    return Err(ModelError::DimensionMismatch {
                        expected: coefficients.len(),
                        actual: features.len(),
                    });
                }
                let dot: f64 = coefficients.iter().zip(features).map(|(c, x)| c * x).sum();
                Ok(dot + intercept)
            }
            Self::TreeEnsemble(ensemble) => {
                let mut total = 0.0;
                for tree in &ensemble.trees {
                    total += tree.predict(features)?;
                }
                let combined = match ensemble.aggregation {
                    Aggregation::Mean => total / ensemble.trees.len() as f64,
                    Aggregation::Sum => ensemble.learning_rate * total,
                };
                Ok(ensemble.base_score + combined)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Stump splitting on feature 0 at 0.5: left leaf 40, right leaf 80.
    fn stump(left: f64, right: f64) -> DecisionTree {
        DecisionTree {
            children_left: vec![1, -1, -1],
            children_right: vec![2, -1, -1],
            feature: vec![0, -2, -2],
            threshold: vec![0.5, -2.0, -2.0],
            value: vec![60.0, left, right],
        }
    }

    #[test]
    fn test_linear_predict() {
        let model = RegressionModel::Linear {
            coefficients: vec![2.0, -1.0, 0.5],
            intercept: 10.0,
        };
        let y = model.predict(&[1.0, 2.0, 4.0]).expect("Should predict");
        assert!((y - 12.0).abs() < 1e-9);
        assert!(model.supports_input_width(3));
        assert!(!model.supports_input_width(4));
    }

    #[test]
    fn test_linear_dimension_mismatch() {
        let model = RegressionModel::Linear {
            coefficients: vec![1.0, 1.0],
            intercept: 0.0,
        };
        assert_eq!(
            model.predict(&[1.0]),
            Err(ModelError::DimensionMismatch {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_tree_traversal() {
        let tree = stump(40.0, 80.0);
        tree.validate().expect("valid");
        assert_eq!(tree.predict(&[0.0]).expect("left"), 40.0);
        assert_eq!(tree.predict(&[0.5]).expect("boundary goes left"), 40.0);
        assert_eq!(tree.predict(&[1.0]).expect("right"), 80.0);
    }

    #[test]
    fn test_forest_mean() {
        let model = RegressionModel::TreeEnsemble(TreeEnsemble {
            aggregation: Aggregation::Mean,
            base_score: 0.0,
            learning_rate: 1.0,
            trees: vec![stump(40.0, 80.0), stump(50.0, 90.0)],
        });
        model.validate().expect("valid");
        assert!((model.predict(&[1.0]).expect("predict") - 85.0).abs() < 1e-9);
        assert!(model.supports_input_width(1));
        assert!(!model.supports_input_width(0));
    }

    #[test]
    fn test_boosting_sum() {
        let model = RegressionModel::TreeEnsemble(TreeEnsemble {
            aggregation: Aggregation::Sum,
            base_score: 66.0,
            learning_rate: 0.1,
            trees: vec![stump(-10.0, 10.0), stump(-20.0, 20.0)],
        });
        assert!((model.predict(&[0.0]).expect("predict") - 63.0).abs() < 1e-9);
    }

    #[test]
    fn test_tree_missing_feature() {
        let tree = stump(40.0, 80.0);
        assert_eq!(
            tree.predict(&[]),
            Err(ModelError::DimensionMismatch {
                expected: 1,
                actual: 0
            })
        );
    }

    #[test]
    fn test_tree_validation_rejects_cycles() {
        let mut tree = stump(40.0, 80.0);
        tree.children_left[0] = 0;
        assert!(tree.validate().is_err());

        let mut half_leaf = stump(40.0, 80.0);
        half_leaf.children_right[1] = 2;
        assert!(half_leaf.validate().is_err());
    }

    #[test]
    fn test_deserialize_tagged() {
        let json = r#"{"kind": "linear", "coefficients": [1.5], "intercept": 3.0}"#;
        let model: RegressionModel = serde_json::from_str(json).expect("Should parse");
        assert!((model.predict(&[2.0]).expect("predict") - 6.0).abs() < 1e-9);

        let json = r#"{
            "kind": "tree_ensemble",
            "aggregation": "sum",
            "base_score": 50.0,
            "trees": [{
                "children_left": [-1],
                "children_right": [-1],
                "feature": [-2],
                "threshold": [-2.0],
                "value": [5.0]
            }]
        }"#;
        let model: RegressionModel = serde_json::from_str(json).expect("Should parse");
        model.validate().expect("valid");
        assert!((model.predict(&[]).expect("predict") - 55.0).abs() < 1e-9);
    }
}
