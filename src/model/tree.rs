//! Predict-only gradient-boosted tree ensembles
//!
//! Fitted ensembles enter the crate as parameter structures built elsewhere;
//! this module only evaluates them. Splits reference columns by name, test
//! either a numeric threshold or a categorical level set, and each tree
//! yields a leaf value. The ensemble output is a margin:
//! `base_score + shrinkage * sum(tree outputs)`. Whether that margin is a
//! per-exposure rate or a log-rate is decided by the predictor family that
//! wraps the ensemble.

use crate::data::{Column, Frame};
use crate::error::{ClaimLensError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Split test at an internal node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SplitTest {
    /// Numeric split: rows with value <= threshold go left
    Threshold(f64),
    /// Categorical split: rows whose level is in the set go left.
    /// Levels the fitted model never saw fall through to the right branch.
    Levels(Vec<String>),
}

/// Node of a fitted decision tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: String,
        test: SplitTest,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    /// Leaf constructor
    pub fn leaf(value: f64) -> Self {
        TreeNode::Leaf { value }
    }

    /// Split constructor
    pub fn split(
        feature: impl Into<String>,
        test: SplitTest,
        left: TreeNode,
        right: TreeNode,
    ) -> Self {
        TreeNode::Split {
            feature: feature.into(),
            test,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn evaluate(&self, frame: &Frame, row: usize) -> Result<f64> {
        match self {
            TreeNode::Leaf { value } => Ok(*value),
            TreeNode::Split {
                feature,
                test,
                left,
                right,
            } => {
                let goes_left = match (test, frame.column(feature)?) {
                    (SplitTest::Threshold(t), Column::Numeric(v)) => v[row] <= *t,
                    (SplitTest::Levels(set), Column::Categorical(v)) => {
                        set.iter().any(|level| level == &v[row])
                    }
                    (SplitTest::Threshold(_), Column::Categorical(_)) => {
                        return Err(ClaimLensError::DataError(format!(
                            "threshold split on categorical column {feature}"
                        )))
                    }
                    (SplitTest::Levels(_), Column::Numeric(_)) => {
                        return Err(ClaimLensError::DataError(format!(
                            "level split on numeric column {feature}"
                        )))
                    }
                };
                if goes_left {
                    left.evaluate(frame, row)
                } else {
                    right.evaluate(frame, row)
                }
            }
        }
    }
}

/// A fitted boosted ensemble of trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    trees: Vec<TreeNode>,
    base_score: f64,
    shrinkage: f64,
}

impl TreeEnsemble {
    /// Create an ensemble with its fitted base score and shrinkage
    pub fn new(base_score: f64, shrinkage: f64) -> Self {
        Self {
            trees: Vec::new(),
            base_score,
            shrinkage,
        }
    }

    /// Append a fitted tree
    pub fn with_tree(mut self, tree: TreeNode) -> Self {
        self.trees.push(tree);
        self
    }

    /// Number of trees in the ensemble
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Raw ensemble margin per row: base score plus the shrunken tree sum
    pub fn margins(&self, frame: &Frame) -> Result<Array1<f64>> {
        let n = frame.n_rows();
        let mut out = Array1::from_elem(n, self.base_score);
        for i in 0..n {
            for tree in &self.trees {
                out[i] += self.shrinkage * tree.evaluate(frame, i)?;
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Column;

    fn frame() -> Frame {
        Frame::new(vec![
            (
                "DriverAge".to_string(),
                Column::Numeric(vec![25.0, 60.0]),
            ),
            (
                "Region".to_string(),
                Column::Categorical(vec!["Urban".into(), "Rural".into()]),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_threshold_routing() {
        let tree = TreeNode::split(
            "DriverAge",
            SplitTest::Threshold(30.0),
            TreeNode::leaf(1.0),
            TreeNode::leaf(-1.0),
        );
        let ensemble = TreeEnsemble::new(0.0, 1.0).with_tree(tree);
        let margins = ensemble.margins(&frame()).unwrap();
        assert_eq!(margins[0], 1.0);
        assert_eq!(margins[1], -1.0);
    }

    #[test]
    fn test_level_routing_and_unseen_level() {
        let tree = TreeNode::split(
            "Region",
            SplitTest::Levels(vec!["Urban".to_string()]),
            TreeNode::leaf(2.0),
            TreeNode::leaf(3.0),
        );
        let ensemble = TreeEnsemble::new(0.0, 1.0).with_tree(tree);
        let margins = ensemble.margins(&frame()).unwrap();
        assert_eq!(margins[0], 2.0);
        // "Rural" is not in the level set: falls through right
        assert_eq!(margins[1], 3.0);
    }

    #[test]
    fn test_base_score_and_shrinkage() {
        let ensemble = TreeEnsemble::new(0.5, 0.1)
            .with_tree(TreeNode::leaf(1.0))
            .with_tree(TreeNode::leaf(2.0));
        let margins = ensemble.margins(&frame()).unwrap();
        assert!((margins[0] - (0.5 + 0.1 * 3.0)).abs() < 1e-12);
    }

    #[test]
    fn test_split_kind_mismatch() {
        let tree = TreeNode::split(
            "Region",
            SplitTest::Threshold(1.0),
            TreeNode::leaf(0.0),
            TreeNode::leaf(1.0),
        );
        let ensemble = TreeEnsemble::new(0.0, 1.0).with_tree(tree);
        assert!(ensemble.margins(&frame()).is_err());
    }

    #[test]
    fn test_unknown_feature_in_split() {
        let tree = TreeNode::split(
            "BonusMalus",
            SplitTest::Threshold(1.0),
            TreeNode::leaf(0.0),
            TreeNode::leaf(1.0),
        );
        let ensemble = TreeEnsemble::new(0.0, 1.0).with_tree(tree);
        assert!(matches!(
            ensemble.margins(&frame()).unwrap_err(),
            ClaimLensError::UnknownFeature(_)
        ));
    }
}
