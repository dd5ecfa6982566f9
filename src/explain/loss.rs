//! Loss functions for model comparison and permutation importance
//!
//! All losses are means over observations, so values are comparable across
//! datasets of different sizes. Poisson deviance takes a logarithm of the
//! predictions: a non-positive prediction is a hard `InvalidLoss` error,
//! never a silent NaN.

use crate::error::{ClaimLensError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Loss function over true counts and predicted counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Loss {
    /// Mean squared error
    SquaredError,
    /// Root mean squared error
    Rmse,
    /// Mean Poisson deviance; requires strictly positive predictions
    PoissonDeviance,
}

impl Loss {
    /// Compute the loss. `ShapeMismatch` when the vectors disagree on
    /// length, `InvalidLoss` when a deviance sees a non-positive prediction.
    pub fn compute(&self, y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
        if y_true.len() != y_pred.len() {
            return Err(ClaimLensError::ShapeMismatch {
                data_rows: y_pred.len(),
                label_rows: y_true.len(),
            });
        }
        if y_true.is_empty() {
            return Err(ClaimLensError::InvalidLoss(
                "loss over zero observations".to_string(),
            ));
        }

        let n = y_true.len() as f64;
        match self {
            Loss::SquaredError => {
                let sse: f64 = y_true
                    .iter()
                    .zip(y_pred.iter())
                    .map(|(t, p)| (t - p) * (t - p))
                    .sum();
                Ok(sse / n)
            }
            Loss::Rmse => {
                let mse = Loss::SquaredError.compute(y_true, y_pred)?;
                Ok(mse.sqrt())
            }
            Loss::PoissonDeviance => {
                let mut total = 0.0;
                for (i, (&y, &mu)) in y_true.iter().zip(y_pred.iter()).enumerate() {
                    if !mu.is_finite() || mu <= 0.0 {
                        return Err(ClaimLensError::InvalidLoss(format!(
                            "Poisson deviance needs positive predictions, got {mu} at row {i}"
                        )));
                    }
                    // unit deviance: 2 * (y * ln(y / mu) - (y - mu)), with the
                    // y = 0 limit 2 * mu
                    total += if y > 0.0 {
                        2.0 * (y * (y / mu).ln() - (y - mu))
                    } else {
                        2.0 * mu
                    };
                }
                Ok(total / n)
            }
        }
    }
}
