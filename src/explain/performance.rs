//! Model performance and residuals
//!
//! Computes the residual vector and summary accuracy measures of an
//! explainer over its reference data. The residuals feed the
//! residual-distribution plots used to compare models side by side.

use super::{Explainer, Loss};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Performance of one explainer on its reference data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceResult {
    /// Label of the explainer
    pub label: String,
    /// Raw residuals `y - prediction`, one per reference row
    pub residuals: Vec<f64>,
    /// Mean squared error
    pub mse: f64,
    /// Root mean squared error
    pub rmse: f64,
    /// Mean absolute error
    pub mae: f64,
    /// Mean Poisson deviance, when every prediction is positive
    pub poisson_deviance: Option<f64>,
}

impl PerformanceResult {
    /// Compute performance for an explainer
    pub fn compute(explainer: &Explainer) -> Result<Self> {
        let predictions = explainer.predict_reference()?;
        let labels = explainer.labels();

        let residuals: Vec<f64> = labels
            .iter()
            .zip(predictions.iter())
            .map(|(y, p)| y - p)
            .collect();

        let n = residuals.len() as f64;
        let mse = residuals.iter().map(|r| r * r).sum::<f64>() / n;
        let mae = residuals.iter().map(|r| r.abs()).sum::<f64>() / n;
        // a rate-scale ensemble may legitimately emit non-positive
        // predictions; the deviance is simply unavailable then
        let poisson_deviance = Loss::PoissonDeviance.compute(labels, &predictions).ok();

        Ok(Self {
            label: explainer.label().to_string(),
            residuals,
            mse,
            rmse: mse.sqrt(),
            mae,
            poisson_deviance,
        })
    }

    /// Residuals sorted ascending, for quantile-style displays
    pub fn sorted_residuals(&self) -> Vec<f64> {
        let mut sorted = self.residuals.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        sorted
    }
}
