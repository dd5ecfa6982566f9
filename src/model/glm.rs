//! Predict-only log-link Poisson GLM
//!
//! Holds fitted coefficients: an intercept plus one term per numeric
//! feature or per (categorical feature, level) indicator. The linear
//! predictor is mapped through the log link, so the model predicts a
//! claims rate per unit exposure; the exposure offset is applied by the
//! predictor dispatch, not here.

use crate::data::{Column, Frame};
use crate::error::{ClaimLensError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// One fitted term of the linear predictor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GlmTerm {
    /// Coefficient on a numeric feature
    Numeric { feature: String, coefficient: f64 },
    /// Coefficient on a categorical level indicator. Levels without a term
    /// (including levels the fit never saw) contribute the reference level,
    /// i.e. zero.
    Level {
        feature: String,
        level: String,
        coefficient: f64,
    },
}

/// A fitted Poisson GLM with log link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoissonGlm {
    intercept: f64,
    terms: Vec<GlmTerm>,
}

impl PoissonGlm {
    /// Create a GLM from its fitted intercept
    pub fn new(intercept: f64) -> Self {
        Self {
            intercept,
            terms: Vec::new(),
        }
    }

    /// Add a fitted numeric term
    pub fn with_numeric(mut self, feature: impl Into<String>, coefficient: f64) -> Self {
        self.terms.push(GlmTerm::Numeric {
            feature: feature.into(),
            coefficient,
        });
        self
    }

    /// Add a fitted categorical level term
    pub fn with_level(
        mut self,
        feature: impl Into<String>,
        level: impl Into<String>,
        coefficient: f64,
    ) -> Self {
        self.terms.push(GlmTerm::Level {
            feature: feature.into(),
            level: level.into(),
            coefficient,
        });
        self
    }

    /// Predicted claims rate per unit exposure, one per row
    pub fn predict_rate(&self, frame: &Frame) -> Result<Array1<f64>> {
        let n = frame.n_rows();
        let mut eta = Array1::from_elem(n, self.intercept);

        for term in &self.terms {
            match term {
                GlmTerm::Numeric {
                    feature,
                    coefficient,
                } => {
                    let values = frame.numeric(feature)?;
                    for i in 0..n {
                        eta[i] += coefficient * values[i];
                    }
                }
                GlmTerm::Level {
                    feature,
                    level,
                    coefficient,
                } => match frame.column(feature)? {
                    Column::Categorical(values) => {
                        for i in 0..n {
                            if &values[i] == level {
                                eta[i] += coefficient;
                            }
                        }
                    }
                    Column::Numeric(_) => {
                        return Err(ClaimLensError::DataError(format!(
                            "level term on numeric column {feature}"
                        )))
                    }
                },
            }
        }

        Ok(eta.mapv(f64::exp))
    }
}
