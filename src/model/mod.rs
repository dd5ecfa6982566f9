//! Fitted model predictors
//!
//! The three model families the analysis compares (a Poisson GLM and two
//! styles of gradient-boosted tree ensembles) are held behind one tagged
//! [`Predictor`] enum rather than ad-hoc prediction closures. Dispatch is
//! explicit per family, and every family's output is brought onto the same
//! scale: predicted claim COUNTS, already rescaled by the exposure column.

mod glm;
mod tree;

pub use glm::{GlmTerm, PoissonGlm};
pub use tree::{SplitTest, TreeEnsemble, TreeNode};

use crate::data::Frame;
use crate::error::Result;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// A fitted model, tagged by family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predictor {
    /// Log-link Poisson GLM; predicts a rate per unit exposure
    Glm(PoissonGlm),
    /// Boosted ensemble whose margin is already a rate per unit exposure
    Gbm(TreeEnsemble),
    /// Boosted ensemble whose margin is a log-rate, exponentiated before
    /// rescaling
    Boosted(TreeEnsemble),
}

impl Predictor {
    /// Short family tag, used in logs and report labels
    pub fn family(&self) -> &'static str {
        match self {
            Predictor::Glm(_) => "glm",
            Predictor::Gbm(_) => "gbm",
            Predictor::Boosted(_) => "boosted",
        }
    }

    /// Predicted claim counts, one per row, in response units.
    /// `exposure` names the weight column used to rescale rates.
    pub fn predict(&self, frame: &Frame, exposure: &str) -> Result<Array1<f64>> {
        let rates = match self {
            Predictor::Glm(model) => model.predict_rate(frame)?,
            Predictor::Gbm(model) => model.margins(frame)?,
            Predictor::Boosted(model) => model.margins(frame)?.mapv(f64::exp),
        };
        let weights = frame.numeric(exposure)?;
        let mut counts = rates;
        for (i, &w) in weights.iter().enumerate() {
            counts[i] *= w;
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Column;

    fn frame() -> Frame {
        Frame::new(vec![
            ("CarAge".to_string(), Column::Numeric(vec![1.0, 10.0])),
            ("Exposure".to_string(), Column::Numeric(vec![0.5, 2.0])),
        ])
        .unwrap()
    }

    #[test]
    fn test_glm_rescales_by_exposure() {
        let predictor = Predictor::Glm(PoissonGlm::new(0.0));
        let counts = predictor.predict(&frame(), "Exposure").unwrap();
        assert_eq!(counts.len(), 2);
        assert!((counts[0] - 0.5).abs() < 1e-12);
        assert!((counts[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_gbm_margin_is_rate() {
        let ensemble = TreeEnsemble::new(0.2, 1.0);
        let predictor = Predictor::Gbm(ensemble);
        let counts = predictor.predict(&frame(), "Exposure").unwrap();
        assert!((counts[0] - 0.1).abs() < 1e-12);
        assert!((counts[1] - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_boosted_margin_is_log_rate() {
        let ensemble = TreeEnsemble::new(0.0, 1.0);
        let predictor = Predictor::Boosted(ensemble);
        let counts = predictor.predict(&frame(), "Exposure").unwrap();
        // exp(0) = 1 rate, times exposure
        assert!((counts[0] - 0.5).abs() < 1e-12);
        assert!((counts[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_family_tags() {
        assert_eq!(Predictor::Glm(PoissonGlm::new(0.0)).family(), "glm");
        assert_eq!(
            Predictor::Gbm(TreeEnsemble::new(0.0, 1.0)).family(),
            "gbm"
        );
        assert_eq!(
            Predictor::Boosted(TreeEnsemble::new(0.0, 1.0)).family(),
            "boosted"
        );
    }
}
