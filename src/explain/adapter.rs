//! The explainer adapter
//!
//! Wraps one fitted predictor together with its reference data, ground-truth
//! labels, schema and a display label. All explanation engines consume
//! models exclusively through this adapter, which is what keeps them
//! model-agnostic: nothing downstream ever touches a family's native
//! prediction path.

use crate::data::{Frame, Schema};
use crate::error::{ClaimLensError, Result};
use crate::model::Predictor;
use ndarray::Array1;
use std::sync::Arc;
use tracing::debug;

/// A fitted model bound to its reference dataset and labels.
///
/// The reference data and labels are shared by `Arc`, not copied: every
/// engine working off the same explainer reads the same table. The adapter
/// is immutable after construction.
#[derive(Debug, Clone)]
pub struct Explainer {
    predictor: Predictor,
    schema: Schema,
    data: Arc<Frame>,
    labels: Arc<Array1<f64>>,
    label: String,
}

impl Explainer {
    /// Bind a fitted predictor to its reference data.
    ///
    /// Validates once, up front: row counts of data and labels must align
    /// (`ShapeMismatch` otherwise), the frame must conform to the declared
    /// schema, and every exposure weight must be strictly positive.
    pub fn new(
        predictor: Predictor,
        schema: Schema,
        data: Arc<Frame>,
        labels: Arc<Array1<f64>>,
        label: impl Into<String>,
    ) -> Result<Self> {
        if data.n_rows() != labels.len() {
            return Err(ClaimLensError::ShapeMismatch {
                data_rows: data.n_rows(),
                label_rows: labels.len(),
            });
        }
        if data.n_rows() == 0 {
            return Err(ClaimLensError::DataError(
                "reference dataset is empty".to_string(),
            ));
        }
        data.conforms(&schema)?;

        let label = label.into();
        debug!(
            label = %label,
            family = predictor.family(),
            rows = data.n_rows(),
            "explainer constructed"
        );

        Ok(Self {
            predictor,
            schema,
            data,
            labels,
            label,
        })
    }

    /// Display label identifying this model in reports
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Declared schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Reference dataset
    pub fn data(&self) -> &Arc<Frame> {
        &self.data
    }

    /// Ground-truth labels aligned with the reference dataset
    pub fn labels(&self) -> &Array1<f64> {
        &self.labels
    }

    /// Predict claim counts for an arbitrary frame through the wrapped model
    pub fn predict(&self, frame: &Frame) -> Result<Array1<f64>> {
        self.predictor.predict(frame, self.schema.exposure())
    }

    /// Predictions over the reference dataset
    pub fn predict_reference(&self) -> Result<Array1<f64>> {
        self.predict(&self.data)
    }

    /// Mean prediction over the reference dataset
    pub fn baseline(&self) -> Result<f64> {
        let preds = self.predict_reference()?;
        Ok(preds.mean().unwrap_or(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Column, Frame, Schema};
    use crate::model::PoissonGlm;
    use ndarray::array;

    fn schema() -> Schema {
        Schema::new("ClaimNb", "Exposure").with_numeric("CarAge")
    }

    fn frame() -> Frame {
        Frame::new(vec![
            ("CarAge".to_string(), Column::Numeric(vec![1.0, 10.0])),
            ("Exposure".to_string(), Column::Numeric(vec![1.0, 1.0])),
        ])
        .unwrap()
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let result = Explainer::new(
            Predictor::Glm(PoissonGlm::new(0.0)),
            schema(),
            Arc::new(frame()),
            Arc::new(array![0.0]),
            "glm",
        );
        assert!(matches!(
            result.unwrap_err(),
            ClaimLensError::ShapeMismatch { .. }
        ));
    }

    #[test]
    fn test_prediction_length_matches_reference() {
        let explainer = Explainer::new(
            Predictor::Glm(PoissonGlm::new(0.0)),
            schema(),
            Arc::new(frame()),
            Arc::new(array![0.0, 2.0]),
            "glm",
        )
        .unwrap();
        let preds = explainer.predict_reference().unwrap();
        assert_eq!(preds.len(), explainer.data().n_rows());
    }

    #[test]
    fn test_baseline_is_mean_prediction() {
        let explainer = Explainer::new(
            Predictor::Glm(PoissonGlm::new(0.0)),
            schema(),
            Arc::new(frame()),
            Arc::new(array![0.0, 2.0]),
            "glm",
        )
        .unwrap();
        // intercept-only GLM at exposure 1.0 predicts exactly 1.0 per row
        assert!((explainer.baseline().unwrap() - 1.0).abs() < 1e-12);
    }
}
