//! Error types for the claimlens crate

use thiserror::Error;

/// Result type alias using ClaimLensError
pub type Result<T> = std::result::Result<T, ClaimLensError>;

/// Errors surfaced by the data layer, model predictors and explanation engines
#[derive(Debug, Error)]
pub enum ClaimLensError {
    /// Data and labels disagree on row count
    #[error("shape mismatch: data has {data_rows} rows but labels have {label_rows}")]
    ShapeMismatch {
        data_rows: usize,
        label_rows: usize,
    },

    /// A feature name was requested that the dataset does not carry
    #[error("unknown feature: {0}")]
    UnknownFeature(String),

    /// A loss function was invoked on predictions outside its domain
    #[error("invalid loss input: {0}")]
    InvalidLoss(String),

    /// An exposure weight violated the strictly-positive invariant
    #[error("invalid exposure weight: {0}")]
    InvalidWeight(String),

    /// Malformed or inconsistent tabular data
    #[error("data error: {0}")]
    DataError(String),
}
