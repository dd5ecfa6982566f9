//! claimlens - Model-agnostic explainability for claims-frequency models
//!
//! This crate wraps heterogeneous fitted count-regression models (a
//! Poisson GLM and two styles of gradient-boosted tree ensembles) behind
//! one uniform explainer adapter and computes the diagnostic tables a
//! claims-frequency analysis consumes.
//!
//! # Modules
//!
//! - [`data`] - Typed schema, column-major frames, CSV ingestion
//! - [`model`] - Fitted predictors, dispatched by an explicit family tag
//! - [`explain`] - The explainer adapter and the explanation engines:
//!   model performance and residuals, permutation variable importance,
//!   prediction breakdown, ceteris-paribus profiles and partial dependence
//!
//! Every engine returns a row-oriented, serializable table meant for an
//! external plotting collaborator; nothing here renders anything.
//!
//! # Example
//!
//! ```
//! use claimlens::data::{Column, Frame, Schema};
//! use claimlens::explain::{Explainer, Loss, PermutationImportance};
//! use claimlens::model::{PoissonGlm, Predictor};
//! use ndarray::array;
//! use std::sync::Arc;
//!
//! let schema = Schema::new("ClaimNb", "Exposure").with_numeric("CarAge");
//! let data = Frame::new(vec![
//!     ("CarAge".to_string(), Column::Numeric(vec![1.0, 10.0])),
//!     ("Exposure".to_string(), Column::Numeric(vec![1.0, 1.0])),
//! ])
//! .unwrap();
//!
//! let glm = PoissonGlm::new(-1.0).with_numeric("CarAge", 0.1);
//! let explainer = Explainer::new(
//!     Predictor::Glm(glm),
//!     schema,
//!     Arc::new(data),
//!     Arc::new(array![0.0, 2.0]),
//!     "frequency glm",
//! )
//! .unwrap();
//!
//! let importance = PermutationImportance::new(Loss::PoissonDeviance)
//!     .with_seed(42)
//!     .compute(&explainer)
//!     .unwrap();
//! assert_eq!(importance.records.len(), 1);
//! ```

pub mod data;
pub mod error;
pub mod explain;
pub mod model;

pub use crate::error::{ClaimLensError, Result};
