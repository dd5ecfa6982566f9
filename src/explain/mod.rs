//! Model-agnostic explanation engines
//!
//! Everything here consumes fitted models through the [`Explainer`]
//! adapter only:
//! - Model performance and residuals
//! - Permutation variable importance
//! - Prediction breakdown (local attribution)
//! - Ceteris-paribus profiles and partial dependence
//! - Nearest-neighbour selection for localized profiles

mod adapter;
mod breakdown;
mod importance;
mod loss;
mod performance;
mod profile;

pub use adapter::Explainer;
pub use breakdown::{BreakDown, BreakdownResult, Contribution, ContributionOrder};
pub use importance::{FeatureImportance, ImportanceResult, PermutationImportance};
pub use loss::Loss;
pub use performance::PerformanceResult;
pub use profile::{
    select_neighbours, CeterisParibus, PdpPoint, PdpResult, ProfilePoint, ProfileResult,
};
