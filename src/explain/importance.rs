//! Permutation variable importance
//!
//! Measures each feature's contribution to predictive accuracy: shuffle the
//! feature's column, re-predict, and record how much the loss rises. The
//! reported convention is the DIFFERENCE `permuted - baseline`; the raw
//! permuted and baseline losses are kept on every record so a ratio can be
//! derived downstream.

use super::{Explainer, Loss};
use crate::error::Result;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Permutation importance engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermutationImportance {
    loss: Loss,
    n_repeats: usize,
    features: Option<Vec<String>>,
    seed: Option<u64>,
}

impl PermutationImportance {
    /// Create an engine using the given loss
    pub fn new(loss: Loss) -> Self {
        Self {
            loss,
            n_repeats: 10,
            features: None,
            seed: None,
        }
    }

    /// Number of shuffle trials averaged per feature (clamped to >= 1)
    pub fn with_n_repeats(mut self, n: usize) -> Self {
        self.n_repeats = n.max(1);
        self
    }

    /// Restrict to an explicit feature list. Defaults to the schema's
    /// explanatory features; the exposure column is structurally required
    /// by prediction and is never permuted by default.
    pub fn with_features(mut self, features: Vec<String>) -> Self {
        self.features = Some(features);
        self
    }

    /// Seed for reproducible shuffles
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Compute importance for every feature, in the supplied feature order
    pub fn compute(&self, explainer: &Explainer) -> Result<ImportanceResult> {
        let features: Vec<String> = match &self.features {
            Some(features) => features.clone(),
            None => explainer.schema().explanatory().map(str::to_string).collect(),
        };

        // fail fast on unknown names before spending prediction time
        for feature in &features {
            explainer.data().column(feature)?;
        }

        let baseline_preds = explainer.predict_reference()?;
        let baseline_loss = self.loss.compute(explainer.labels(), &baseline_preds)?;

        debug!(
            label = explainer.label(),
            n_features = features.len(),
            n_repeats = self.n_repeats,
            baseline_loss,
            "computing permutation importance"
        );

        // Features are independent of each other; each gets its own RNG
        // stream derived from the seed so results do not depend on the
        // parallel schedule.
        let records: Vec<FeatureImportance> = features
            .par_iter()
            .enumerate()
            .map(|(idx, feature)| -> Result<FeatureImportance> {
                let mut rng = match self.seed {
                    Some(seed) => {
                        Xoshiro256PlusPlus::seed_from_u64(seed.wrapping_add(idx as u64))
                    }
                    None => Xoshiro256PlusPlus::from_entropy(),
                };

                let mut working = explainer.data().as_ref().clone();
                let mut total = 0.0;
                for _ in 0..self.n_repeats {
                    working.shuffle_column(feature, &mut rng)?;
                    let preds = explainer.predict(&working)?;
                    total += self.loss.compute(explainer.labels(), &preds)?;
                }
                let permuted_loss = total / self.n_repeats as f64;

                Ok(FeatureImportance {
                    feature: feature.clone(),
                    baseline_loss,
                    permuted_loss,
                    drop: permuted_loss - baseline_loss,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ImportanceResult {
            label: explainer.label().to_string(),
            loss: self.loss,
            baseline_loss,
            records,
        })
    }
}

/// Importance of one feature
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureImportance {
    /// Feature name
    pub feature: String,
    /// Loss of the unperturbed model on the reference data
    pub baseline_loss: f64,
    /// Loss after shuffling this feature, averaged over trials
    pub permuted_loss: f64,
    /// `permuted_loss - baseline_loss`
    pub drop: f64,
}

/// Importance of every tested feature for one explainer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportanceResult {
    /// Label of the explainer the importances belong to
    pub label: String,
    /// Loss function used
    pub loss: Loss,
    /// Loss of the unperturbed model
    pub baseline_loss: f64,
    /// One record per feature, in the order features were supplied
    pub records: Vec<FeatureImportance>,
}

impl ImportanceResult {
    /// Records sorted by loss drop, largest first (display convenience;
    /// `records` itself keeps the supplied order)
    pub fn sorted_by_drop(&self) -> Vec<&FeatureImportance> {
        let mut sorted: Vec<&FeatureImportance> = self.records.iter().collect();
        sorted.sort_by(|a, b| {
            b.drop
                .partial_cmp(&a.drop)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        sorted
    }
}
