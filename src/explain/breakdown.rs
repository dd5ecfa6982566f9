//! Prediction breakdown (local attribution)
//!
//! Decomposes one observation's prediction into additive per-feature
//! contributions relative to the reference-data average. The engine walks
//! the features in a fixed order, substituting the observation's value into
//! every row of a working copy of the reference data; each step's
//! contribution is the change in mean prediction, and substitutions
//! accumulate, so each step's baseline reflects all prior substitutions.
//!
//! The walk covers every column the prediction consumes, the explanatory
//! features and, always last, the exposure column, so after the final
//! step every working row equals the observation and the running mean
//! lands exactly on the observation's own prediction.

use super::Explainer;
use crate::data::Observation;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Order in which features are walked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ContributionOrder {
    /// Features ranked once by absolute single-substitution impact against
    /// the untouched reference data, largest first; ties keep schema order.
    /// Deterministic, so breakdowns are reproducible run to run.
    #[default]
    GreedyByImpact,
    /// Schema declaration order
    DataOrder,
}

/// Prediction breakdown engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BreakDown {
    order: ContributionOrder,
}

impl BreakDown {
    /// Create an engine with the default greedy ordering
    pub fn new() -> Self {
        Self::default()
    }

    /// Choose the walk order
    pub fn with_order(mut self, order: ContributionOrder) -> Self {
        self.order = order;
        self
    }

    /// Explain a single observation. Batch callers invoke this per record.
    pub fn explain(&self, explainer: &Explainer, observation: &Observation) -> Result<BreakdownResult> {
        let schema = explainer.schema();
        let explanatory: Vec<String> = schema.explanatory().map(str::to_string).collect();

        // fail fast when the observation is missing a feature
        for feature in &explanatory {
            observation.get(feature)?;
        }
        observation.get(schema.exposure())?;

        let intercept = explainer.baseline()?;

        let mut ordered = match self.order {
            ContributionOrder::DataOrder => explanatory,
            ContributionOrder::GreedyByImpact => {
                self.rank_by_impact(explainer, observation, explanatory, intercept)?
            }
        };
        // the exposure column is part of the prediction and is always
        // substituted last
        ordered.push(schema.exposure().to_string());

        debug!(
            label = explainer.label(),
            n_features = ordered.len(),
            "computing prediction breakdown"
        );

        let mut working = explainer.data().as_ref().clone();
        let mut previous = intercept;
        let mut contributions = Vec::with_capacity(ordered.len());

        for feature in &ordered {
            let value = observation.get(feature)?.clone();
            working.set_scalar(feature, &value)?;
            let current = explainer.predict(&working)?.mean().unwrap_or(0.0);
            contributions.push(Contribution {
                feature: feature.clone(),
                value: value.to_string(),
                contribution: current - previous,
                cumulative: current,
            });
            previous = current;
        }

        let prediction = explainer.predict(&observation.to_frame())?[0];

        Ok(BreakdownResult {
            label: explainer.label().to_string(),
            intercept,
            prediction,
            contributions,
        })
    }

    /// Rank features by the absolute change in mean prediction when each is
    /// substituted alone into the untouched reference data
    fn rank_by_impact(
        &self,
        explainer: &Explainer,
        observation: &Observation,
        features: Vec<String>,
        intercept: f64,
    ) -> Result<Vec<String>> {
        let mut impacts = Vec::with_capacity(features.len());
        for feature in features {
            let mut probe = explainer.data().as_ref().clone();
            probe.set_scalar(&feature, observation.get(&feature)?)?;
            let mean = explainer.predict(&probe)?.mean().unwrap_or(0.0);
            impacts.push((feature, (mean - intercept).abs()));
        }
        // stable sort keeps schema order for tied impacts
        impacts.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        Ok(impacts.into_iter().map(|(feature, _)| feature).collect())
    }
}

/// One step of a breakdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contribution {
    /// Feature substituted at this step
    pub feature: String,
    /// The observation's value for the feature, rendered for display
    pub value: String,
    /// Change in mean prediction caused by this substitution
    pub contribution: f64,
    /// Mean prediction after this substitution
    pub cumulative: f64,
}

/// Breakdown of one observation's prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakdownResult {
    /// Label of the explainer
    pub label: String,
    /// Mean prediction over the reference data (the walk's starting point)
    pub intercept: f64,
    /// The observation's own prediction (the walk's end point)
    pub prediction: f64,
    /// One entry per substituted feature, in walk order
    pub contributions: Vec<Contribution>,
}

impl BreakdownResult {
    /// Sum of all per-feature contributions; equals
    /// `prediction - intercept` up to floating-point error
    pub fn sum_contributions(&self) -> f64 {
        self.contributions.iter().map(|c| c.contribution).sum()
    }
}
