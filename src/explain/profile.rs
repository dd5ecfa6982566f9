//! Ceteris-paribus profiles and partial dependence
//!
//! A ceteris-paribus profile recomputes one observation's prediction while
//! sweeping a single feature across a grid, all other features held fixed.
//! Averaging the profiles of many observations at each grid point yields
//! the partial-dependence curve. `select_neighbours` restricts profiling
//! to the rows of the reference data closest to an observation.

use super::Explainer;
use crate::data::{CellValue, Column, FeatureKind, Frame, Observation, Schema};
use crate::error::{ClaimLensError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tracing::debug;

/// Ceteris-paribus profile engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CeterisParibus {
    grid_size: usize,
    grid: Option<Column>,
}

impl Default for CeterisParibus {
    fn default() -> Self {
        Self::new()
    }
}

impl CeterisParibus {
    /// Create an engine with the default grid resolution
    pub fn new() -> Self {
        Self {
            grid_size: 101,
            grid: None,
        }
    }

    /// Number of grid points for numeric sweeps (clamped to >= 2)
    pub fn with_grid_size(mut self, n: usize) -> Self {
        self.grid_size = n.max(2);
        self
    }

    /// Supply an explicit grid instead of deriving one
    pub fn with_grid(mut self, grid: Column) -> Self {
        self.grid = Some(grid);
        self
    }

    /// Profile every observation over the swept feature's grid.
    ///
    /// Grid derivation when none was supplied: numeric features sweep
    /// `grid_size` equally spaced points spanning the observed min/max in
    /// the REFERENCE data; categorical features sweep the sorted unique
    /// observed levels.
    pub fn profile(
        &self,
        explainer: &Explainer,
        observations: &Frame,
        feature: &str,
    ) -> Result<ProfileResult> {
        let grid = match &self.grid {
            Some(grid) => {
                let declared = explainer
                    .schema()
                    .kind_of(feature)
                    .ok_or_else(|| ClaimLensError::UnknownFeature(feature.to_string()))?;
                if grid.kind() != declared {
                    return Err(ClaimLensError::DataError(format!(
                        "supplied grid is {:?} but feature {feature} is {declared:?}",
                        grid.kind()
                    )));
                }
                grid.clone()
            }
            None => self.derive_grid(explainer, feature)?,
        };
        if grid.is_empty() {
            return Err(ClaimLensError::DataError(format!(
                "empty grid for feature {feature}"
            )));
        }

        debug!(
            label = explainer.label(),
            feature,
            grid_points = grid.len(),
            observations = observations.n_rows(),
            "computing ceteris paribus profiles"
        );

        let mut points = Vec::with_capacity(observations.n_rows() * grid.len());
        for i in 0..observations.n_rows() {
            let observation = observations.row(i);
            let mut swept = observation.to_frame_repeated(grid.len());
            swept.set_column(feature, grid.clone())?;
            let predictions = explainer.predict(&swept)?;
            for (j, &prediction) in predictions.iter().enumerate() {
                points.push(ProfilePoint {
                    observation: i,
                    value: grid.cell(j),
                    prediction,
                });
            }
        }

        Ok(ProfileResult {
            label: explainer.label().to_string(),
            feature: feature.to_string(),
            grid,
            points,
        })
    }

    fn derive_grid(&self, explainer: &Explainer, feature: &str) -> Result<Column> {
        let kind = explainer
            .schema()
            .kind_of(feature)
            .ok_or_else(|| ClaimLensError::UnknownFeature(feature.to_string()))?;
        match kind {
            FeatureKind::Numeric => {
                let (min, max) = explainer.data().numeric_range(feature)?;
                if min == max {
                    return Ok(Column::Numeric(vec![min]));
                }
                let step = (max - min) / (self.grid_size - 1) as f64;
                let grid = (0..self.grid_size).map(|i| min + step * i as f64).collect();
                Ok(Column::Numeric(grid))
            }
            FeatureKind::Categorical => {
                Ok(Column::Categorical(explainer.data().unique_levels(feature)?))
            }
        }
    }
}

/// One profiled prediction: (observation, grid point) pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilePoint {
    /// Index of the observation within the profiled frame
    pub observation: usize,
    /// Value the swept feature was set to
    pub value: CellValue,
    /// Predicted response at that value
    pub prediction: f64,
}

/// Ceteris-paribus profiles for a set of observations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResult {
    /// Label of the explainer
    pub label: String,
    /// The swept feature
    pub feature: String,
    /// The grid every observation was swept over
    pub grid: Column,
    /// One point per (observation, grid point), observation-major,
    /// both in input order
    pub points: Vec<ProfilePoint>,
}

impl ProfileResult {
    /// Number of profiled observations
    pub fn n_observations(&self) -> usize {
        if self.grid.is_empty() {
            0
        } else {
            self.points.len() / self.grid.len()
        }
    }

    /// Collapse all observations into the partial-dependence curve:
    /// the arithmetic mean of the profiled predictions at each grid point
    pub fn aggregate(&self) -> PdpResult {
        self.aggregate_with(|predictions| {
            predictions.iter().sum::<f64>() / predictions.len() as f64
        })
    }

    /// Collapse with a custom reducer over each grid point's predictions
    /// (one per observation, in observation order)
    pub fn aggregate_with(&self, reducer: impl Fn(&[f64]) -> f64) -> PdpResult {
        let n_grid = self.grid.len();
        let n_obs = self.n_observations();
        let mut points = Vec::with_capacity(n_grid);
        if n_obs > 0 {
            for j in 0..n_grid {
                let at_point: Vec<f64> = (0..n_obs)
                    .map(|i| self.points[i * n_grid + j].prediction)
                    .collect();
                points.push(PdpPoint {
                    value: self.grid.cell(j),
                    prediction: reducer(&at_point),
                });
            }
        }
        PdpResult {
            label: self.label.clone(),
            feature: self.feature.clone(),
            points,
        }
    }
}

/// One point of a partial-dependence curve
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdpPoint {
    /// Grid value
    pub value: CellValue,
    /// Mean profiled prediction at this value
    pub prediction: f64,
}

/// Partial-dependence curve: aggregated ceteris-paribus profiles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdpResult {
    /// Label of the explainer
    pub label: String,
    /// The swept feature
    pub feature: String,
    /// One point per grid value, in grid order
    pub points: Vec<PdpPoint>,
}

/// Ordered (distance, row) pair for BinaryHeap-based partial sort
#[derive(Debug, Clone, Copy)]
struct DistIdx(f64, usize);

impl PartialEq for DistIdx {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
impl Eq for DistIdx {}
impl PartialOrd for DistIdx {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for DistIdx {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.partial_cmp(&other.0).unwrap_or(Ordering::Equal)
    }
}

/// The `k` rows of `frame` closest to `observation` under a Gower-type
/// distance over the schema's explanatory features: numeric features
/// contribute `|a - b| / range` (zero when the column has zero range),
/// categorical features contribute 0 on a match and 1 otherwise, averaged
/// over features. Returns all rows when `k >= n`, ordered nearest first.
pub fn select_neighbours(
    frame: &Frame,
    schema: &Schema,
    observation: &Observation,
    k: usize,
) -> Result<Frame> {
    let mut numeric_ranges = Vec::new();
    let mut features = Vec::new();
    for (name, kind) in schema.features() {
        let range = match kind {
            FeatureKind::Numeric => {
                let (min, max) = frame.numeric_range(name)?;
                Some(max - min)
            }
            FeatureKind::Categorical => None,
        };
        observation.get(name)?;
        features.push(name.to_string());
        numeric_ranges.push(range);
    }
    if features.is_empty() {
        return Err(ClaimLensError::DataError(
            "no explanatory features to measure distance over".to_string(),
        ));
    }

    let n = frame.n_rows();
    let mut heap: BinaryHeap<DistIdx> = BinaryHeap::with_capacity(k + 1);
    for row in 0..n {
        let mut total = 0.0;
        for (feature, range) in features.iter().zip(numeric_ranges.iter()) {
            let target = observation.get(feature)?;
            total += match (frame.column(feature)?, target, range) {
                (Column::Numeric(values), CellValue::Num(x), Some(range)) => {
                    if *range > 0.0 {
                        (values[row] - x).abs() / range
                    } else {
                        0.0
                    }
                }
                (Column::Categorical(values), CellValue::Cat(level), None) => {
                    if &values[row] == level {
                        0.0
                    } else {
                        1.0
                    }
                }
                _ => {
                    return Err(ClaimLensError::DataError(format!(
                        "observation value kind does not match column {feature}"
                    )))
                }
            };
        }
        heap.push(DistIdx(total / features.len() as f64, row));
        if heap.len() > k {
            heap.pop();
        }
    }

    let mut nearest = heap.into_vec();
    nearest.sort();
    let indices: Vec<usize> = nearest.iter().map(|d| d.1).collect();
    Ok(frame.take_rows(&indices))
}
