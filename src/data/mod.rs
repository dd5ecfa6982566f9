//! Typed tabular layer
//!
//! Provides the in-memory data model shared by the predictors and the
//! explanation engines:
//! - Declared per-column schema (numeric / categorical, response, exposure)
//! - Column-major [`Frame`] with the mutation primitives the engines need
//!   (column shuffle, broadcast substitution, row subsetting)
//! - Single-record [`Observation`] extraction

mod loader;

pub use loader::{ClaimsDataset, DatasetLoader};

use crate::error::{ClaimLensError, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of a feature column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureKind {
    Numeric,
    Categorical,
}

/// Declared layout of a claims table: the explanatory features with their
/// kinds, plus the designated response and exposure columns.
///
/// Every engine receives the schema through the explainer it operates on,
/// so there is no process-wide feature-name state anywhere in the crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schema {
    features: Vec<(String, FeatureKind)>,
    response: String,
    exposure: String,
}

impl Schema {
    /// Create a schema with the designated response and exposure columns.
    /// Explanatory features are added with the `with_*` builders.
    pub fn new(response: impl Into<String>, exposure: impl Into<String>) -> Self {
        Self {
            features: Vec::new(),
            response: response.into(),
            exposure: exposure.into(),
        }
    }

    /// Declare a numeric explanatory feature
    pub fn with_numeric(mut self, name: impl Into<String>) -> Self {
        self.features.push((name.into(), FeatureKind::Numeric));
        self
    }

    /// Declare a categorical explanatory feature
    pub fn with_categorical(mut self, name: impl Into<String>) -> Self {
        self.features.push((name.into(), FeatureKind::Categorical));
        self
    }

    /// Explanatory feature names in declaration order.
    /// The response and exposure columns are never explanatory.
    pub fn explanatory(&self) -> impl Iterator<Item = &str> {
        self.features.iter().map(|(name, _)| name.as_str())
    }

    /// Explanatory features with their declared kinds, in declaration order
    pub fn features(&self) -> impl Iterator<Item = (&str, FeatureKind)> {
        self.features.iter().map(|(name, kind)| (name.as_str(), *kind))
    }

    /// Declared kind of an explanatory feature
    pub fn kind_of(&self, name: &str) -> Option<FeatureKind> {
        self.features
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, kind)| *kind)
    }

    /// Name of the response column
    pub fn response(&self) -> &str {
        &self.response
    }

    /// Name of the exposure (weight) column
    pub fn exposure(&self) -> &str {
        &self.exposure
    }
}

/// One column of a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Column {
    Numeric(Vec<f64>),
    Categorical(Vec<String>),
}

impl Column {
    /// Number of rows in the column
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Categorical(v) => v.len(),
        }
    }

    /// True when the column has no rows
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Kind of the column as stored
    pub fn kind(&self) -> FeatureKind {
        match self {
            Column::Numeric(_) => FeatureKind::Numeric,
            Column::Categorical(_) => FeatureKind::Categorical,
        }
    }

    /// Cell at row `i` as an owned value
    pub fn cell(&self, i: usize) -> CellValue {
        match self {
            Column::Numeric(v) => CellValue::Num(v[i]),
            Column::Categorical(v) => CellValue::Cat(v[i].clone()),
        }
    }
}

/// A single cell: numeric or categorical
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Num(f64),
    Cat(String),
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Num(v) => write!(f, "{}", v),
            CellValue::Cat(v) => write!(f, "{}", v),
        }
    }
}

/// Column-major in-memory table.
///
/// Invariants held at construction: all columns share one length and column
/// names are unique. Schema conformance (declared kinds, exposure
/// positivity) is checked once, when a frame is bound to an explainer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    names: Vec<String>,
    columns: Vec<Column>,
}

impl Frame {
    /// Build a frame from (name, column) pairs
    pub fn new(pairs: Vec<(String, Column)>) -> Result<Self> {
        let mut names = Vec::with_capacity(pairs.len());
        let mut columns = Vec::with_capacity(pairs.len());
        let mut n_rows = None;

        for (name, column) in pairs {
            if names.contains(&name) {
                return Err(ClaimLensError::DataError(format!(
                    "duplicate column name: {name}"
                )));
            }
            match n_rows {
                None => n_rows = Some(column.len()),
                Some(n) if n != column.len() => {
                    return Err(ClaimLensError::DataError(format!(
                        "column {name} has {} rows, expected {n}",
                        column.len()
                    )));
                }
                Some(_) => {}
            }
            names.push(name);
            columns.push(column);
        }

        Ok(Self { names, columns })
    }

    /// Number of rows
    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    /// Column names in storage order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    fn column_index(&self, name: &str) -> Result<usize> {
        self.names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| ClaimLensError::UnknownFeature(name.to_string()))
    }

    /// Column by name
    pub fn column(&self, name: &str) -> Result<&Column> {
        Ok(&self.columns[self.column_index(name)?])
    }

    /// Numeric column by name; fails when the column is categorical
    pub fn numeric(&self, name: &str) -> Result<&[f64]> {
        match self.column(name)? {
            Column::Numeric(v) => Ok(v),
            Column::Categorical(_) => Err(ClaimLensError::DataError(format!(
                "column {name} is categorical, expected numeric"
            ))),
        }
    }

    /// Extract row `i` as an observation
    pub fn row(&self, i: usize) -> Observation {
        Observation {
            names: self.names.clone(),
            values: self.columns.iter().map(|c| c.cell(i)).collect(),
        }
    }

    /// New frame containing only the given rows, in the given order
    pub fn take_rows(&self, indices: &[usize]) -> Frame {
        let columns = self
            .columns
            .iter()
            .map(|c| match c {
                Column::Numeric(v) => Column::Numeric(indices.iter().map(|&i| v[i]).collect()),
                Column::Categorical(v) => {
                    Column::Categorical(indices.iter().map(|&i| v[i].clone()).collect())
                }
            })
            .collect();
        Frame {
            names: self.names.clone(),
            columns,
        }
    }

    /// Overwrite every row of a column with one value (broadcast substitution)
    pub fn set_scalar(&mut self, name: &str, value: &CellValue) -> Result<()> {
        let idx = self.column_index(name)?;
        match (&mut self.columns[idx], value) {
            (Column::Numeric(v), CellValue::Num(x)) => v.iter_mut().for_each(|e| *e = *x),
            (Column::Categorical(v), CellValue::Cat(x)) => {
                v.iter_mut().for_each(|e| *e = x.clone())
            }
            _ => {
                return Err(ClaimLensError::DataError(format!(
                    "value kind does not match column {name}"
                )))
            }
        }
        Ok(())
    }

    /// Replace a column wholesale; the replacement must match the frame length
    pub fn set_column(&mut self, name: &str, column: Column) -> Result<()> {
        if column.len() != self.n_rows() {
            return Err(ClaimLensError::DataError(format!(
                "replacement for column {name} has {} rows, expected {}",
                column.len(),
                self.n_rows()
            )));
        }
        let idx = self.column_index(name)?;
        self.columns[idx] = column;
        Ok(())
    }

    /// Shuffle one column in place with a uniform random permutation,
    /// independent of every other column
    pub fn shuffle_column<R: Rng>(&mut self, name: &str, rng: &mut R) -> Result<()> {
        let idx = self.column_index(name)?;
        match &mut self.columns[idx] {
            Column::Numeric(v) => v.shuffle(rng),
            Column::Categorical(v) => v.shuffle(rng),
        }
        Ok(())
    }

    /// Observed (min, max) of a numeric column, ignoring nothing: the column
    /// must be non-empty and fully finite
    pub fn numeric_range(&self, name: &str) -> Result<(f64, f64)> {
        let values = self.numeric(name)?;
        if values.is_empty() {
            return Err(ClaimLensError::DataError(format!(
                "column {name} is empty, no range"
            )));
        }
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &v in values {
            if !v.is_finite() {
                return Err(ClaimLensError::DataError(format!(
                    "non-finite value in column {name}"
                )));
            }
            min = min.min(v);
            max = max.max(v);
        }
        Ok((min, max))
    }

    /// Sorted unique levels of a categorical column
    pub fn unique_levels(&self, name: &str) -> Result<Vec<String>> {
        match self.column(name)? {
            Column::Categorical(v) => {
                let mut levels: Vec<String> = v.clone();
                levels.sort();
                levels.dedup();
                Ok(levels)
            }
            Column::Numeric(_) => Err(ClaimLensError::DataError(format!(
                "column {name} is numeric, expected categorical"
            ))),
        }
    }

    /// Validate this frame against a declared schema: every explanatory
    /// feature present with its declared kind, and the exposure column
    /// present, numeric, finite and strictly positive.
    pub fn conforms(&self, schema: &Schema) -> Result<()> {
        for (name, declared) in schema.features() {
            let stored = self.column(name)?.kind();
            if stored != declared {
                return Err(ClaimLensError::DataError(format!(
                    "column {name} is {stored:?}, declared {declared:?}"
                )));
            }
        }
        let exposure = self.numeric(schema.exposure())?;
        for (i, &w) in exposure.iter().enumerate() {
            if !w.is_finite() || w <= 0.0 {
                return Err(ClaimLensError::InvalidWeight(format!(
                    "row {i} has exposure {w}, must be finite and > 0"
                )));
            }
        }
        Ok(())
    }
}

/// A single record: one value per column, in frame order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    names: Vec<String>,
    values: Vec<CellValue>,
}

impl Observation {
    /// Build an observation from (name, value) pairs
    pub fn new(pairs: Vec<(String, CellValue)>) -> Self {
        let (names, values) = pairs.into_iter().unzip();
        Self { names, values }
    }

    /// Value of a feature
    pub fn get(&self, name: &str) -> Result<&CellValue> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.values[i])
            .ok_or_else(|| ClaimLensError::UnknownFeature(name.to_string()))
    }

    /// Feature names in order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Single-row frame holding this observation
    pub fn to_frame(&self) -> Frame {
        self.to_frame_repeated(1)
    }

    /// Frame with `n` identical rows, all equal to this observation
    pub fn to_frame_repeated(&self, n: usize) -> Frame {
        let columns = self
            .values
            .iter()
            .map(|v| match v {
                CellValue::Num(x) => Column::Numeric(vec![*x; n]),
                CellValue::Cat(x) => Column::Categorical(vec![x.clone(); n]),
            })
            .collect();
        Frame {
            names: self.names.clone(),
            columns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn toy_frame() -> Frame {
        Frame::new(vec![
            (
                "CarAge".to_string(),
                Column::Numeric(vec![1.0, 10.0, 4.0]),
            ),
            (
                "Fuel".to_string(),
                Column::Categorical(vec!["Diesel".into(), "Regular".into(), "Diesel".into()]),
            ),
            (
                "Exposure".to_string(),
                Column::Numeric(vec![0.5, 1.0, 0.75]),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_frame_rejects_ragged_columns() {
        let result = Frame::new(vec![
            ("a".to_string(), Column::Numeric(vec![1.0, 2.0])),
            ("b".to_string(), Column::Numeric(vec![1.0])),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_frame_rejects_duplicate_names() {
        let result = Frame::new(vec![
            ("a".to_string(), Column::Numeric(vec![1.0])),
            ("a".to_string(), Column::Numeric(vec![2.0])),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_feature_surfaced() {
        let frame = toy_frame();
        let err = frame.column("BonusMalus").unwrap_err();
        assert!(matches!(err, ClaimLensError::UnknownFeature(_)));
    }

    #[test]
    fn test_set_scalar_broadcasts() {
        let mut frame = toy_frame();
        frame
            .set_scalar("CarAge", &CellValue::Num(7.0))
            .unwrap();
        assert_eq!(frame.numeric("CarAge").unwrap(), &[7.0, 7.0, 7.0]);
    }

    #[test]
    fn test_set_scalar_kind_mismatch() {
        let mut frame = toy_frame();
        let result = frame.set_scalar("Fuel", &CellValue::Num(1.0));
        assert!(result.is_err());
    }

    #[test]
    fn test_shuffle_preserves_values() {
        let mut frame = toy_frame();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
        frame.shuffle_column("CarAge", &mut rng).unwrap();
        let mut values = frame.numeric("CarAge").unwrap().to_vec();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(values, vec![1.0, 4.0, 10.0]);
        // other columns untouched
        assert_eq!(frame.numeric("Exposure").unwrap(), &[0.5, 1.0, 0.75]);
    }

    #[test]
    fn test_row_roundtrip() {
        let frame = toy_frame();
        let obs = frame.row(1);
        assert_eq!(obs.get("CarAge").unwrap(), &CellValue::Num(10.0));
        assert_eq!(
            obs.get("Fuel").unwrap(),
            &CellValue::Cat("Regular".to_string())
        );
        let single = obs.to_frame();
        assert_eq!(single.n_rows(), 1);
        assert_eq!(single.numeric("Exposure").unwrap(), &[1.0]);
    }

    #[test]
    fn test_take_rows_orders() {
        let frame = toy_frame();
        let subset = frame.take_rows(&[2, 0]);
        assert_eq!(subset.numeric("CarAge").unwrap(), &[4.0, 1.0]);
    }

    #[test]
    fn test_conforms_checks_exposure_positivity() {
        let schema = Schema::new("ClaimNb", "Exposure")
            .with_numeric("CarAge")
            .with_categorical("Fuel");
        let frame = toy_frame();
        assert!(frame.conforms(&schema).is_ok());

        let mut bad = frame.clone();
        bad.set_scalar("Exposure", &CellValue::Num(0.0)).unwrap();
        let err = bad.conforms(&schema).unwrap_err();
        assert!(matches!(err, ClaimLensError::InvalidWeight(_)));
    }

    #[test]
    fn test_conforms_checks_kinds() {
        let schema = Schema::new("ClaimNb", "Exposure")
            .with_categorical("CarAge");
        let frame = toy_frame();
        assert!(frame.conforms(&schema).is_err());
    }

    #[test]
    fn test_numeric_range_and_levels() {
        let frame = toy_frame();
        assert_eq!(frame.numeric_range("CarAge").unwrap(), (1.0, 10.0));
        assert_eq!(
            frame.unique_levels("Fuel").unwrap(),
            vec!["Diesel".to_string(), "Regular".to_string()]
        );
    }
}
