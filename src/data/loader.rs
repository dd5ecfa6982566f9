//! Dataset ingestion
//!
//! Reads a claims table from CSV (or an already-loaded polars DataFrame)
//! and materializes it as a typed [`Frame`] plus the response labels,
//! driven by the declared [`Schema`].

use super::{Column, Frame, Schema};
use crate::error::{ClaimLensError, Result};
use ndarray::Array1;
use polars::prelude::*;
use std::fs::File;
use tracing::info;

/// A loaded claims table: explanatory features plus exposure in `data`,
/// response counts in `labels`
#[derive(Debug, Clone)]
pub struct ClaimsDataset {
    pub data: Frame,
    pub labels: Array1<f64>,
}

/// Loader for claims-frequency tables
pub struct DatasetLoader {
    infer_schema_length: Option<usize>,
}

impl Default for DatasetLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetLoader {
    /// Create a new loader
    pub fn new() -> Self {
        Self {
            infer_schema_length: Some(100),
        }
    }

    /// Set how many rows polars scans to infer CSV column types
    pub fn with_infer_schema_length(mut self, n: usize) -> Self {
        self.infer_schema_length = Some(n);
        self
    }

    /// Load a CSV file and materialize the columns the schema declares
    pub fn load_csv(&self, path: &str, schema: &Schema) -> Result<ClaimsDataset> {
        let file = File::open(path).map_err(|e| ClaimLensError::DataError(e.to_string()))?;

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(self.infer_schema_length)
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| ClaimLensError::DataError(e.to_string()))?;

        let dataset = self.from_dataframe(&df, schema)?;
        info!(
            path,
            rows = dataset.data.n_rows(),
            "loaded claims table"
        );
        Ok(dataset)
    }

    /// Materialize a typed frame and labels from a polars DataFrame
    pub fn from_dataframe(&self, df: &DataFrame, schema: &Schema) -> Result<ClaimsDataset> {
        let mut pairs = Vec::new();
        for (name, kind) in schema.features() {
            let column = match kind {
                super::FeatureKind::Numeric => Column::Numeric(numeric_column(df, name)?),
                super::FeatureKind::Categorical => {
                    Column::Categorical(categorical_column(df, name)?)
                }
            };
            pairs.push((name.to_string(), column));
        }
        pairs.push((
            schema.exposure().to_string(),
            Column::Numeric(numeric_column(df, schema.exposure())?),
        ));

        let data = Frame::new(pairs)?;
        data.conforms(schema)?;

        let labels = Array1::from_vec(numeric_column(df, schema.response())?);
        if labels.len() != data.n_rows() {
            return Err(ClaimLensError::ShapeMismatch {
                data_rows: data.n_rows(),
                label_rows: labels.len(),
            });
        }

        Ok(ClaimsDataset { data, labels })
    }
}

fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let series = df
        .column(name)
        .map_err(|_| ClaimLensError::UnknownFeature(name.to_string()))?
        .as_materialized_series()
        .cast(&DataType::Float64)
        .map_err(|e| ClaimLensError::DataError(e.to_string()))?;
    let ca = series
        .f64()
        .map_err(|e| ClaimLensError::DataError(e.to_string()))?;
    ca.into_iter()
        .enumerate()
        .map(|(i, v)| {
            v.ok_or_else(|| {
                ClaimLensError::DataError(format!("null at row {i} of column {name}"))
            })
        })
        .collect()
}

fn categorical_column(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let series = df
        .column(name)
        .map_err(|_| ClaimLensError::UnknownFeature(name.to_string()))?
        .as_materialized_series()
        .cast(&DataType::String)
        .map_err(|e| ClaimLensError::DataError(e.to_string()))?;
    let ca = series
        .str()
        .map_err(|e| ClaimLensError::DataError(e.to_string()))?;
    ca.into_iter()
        .enumerate()
        .map(|(i, v)| {
            v.map(str::to_string).ok_or_else(|| {
                ClaimLensError::DataError(format!("null at row {i} of column {name}"))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_schema() -> Schema {
        Schema::new("ClaimNb", "Exposure")
            .with_numeric("CarAge")
            .with_categorical("Fuel")
    }

    fn toy_df() -> DataFrame {
        df!(
            "CarAge" => &[1.0, 10.0],
            "Fuel" => &["Diesel", "Regular"],
            "Exposure" => &[0.5, 1.0],
            "ClaimNb" => &[0.0, 2.0]
        )
        .unwrap()
    }

    #[test]
    fn test_from_dataframe() {
        let dataset = DatasetLoader::new()
            .from_dataframe(&toy_df(), &toy_schema())
            .unwrap();
        assert_eq!(dataset.data.n_rows(), 2);
        assert_eq!(dataset.labels.len(), 2);
        assert_eq!(dataset.data.numeric("CarAge").unwrap(), &[1.0, 10.0]);
        assert_eq!(dataset.labels[1], 2.0);
    }

    #[test]
    fn test_missing_column_is_unknown_feature() {
        let schema = toy_schema().with_numeric("BonusMalus");
        let result = DatasetLoader::new().from_dataframe(&toy_df(), &schema);
        assert!(matches!(
            result.unwrap_err(),
            ClaimLensError::UnknownFeature(_)
        ));
    }

    #[test]
    fn test_integer_response_is_cast() {
        let df = df!(
            "CarAge" => &[1.0, 10.0],
            "Fuel" => &["Diesel", "Regular"],
            "Exposure" => &[0.5, 1.0],
            "ClaimNb" => &[0i64, 2i64]
        )
        .unwrap();
        let dataset = DatasetLoader::new()
            .from_dataframe(&df, &toy_schema())
            .unwrap();
        assert_eq!(dataset.labels[0], 0.0);
    }

    #[test]
    fn test_zero_exposure_rejected() {
        let df = df!(
            "CarAge" => &[1.0],
            "Fuel" => &["Diesel"],
            "Exposure" => &[0.0],
            "ClaimNb" => &[0.0]
        )
        .unwrap();
        let result = DatasetLoader::new().from_dataframe(&df, &toy_schema());
        assert!(matches!(
            result.unwrap_err(),
            ClaimLensError::InvalidWeight(_)
        ));
    }
}
