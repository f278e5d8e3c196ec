//! Dataset loading and frame-to-matrix conversion

use crate::error::{PredictorError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// CSV loader backed by polars
#[derive(Debug, Clone)]
pub struct DataLoader {
    /// Rows scanned to infer column types
    infer_schema_length: usize,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self {
            infer_schema_length: 100,
        }
    }

    /// Set the number of rows used for schema inference
    pub fn with_infer_schema_length(mut self, rows: usize) -> Self {
        self.infer_schema_length = rows.max(1);
        self
    }

    /// Load a CSV file with a header row
    pub fn load_csv(&self, path: &Path) -> Result<DataFrame> {
        if !path.exists() {
            return Err(PredictorError::DataError(format!(
                "Dataset not found: {}",
                path.display()
            )));
        }

        let file = File::open(path)
            .map_err(|e| PredictorError::DataError(format!("{}: {}", path.display(), e)))?;

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(self.infer_schema_length))
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| PredictorError::DataError(format!("{}: {}", path.display(), e)))?;

        debug!(path = %path.display(), rows = df.height(), cols = df.width(), "Loaded dataset");
        Ok(df)
    }

    /// Summarize a dataset without training on it
    pub fn describe(&self, path: &Path) -> Result<DatasetInfo> {
        let df = self.load_csv(path)?;
        Ok(DatasetInfo::from_frame(&df))
    }
}

/// Column-level summary of a loaded dataset
#[derive(Debug, Clone)]
pub struct DatasetInfo {
    pub n_rows: usize,
    pub columns: Vec<ColumnInfo>,
}

#[derive(Debug, Clone)]
pub struct ColumnInfo {
    pub name: String,
    pub dtype: String,
    pub null_count: usize,
}

impl DatasetInfo {
    pub fn from_frame(df: &DataFrame) -> Self {
        let columns = df
            .get_columns()
            .iter()
            .map(|col| ColumnInfo {
                name: col.name().to_string(),
                dtype: col.dtype().to_string(),
                null_count: col.null_count(),
            })
            .collect();

        Self {
            n_rows: df.height(),
            columns,
        }
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

/// Names of all columns, in frame order
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|s| s.to_string()).collect()
}

/// Read one column as `f64`; nulls and unparsable values become `NaN`
pub fn column_to_array1(df: &DataFrame, name: &str) -> Result<Array1<f64>> {
    let column = df
        .column(name)
        .map_err(|_| PredictorError::FeatureNotFound(name.to_string()))?;
    let as_f64 = column.cast(&DataType::Float64)?;
    let values: Vec<f64> = as_f64
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect();
    Ok(Array1::from_vec(values))
}

/// Extract named columns into a row-major matrix; nulls become `NaN`
pub fn columns_to_array2(df: &DataFrame, names: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let col_data: Vec<Array1<f64>> = names
        .iter()
        .map(|name| column_to_array1(df, name))
        .collect::<Result<_>>()?;

    Ok(Array2::from_shape_fn((n_rows, names.len()), |(r, c)| col_data[c][r]))
}
