//! Dataset loading and writing for CSV tables

use anyhow::{Context, Result};
use polars::prelude::*;
use std::path::Path;

use super::error::PipelineError;

/// Load a CSV dataset eagerly.
///
/// `infer_schema_length` of 0 scans the whole file for type inference.
pub fn load_dataset(path: &Path, infer_schema_length: usize) -> Result<DataFrame> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    if extension != "csv" {
        anyhow::bail!("Unsupported file format: {}. Supported formats: csv", extension);
    }

    if !path.exists() {
        anyhow::bail!("Dataset not found: {}", path.display());
    }

    let schema_length = if infer_schema_length == 0 {
        None
    } else {
        Some(infer_schema_length)
    };

    let df = LazyCsvReader::new(path)
        .with_infer_schema_length(schema_length)
        .finish()
        .with_context(|| format!("Failed to load CSV file: {}", path.display()))?
        .collect()
        .with_context(|| format!("Failed to read CSV file: {}", path.display()))?;

    tracing::debug!(path = %path.display(), rows = df.height(), cols = df.width(), "Loaded dataset");
    Ok(df)
}

/// Fail with [`PipelineError::MissingColumn`] on the first absent column.
pub fn require_columns(df: &DataFrame, columns: &[&str]) -> Result<(), PipelineError> {
    for column in columns {
        if df.column(column).is_err() {
            return Err(PipelineError::MissingColumn {
                column: column.to_string(),
            });
        }
    }
    Ok(())
}

/// Column names in table order
pub fn get_column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|s| s.to_string()).collect()
}

/// Write a DataFrame to CSV, replacing any existing file.
pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    CsvWriter::new(&mut file)
        .finish(df)
        .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;
    tracing::debug!(path = %path.display(), rows = df.height(), "Wrote CSV");
    Ok(())
}
