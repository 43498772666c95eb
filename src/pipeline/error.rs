//! Typed failures raised by the pipeline stages.
//!
//! I/O, CSV and serialization errors are not listed here; they travel as
//! `anyhow::Error` with context naming the file involved.

use std::path::PathBuf;

use thiserror::Error;

/// Errors with a meaning specific to the survival pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A required column is absent from an input table.
    #[error("Required column '{column}' not found in dataset")]
    MissingColumn { column: String },

    /// A stage input produced by an earlier stage does not exist.
    #[error(
        "Missing artifact {}: run the '{stage}' stage first or pass --with-upstream",
        path.display()
    )]
    MissingArtifact { path: PathBuf, stage: String },

    /// A label value outside {0, 1}.
    #[error("Label at row {row} must be 0 or 1, found {value}")]
    InvalidLabel { row: usize, value: String },

    /// A feature value is null where a number is required.
    #[error("Column '{column}' has a missing value at row {row}")]
    MissingValue { column: String, row: usize },

    /// The feature table lacks columns the model was fit on.
    #[error("Feature table is missing model columns: {missing:?}")]
    SchemaMismatch { missing: Vec<String> },

    /// Two sequences that must line up row by row have different lengths.
    #[error("Length mismatch: expected {expected} rows, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// A saved model that cannot be used for prediction.
    #[error("Invalid model: {reason}")]
    InvalidModel { reason: String },

    /// Fitting was requested with zero rows.
    #[error("Cannot fit a model on an empty training set")]
    EmptyTrainingSet,
}
