//! File locations shared by every stage

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::forest::ForestConfig;

pub const TRAIN_FEATURES_FILE: &str = "preprocessed_train_features.csv";
pub const TRAIN_LABELS_FILE: &str = "preprocessed_train_labels.csv";
pub const TEST_FEATURES_FILE: &str = "preprocessed_test_features.csv";
pub const MODEL_FILE: &str = "random_forest_model.json";
pub const SUBMISSION_FILE: &str = "submission.csv";

/// Paths for one pipeline run.
///
/// Intermediate files, the model and the submission all live under
/// `output_dir` unless `model_path` overrides the model location.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub train_path: PathBuf,
    pub test_path: PathBuf,
    pub output_dir: PathBuf,
    pub model_path: Option<PathBuf>,
    /// Rows used for CSV schema inference (0 means full scan)
    pub infer_schema_length: usize,
    pub forest: ForestConfig,
}

impl PipelineConfig {
    pub fn new(
        train_path: impl Into<PathBuf>,
        test_path: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            train_path: train_path.into(),
            test_path: test_path.into(),
            output_dir: output_dir.into(),
            model_path: None,
            infer_schema_length: 10_000,
            forest: ForestConfig::default(),
        }
    }

    pub fn with_model_path(mut self, path: Option<PathBuf>) -> Self {
        self.model_path = path;
        self
    }

    pub fn with_infer_schema_length(mut self, rows: usize) -> Self {
        self.infer_schema_length = rows;
        self
    }

    pub fn with_forest(mut self, forest: ForestConfig) -> Self {
        self.forest = forest;
        self
    }

    pub fn train_features_path(&self) -> PathBuf {
        self.output_dir.join(TRAIN_FEATURES_FILE)
    }

    pub fn train_labels_path(&self) -> PathBuf {
        self.output_dir.join(TRAIN_LABELS_FILE)
    }

    pub fn test_features_path(&self) -> PathBuf {
        self.output_dir.join(TEST_FEATURES_FILE)
    }

    pub fn model_path(&self) -> PathBuf {
        self.model_path
            .clone()
            .unwrap_or_else(|| self.output_dir.join(MODEL_FILE))
    }

    pub fn submission_path(&self) -> PathBuf {
        self.output_dir.join(SUBMISSION_FILE)
    }

    /// Create the output directory (and the model's parent directory) if absent.
    pub fn ensure_output_dir(&self) -> Result<()> {
        create_dir(&self.output_dir)?;
        if let Some(parent) = self.model_path().parent() {
            if !parent.as_os_str().is_empty() {
                create_dir(parent)?;
            }
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new("data/train.csv", "data/test.csv", "output")
    }
}

fn create_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))
}
