//! The three pipeline stages
//!
//! Each stage is a function of its file inputs. Stages share nothing in memory;
//! everything one stage needs from another is read back from `output_dir`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use polars::prelude::*;

use super::config::PipelineConfig;
use super::error::PipelineError;
use super::evaluate::{evaluate, EvaluationReport};
use super::features::{
    extract_labels, labels_frame, preprocess, survival_rates, FeatureTable, SurvivalRates,
    ID_COLUMN, LABEL_COLUMN,
};
use super::forest::RandomForest;
use super::loader::{load_dataset, require_columns, write_csv};

/// What feature preparation produced
#[derive(Debug, Clone)]
pub struct PrepareOutcome {
    pub train_rows: usize,
    pub test_rows: usize,
    pub feature_names: Vec<String>,
    pub survival_rates: SurvivalRates,
}

/// What model fitting produced
#[derive(Debug, Clone)]
pub struct TrainOutcome {
    pub n_trees: usize,
    pub feature_names: Vec<String>,
    /// Metrics of the fitted model on its own training rows
    pub training_report: EvaluationReport,
    pub model_path: PathBuf,
}

/// What prediction produced
#[derive(Debug, Clone)]
pub struct PredictOutcome {
    pub rows: usize,
    pub predicted_survivors: usize,
    pub submission_path: PathBuf,
}

/// Feature preparation: raw train/test tables to the three intermediate CSVs.
pub fn run_prepare(config: &PipelineConfig) -> Result<PrepareOutcome> {
    let train = load_dataset(&config.train_path, config.infer_schema_length)?;
    let test = load_dataset(&config.test_path, config.infer_schema_length)?;
    tracing::info!(train_rows = train.height(), test_rows = test.height(), "Data loaded");

    let mut prepared = preprocess(&train, &test).inspect_err(|e| {
        tracing::error!("Preprocessing failed: {:#}", e);
    })?;
    tracing::info!(
        features = ?prepared.train_features.feature_names(),
        "Preprocessing complete"
    );

    let rates = survival_rates(&train)?;
    tracing::info!("Survival rate: {}", rates);

    config.ensure_output_dir()?;
    write_csv(
        prepared.train_features.frame_mut(),
        &config.train_features_path(),
    )?;
    write_csv(
        &mut labels_frame(&prepared.train_labels)?,
        &config.train_labels_path(),
    )?;
    write_csv(
        prepared.test_features.frame_mut(),
        &config.test_features_path(),
    )?;
    tracing::info!(dir = %config.output_dir.display(), "Preprocessed data saved");

    Ok(PrepareOutcome {
        train_rows: prepared.train_features.height(),
        test_rows: prepared.test_features.height(),
        feature_names: prepared.train_features.feature_names(),
        survival_rates: rates,
    })
}

/// Model fitting: intermediate train features and labels to a saved forest.
pub fn run_train(config: &PipelineConfig) -> Result<TrainOutcome> {
    let features_path = config.train_features_path();
    let labels_path = config.train_labels_path();
    require_artifact(&features_path, "prepare")?;
    require_artifact(&labels_path, "prepare")?;

    let features = FeatureTable::new(load_dataset(&features_path, config.infer_schema_length)?);
    let labels = extract_labels(&load_dataset(&labels_path, config.infer_schema_length)?)
        .with_context(|| format!("Invalid labels in {}", labels_path.display()))?;
    let rows = features.to_rows()?;

    let model = RandomForest::fit(&config.forest, &rows, &labels, features.feature_names())
        .inspect_err(|e| tracing::error!("Model fitting failed: {:#}", e))?;
    tracing::info!(
        trees = model.trees().len(),
        max_depth = ?config.forest.max_depth,
        seed = config.forest.seed,
        "Model trained"
    );
    let n_trees = model.trees().len().max(1) as f64;
    tracing::debug!(
        mean_depth = model.trees().iter().map(|t| t.depth()).sum::<usize>() as f64 / n_trees,
        mean_leaves = model.trees().iter().map(|t| t.n_leaves()).sum::<usize>() as f64 / n_trees,
        "Tree shape"
    );

    let training_report = evaluate(&model.predict(&rows)?, &labels)?;
    tracing::info!("Training accuracy: {:.4}", training_report.accuracy);

    let model_path = config.model_path();
    config.ensure_output_dir()?;
    model.save(&model_path)?;
    tracing::info!(path = %model_path.display(), "Model saved");

    Ok(TrainOutcome {
        n_trees: model.trees().len(),
        feature_names: model.feature_names().to_vec(),
        training_report,
        model_path,
    })
}

/// Prediction: saved forest and test features to the submission table.
pub fn run_predict(config: &PipelineConfig) -> Result<PredictOutcome> {
    let model_path = config.model_path();
    let features_path = config.test_features_path();
    require_artifact(&features_path, "prepare")?;
    require_artifact(&model_path, "train")?;

    let model = RandomForest::load(&model_path)?;
    tracing::info!(path = %model_path.display(), "Model loaded");

    let features = FeatureTable::new(load_dataset(&features_path, config.infer_schema_length)?)
        .aligned_to(model.feature_names())?;
    let predictions = model.predict(&features.to_rows()?)?;
    tracing::info!(rows = predictions.len(), "Predictions generated");

    let test = load_dataset(&config.test_path, config.infer_schema_length)?;
    let mut submission = build_submission(&test, &predictions)?;

    let submission_path = config.submission_path();
    config.ensure_output_dir()?;
    write_csv(&mut submission, &submission_path)?;
    tracing::info!(path = %submission_path.display(), "Submission saved");

    Ok(PredictOutcome {
        rows: predictions.len(),
        predicted_survivors: predictions.iter().filter(|&&p| p == 1).count(),
        submission_path,
    })
}

/// Pair each raw test identifier with its prediction, by position.
pub fn build_submission(test: &DataFrame, predictions: &[u8]) -> Result<DataFrame> {
    require_columns(test, &[ID_COLUMN])?;
    if test.height() != predictions.len() {
        return Err(PipelineError::LengthMismatch {
            expected: test.height(),
            actual: predictions.len(),
        }
        .into());
    }

    let ids = test.column(ID_COLUMN)?.clone();
    let labels: Vec<i32> = predictions.iter().map(|&p| i32::from(p)).collect();

    Ok(DataFrame::new(vec![
        ids,
        Column::new(LABEL_COLUMN.into(), labels),
    ])?)
}

fn require_artifact(path: &Path, stage: &str) -> Result<(), PipelineError> {
    if path.exists() {
        Ok(())
    } else {
        tracing::error!(path = %path.display(), "Required artifact is missing");
        Err(PipelineError::MissingArtifact {
            path: path.to_path_buf(),
            stage: stage.to_string(),
        })
    }
}
