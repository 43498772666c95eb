//! Stage ordering and the pipeline orchestrator
//!
//! Stages always run in the fixed order prepare, train, predict. A stage that
//! depends on earlier artifacts can be run together with its upstream stages,
//! in which case an upstream failure stops the chain before the stage runs.

use std::fmt;
use std::time::{Duration, Instant};

use anyhow::Result;

use super::config::PipelineConfig;
use super::stages::{run_predict, run_prepare, run_train, PredictOutcome, PrepareOutcome, TrainOutcome};
use crate::report::PipelineSummary;
use crate::utils::{create_spinner, finish_with_success, finish_with_warning, print_step_header, print_step_time};

/// Printed once every stage of a full run has been attempted
pub const COMPLETION_MESSAGE: &str = "Pipeline finished. The file 'submission.csv' has been created.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Prepare,
    Train,
    Predict,
}

impl Stage {
    /// Every stage, in execution order
    pub const ALL: [Stage; 3] = [Stage::Prepare, Stage::Train, Stage::Predict];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Prepare => "prepare",
            Stage::Train => "train",
            Stage::Predict => "predict",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Stage::Prepare => "Feature Preparation",
            Stage::Train => "Model Fitting",
            Stage::Predict => "Prediction & Submission",
        }
    }

    /// Stages that must have run before this one
    pub fn upstream(self) -> &'static [Stage] {
        match self {
            Stage::Prepare => &[],
            Stage::Train => &[Stage::Prepare],
            Stage::Predict => &[Stage::Prepare, Stage::Train],
        }
    }

    /// This stage preceded by its upstream stages
    pub fn with_upstream(self) -> Vec<Stage> {
        let mut stages = self.upstream().to_vec();
        stages.push(self);
        stages
    }

    fn step_number(self) -> u8 {
        match self {
            Stage::Prepare => 1,
            Stage::Train => 2,
            Stage::Predict => 3,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Typed result of a successful stage
#[derive(Debug, Clone)]
pub enum StageDetail {
    Prepared(PrepareOutcome),
    Trained(TrainOutcome),
    Predicted(PredictOutcome),
}

impl fmt::Display for StageDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageDetail::Prepared(o) => write!(
                f,
                "{} train / {} test rows, {} features",
                o.train_rows,
                o.test_rows,
                o.feature_names.len()
            ),
            StageDetail::Trained(o) => write!(
                f,
                "{} trees, training accuracy {:.2}%",
                o.n_trees,
                o.training_report.accuracy * 100.0
            ),
            StageDetail::Predicted(o) => write!(
                f,
                "{} predictions, {} survivors",
                o.rows, o.predicted_survivors
            ),
        }
    }
}

/// One attempted stage
#[derive(Debug)]
pub struct StageOutcome {
    pub stage: Stage,
    pub elapsed: Duration,
    pub result: Result<StageDetail>,
}

impl StageOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Run a single stage without any upstream stages.
pub fn run_stage(stage: Stage, config: &PipelineConfig) -> Result<StageDetail> {
    match stage {
        Stage::Prepare => run_prepare(config).map(StageDetail::Prepared),
        Stage::Train => run_train(config).map(StageDetail::Trained),
        Stage::Predict => run_predict(config).map(StageDetail::Predicted),
    }
}

/// Run `stages` in order, recording each outcome.
///
/// Without `keep_going` the first failure stops the run; with it every stage is
/// attempted regardless of earlier failures.
pub fn run_pipeline(stages: &[Stage], config: &PipelineConfig, keep_going: bool) -> PipelineSummary {
    let mut summary = PipelineSummary::new();

    for &stage in stages {
        print_step_header(stage.step_number(), stage.title());
        tracing::info!(stage = %stage, "Starting stage");

        let step_start = Instant::now();
        let spinner = create_spinner(&format!("Running {}...", stage.name()));
        let result = run_stage(stage, config);
        let elapsed = step_start.elapsed();

        match &result {
            Ok(detail) => {
                finish_with_success(&spinner, &detail.to_string());
                tracing::info!(stage = %stage, elapsed_ms = elapsed.as_millis() as u64, "Stage succeeded");
            }
            Err(e) => {
                finish_with_warning(&spinner, &format!("{} failed", stage.name()));
                tracing::error!(stage = %stage, "Stage failed: {:#}", e);
            }
        }
        print_step_time(elapsed);

        let failed = result.is_err();
        summary.push(StageOutcome {
            stage,
            elapsed,
            result,
        });

        if failed && !keep_going {
            tracing::warn!(stage = %stage, "Halting pipeline after failed stage");
            break;
        }
    }

    summary
}
