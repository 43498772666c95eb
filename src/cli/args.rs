//! Command-line argument definitions using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::pipeline::{ForestConfig, MaxFeatures, PipelineConfig, Stage};

/// Lifeboat - Predict passenger survival with a random forest
#[derive(Parser, Debug)]
#[command(name = "lifeboat")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Stage to run. Runs the whole pipeline when omitted.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Raw training table (CSV with a Survived column)
    #[arg(long, global = true, default_value = "data/train.csv")]
    pub train: PathBuf,

    /// Raw test table (CSV without labels)
    #[arg(long, global = true, default_value = "data/test.csv")]
    pub test: PathBuf,

    /// Directory for intermediate features, the model and the submission
    #[arg(short, long, global = true, default_value = "output")]
    pub output_dir: PathBuf,

    /// Model file path. Defaults to random_forest_model.json inside the output directory.
    #[arg(short, long, global = true)]
    pub model: Option<PathBuf>,

    /// Number of trees in the forest
    #[arg(long, global = true, default_value = "100", value_parser = validate_n_estimators)]
    pub n_estimators: usize,

    /// Maximum tree depth. Use 0 for unlimited depth.
    #[arg(long, global = true, default_value = "5")]
    pub max_depth: usize,

    /// Features considered per split: "sqrt" (default), "log2" or "all"
    #[arg(long, global = true, default_value = "sqrt")]
    pub max_features: MaxFeatures,

    /// Random seed for bootstrap and feature sampling
    #[arg(long, global = true, default_value = "1")]
    pub seed: u64,

    /// Number of rows to use for CSV schema inference.
    /// Use 0 for full table scan.
    #[arg(long, global = true, default_value = "10000")]
    pub infer_schema_length: usize,

    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Select features, one-hot encode Sex and write the intermediate tables
    Prepare,

    /// Fit the random forest on the prepared training features
    Train {
        /// Run feature preparation first
        #[arg(long, default_value = "false")]
        with_upstream: bool,
    },

    /// Predict the test table and write submission.csv
    Predict {
        /// Run feature preparation and model fitting first
        #[arg(long, default_value = "false")]
        with_upstream: bool,
    },

    /// Run every stage in order
    Run {
        /// Continue with later stages after a stage fails
        #[arg(long, default_value = "false")]
        keep_going: bool,
    },
}

impl Cli {
    /// The subcommand, defaulting to a full halting run
    pub fn command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or(Commands::Run { keep_going: false })
    }

    /// Stages to execute, in order
    pub fn stages(&self) -> Vec<Stage> {
        match self.command() {
            Commands::Prepare => vec![Stage::Prepare],
            Commands::Train { with_upstream: true } => Stage::Train.with_upstream(),
            Commands::Train { with_upstream: false } => vec![Stage::Train],
            Commands::Predict { with_upstream: true } => Stage::Predict.with_upstream(),
            Commands::Predict { with_upstream: false } => vec![Stage::Predict],
            Commands::Run { .. } => Stage::ALL.to_vec(),
        }
    }

    /// Whether later stages still run after a failure
    pub fn keep_going(&self) -> bool {
        matches!(self.command(), Commands::Run { keep_going: true })
    }

    pub fn forest_config(&self) -> ForestConfig {
        ForestConfig {
            n_estimators: self.n_estimators,
            max_depth: (self.max_depth > 0).then_some(self.max_depth),
            max_features: self.max_features,
            seed: self.seed,
            ..ForestConfig::default()
        }
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig::new(self.train.clone(), self.test.clone(), self.output_dir.clone())
            .with_model_path(self.model.clone())
            .with_infer_schema_length(self.infer_schema_length)
            .with_forest(self.forest_config())
    }
}

/// Validator for n_estimators parameter
fn validate_n_estimators(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if value == 0 {
        Err("n_estimators must be at least 1".to_string())
    } else {
        Ok(value)
    }
}
