//! Lifeboat: Survival Prediction CLI Tool
//!
//! Runs the feature preparation, model fitting and prediction stages,
//! alone or as a full pipeline.

mod cli;
mod logging;
mod pipeline;
mod report;
mod utils;

use std::process::ExitCode;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};
use pipeline::{run_pipeline, Stage, StageDetail, COMPLETION_MESSAGE};
use utils::{print_banner, print_completion, print_config, print_halted, print_info};

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("Warning: {}", e);
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Processing failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = cli.pipeline_config();
    let stages = cli.stages();
    let full_run = matches!(cli.command(), Commands::Run { .. });

    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(&config);

    if stages.len() > 1 && !full_run {
        print_info(&format!(
            "Running upstream stages first: {}",
            stages[..stages.len() - 1]
                .iter()
                .map(|s| s.name())
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }

    let start = Instant::now();
    let summary = run_pipeline(&stages, &config, cli.keep_going());
    tracing::debug!(elapsed_ms = start.elapsed().as_millis() as u64, "Run finished");

    summary.display();

    let failed = summary.failed_stages();
    let predicted = matches!(summary.detail(Stage::Predict), Some(StageDetail::Predicted(_)));

    if full_run && predicted {
        print_completion(COMPLETION_MESSAGE);
    } else if predicted {
        print_completion(&format!("Submission written to {}", config.submission_path().display()));
    } else if full_run {
        print_halted(&format!(
            "Pipeline halted; no submission was written. Failed: {}",
            failed.iter().map(|s| s.name()).collect::<Vec<_>>().join(", ")
        ));
    }

    if !failed.is_empty() {
        anyhow::bail!(
            "{} stage(s) failed: {}",
            failed.len(),
            failed.iter().map(|s| s.name()).collect::<Vec<_>>().join(", ")
        );
    }

    Ok(())
}
