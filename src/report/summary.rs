//! Pipeline run summary

use std::time::Duration;

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;

use crate::pipeline::{Stage, StageDetail, StageOutcome};

/// Outcome of every stage attempted in one run
#[derive(Debug, Default)]
pub struct PipelineSummary {
    pub outcomes: Vec<StageOutcome>,
}

impl PipelineSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, outcome: StageOutcome) {
        self.outcomes.push(outcome);
    }

    /// True when at least one stage ran and none failed
    pub fn is_success(&self) -> bool {
        !self.outcomes.is_empty() && self.outcomes.iter().all(StageOutcome::is_success)
    }

    pub fn failed_stages(&self) -> Vec<Stage> {
        self.outcomes
            .iter()
            .filter(|o| !o.is_success())
            .map(|o| o.stage)
            .collect()
    }

    pub fn ran(&self, stage: Stage) -> bool {
        self.outcomes.iter().any(|o| o.stage == stage)
    }

    pub fn detail(&self, stage: Stage) -> Option<&StageDetail> {
        self.outcomes
            .iter()
            .find(|o| o.stage == stage)
            .and_then(|o| o.result.as_ref().ok())
    }

    pub fn total_time(&self) -> Duration {
        self.outcomes.iter().map(|o| o.elapsed).sum()
    }

    pub fn display(&self) {
        println!();
        println!(
            "    {} {}",
            style("📋").cyan(),
            style("PIPELINE SUMMARY").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!();

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Stage").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
            Cell::new("Time").add_attribute(Attribute::Bold),
            Cell::new("Details").add_attribute(Attribute::Bold),
        ]);

        for outcome in &self.outcomes {
            let (status, color, details) = match &outcome.result {
                Ok(detail) => ("✅ ok", Color::Green, detail.to_string()),
                Err(e) => ("❌ failed", Color::Red, format!("{:#}", e)),
            };
            table.add_row(vec![
                Cell::new(outcome.stage.title()),
                Cell::new(status).fg(color).add_attribute(Attribute::Bold),
                Cell::new(format_duration(outcome.elapsed)),
                Cell::new(details),
            ]);
        }

        for line in table.to_string().lines() {
            println!("    {}", line);
        }
        println!(
            "      {} {}",
            style("Total time:").yellow(),
            format_duration(self.total_time())
        );

        if let Some(StageDetail::Prepared(prepared)) = self.detail(Stage::Prepare) {
            println!();
            println!(
                "      {} {}",
                style("Survival rate:").yellow(),
                prepared.survival_rates
            );
        }

        if let Some(StageDetail::Trained(trained)) = self.detail(Stage::Train) {
            println!();
            println!(
                "    {} {}",
                style("📝").cyan(),
                style("TRAINING REPORT").white().bold()
            );
            println!("    {}", style("─".repeat(50)).dim());
            for line in trained.training_report.to_table().to_string().lines() {
                println!("    {}", line);
            }
        }

        let failed = self.failed_stages();
        if !failed.is_empty() {
            println!();
            println!(
                "      {} {}",
                style("Failed stages:").red().bold(),
                failed
                    .iter()
                    .map(|s| s.name())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
    }
}

fn format_duration(elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs < 1.0 {
        format!("{:.0}ms", secs * 1000.0)
    } else {
        format!("{:.2}s", secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(stage: Stage) -> StageOutcome {
        StageOutcome {
            stage,
            elapsed: Duration::from_millis(5),
            result: Err(anyhow::anyhow!("boom")),
        }
    }

    #[test]
    fn test_empty_summary_is_not_success() {
        assert!(!PipelineSummary::new().is_success());
    }

    #[test]
    fn test_failed_stages_listed() {
        let mut summary = PipelineSummary::new();
        summary.push(failed(Stage::Train));
        summary.push(failed(Stage::Predict));

        assert!(!summary.is_success());
        assert_eq!(summary.failed_stages(), vec![Stage::Train, Stage::Predict]);
        assert!(summary.ran(Stage::Train));
        assert!(!summary.ran(Stage::Prepare));
        assert_eq!(summary.total_time(), Duration::from_millis(10));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
    }
}
