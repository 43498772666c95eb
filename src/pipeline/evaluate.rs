//! Accuracy and per-class classification metrics

use anyhow::Result;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Table};

use super::error::PipelineError;

/// Precision, recall and F1 for one class label
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMetrics {
    pub label: u8,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Number of true instances of this label
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationReport {
    pub accuracy: f64,
    pub classes: Vec<ClassMetrics>,
}

/// Compare `predictions` with `truth` row by row.
pub fn evaluate(predictions: &[u8], truth: &[u8]) -> Result<EvaluationReport> {
    if predictions.len() != truth.len() {
        return Err(PipelineError::LengthMismatch {
            expected: truth.len(),
            actual: predictions.len(),
        }
        .into());
    }
    if truth.is_empty() {
        anyhow::bail!("Cannot evaluate an empty prediction set");
    }

    let correct = predictions
        .iter()
        .zip(truth)
        .filter(|(p, t)| p == t)
        .count();
    let accuracy = correct as f64 / truth.len() as f64;

    let classes = [0u8, 1]
        .into_iter()
        .map(|label| {
            let tp = count(predictions, truth, |p, t| p == label && t == label);
            let fp = count(predictions, truth, |p, t| p == label && t != label);
            let fn_ = count(predictions, truth, |p, t| p != label && t == label);

            let precision = ratio(tp, tp + fp);
            let recall = ratio(tp, tp + fn_);
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };

            ClassMetrics {
                label,
                precision,
                recall,
                f1,
                support: tp + fn_,
            }
        })
        .collect();

    Ok(EvaluationReport { accuracy, classes })
}

fn count(predictions: &[u8], truth: &[u8], pred: impl Fn(u8, u8) -> bool) -> usize {
    predictions
        .iter()
        .zip(truth)
        .filter(|(p, t)| pred(**p, **t))
        .count()
}

// Zero-denominator metrics are reported as 0.0
fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

impl EvaluationReport {
    /// Classification report rendered as a table
    pub fn to_table(&self) -> Table {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Class").add_attribute(Attribute::Bold),
            Cell::new("Precision").add_attribute(Attribute::Bold),
            Cell::new("Recall").add_attribute(Attribute::Bold),
            Cell::new("F1").add_attribute(Attribute::Bold),
            Cell::new("Support").add_attribute(Attribute::Bold),
        ]);

        for class in &self.classes {
            table.add_row(vec![
                Cell::new(class.label),
                Cell::new(format!("{:.2}", class.precision)),
                Cell::new(format!("{:.2}", class.recall)),
                Cell::new(format!("{:.2}", class.f1)),
                Cell::new(class.support),
            ]);
        }

        table.add_row(vec![
            Cell::new("accuracy").add_attribute(Attribute::Bold),
            Cell::new(""),
            Cell::new(""),
            Cell::new(format!("{:.2}", self.accuracy)).add_attribute(Attribute::Bold),
            Cell::new(self.classes.iter().map(|c| c.support).sum::<usize>()),
        ]);

        table
    }
}
