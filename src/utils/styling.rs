//! Terminal styling utilities for stage headers and run banners

use console::{style, Emoji};
use std::time::Duration;

use crate::pipeline::PipelineConfig;

// Emoji icons with fallbacks for terminals that don't support them
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "[*] ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", ">> ");
pub static FOLDER: Emoji<'_, '_> = Emoji("📂 ", "");
pub static SAVE: Emoji<'_, '_> = Emoji("💾 ", "");
pub static TREE: Emoji<'_, '_> = Emoji("🌲 ", "");

/// Print the application banner
pub fn print_banner(version: &str) {
    println!();
    println!("    {}", style("L I F E B O A T").cyan().bold());
    println!(
        "    {}",
        style("Survival prediction from passenger records").dim()
    );
    println!("    {}", style(format!("v{}", version)).dim());
    println!("    {}", style("━".repeat(50)).dim());
    println!();
}

/// Print configuration card
pub fn print_config(config: &PipelineConfig) {
    let box_width = 56;
    let line = "─".repeat(box_width - 2);
    let max_depth = config
        .forest
        .max_depth
        .map_or_else(|| "unlimited".to_string(), |d| d.to_string());

    println!("    ┌{}┐", line);
    println!("    │ {}", style("⚙️  Configuration").cyan().bold());
    println!("    ├{}┤", line);
    println!("    │  {} Train:  {}", FOLDER, truncate_string(&config.train_path.display().to_string(), 38));
    println!("    │  {} Test:   {}", FOLDER, truncate_string(&config.test_path.display().to_string(), 38));
    println!("    │  {} Output: {}", SAVE, truncate_string(&config.output_dir.display().to_string(), 38));
    println!("    │  {} Model:  {}", SAVE, truncate_string(&config.model_path().display().to_string(), 38));
    println!("    ├{}┤", line);
    println!(
        "    │  {} Trees: {}  Max depth: {}  Seed: {}",
        TREE,
        style(config.forest.n_estimators).yellow(),
        style(max_depth).yellow(),
        style(config.forest.seed).yellow()
    );
    println!("    └{}┘", line);
    println!();
}

/// Print a step header with styling
pub fn print_step_header(step_num: u8, title: &str) {
    println!();
    println!(
        "    {} {} {}",
        style(format!("STEP {}", step_num)).cyan().bold(),
        style("│").dim(),
        style(title).white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
}

/// Print elapsed time for a step
pub fn print_step_time(elapsed: Duration) {
    println!(
        "    {}",
        style(format!("⏱  {:.2}s", elapsed.as_secs_f64())).dim()
    );
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("    {} {}", INFO, message);
}

/// Print the final completion message
pub fn print_completion(message: &str) {
    println!();
    println!("    {} {}", ROCKET, style(message).green().bold());
    println!();
}

/// Print the final line of a run that stopped early
pub fn print_halted(message: &str) {
    println!();
    println!("    {} {}", style("✗").red().bold(), style(message).red().bold());
    println!();
}

fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let tail: String = s
            .chars()
            .rev()
            .take(max_len - 3)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("...{}", tail)
    }
}
