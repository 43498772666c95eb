//! Lifeboat: Survival Prediction Library
//!
//! Prepares passenger features, fits a random forest and writes
//! survival predictions as a submission table.

pub mod cli;
pub mod logging;
pub mod pipeline;
pub mod report;
pub mod utils;
