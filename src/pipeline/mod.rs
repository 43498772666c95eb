//! Pipeline module - feature preparation, model fitting and prediction

pub mod config;
pub mod error;
pub mod evaluate;
pub mod features;
pub mod forest;
pub mod loader;
pub mod runner;
pub mod stages;

pub use config::*;
#[allow(unused_imports)]
pub use error::PipelineError;
pub use evaluate::*;
pub use features::*;
#[allow(unused_imports)]
pub use forest::{DecisionTree, ForestConfig, MaxFeatures, RandomForest};
pub use loader::*;
pub use runner::*;
pub use stages::*;
