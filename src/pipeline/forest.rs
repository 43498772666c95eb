//! Random forest classifier for binary 0/1 targets
//!
//! Each tree is a CART tree grown on a bootstrap sample, choosing splits that
//! maximize Gini impurity reduction among a random subset of features at each
//! node. The forest predicts by majority vote across trees.
//!
//! Trees are fit in parallel, but every tree draws from its own RNG seeded from
//! the forest seed, so a given seed always yields the same forest.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::error::PipelineError;

/// How many features each split considers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaxFeatures {
    /// Square root of the feature count (default for classification)
    #[default]
    Sqrt,
    /// Base-2 logarithm of the feature count
    Log2,
    /// Every feature at every split
    All,
}

impl MaxFeatures {
    /// Number of candidate features for `n_features` inputs, at least 1.
    pub fn resolve(self, n_features: usize) -> usize {
        let k = match self {
            MaxFeatures::Sqrt => (n_features as f64).sqrt() as usize,
            MaxFeatures::Log2 => (n_features as f64).log2() as usize,
            MaxFeatures::All => n_features,
        };
        k.clamp(1, n_features.max(1))
    }
}

impl std::fmt::Display for MaxFeatures {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MaxFeatures::Sqrt => write!(f, "sqrt"),
            MaxFeatures::Log2 => write!(f, "log2"),
            MaxFeatures::All => write!(f, "all"),
        }
    }
}

impl std::str::FromStr for MaxFeatures {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqrt" => Ok(MaxFeatures::Sqrt),
            "log2" => Ok(MaxFeatures::Log2),
            "all" => Ok(MaxFeatures::All),
            _ => Err(format!(
                "Unknown max features setting: '{}'. Use 'sqrt', 'log2' or 'all'.",
                s
            )),
        }
    }
}

/// Forest hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_estimators: usize,
    /// `None` grows trees until leaves are pure or too small to split
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: Some(5),
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            seed: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    Leaf {
        /// Fraction of training samples in this leaf with label 1
        positive_fraction: f64,
        samples: usize,
    },
    Split {
        feature: usize,
        /// Rows with `value <= threshold` go left
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A fitted CART tree stored as a flat node arena; node 0 is the root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

/// Gini impurity for binary classification: 2 * p * (1 - p)
fn gini_impurity(positives: f64, negatives: f64) -> f64 {
    let total = positives + negatives;
    if total == 0.0 {
        return 0.0;
    }
    let p = positives / total;
    2.0 * p * (1.0 - p)
}

/// Best threshold on one feature for the given samples.
///
/// Returns `(threshold, gain)` or `None` when no split leaves at least
/// `min_samples_leaf` samples on both sides with a positive gain.
fn find_best_split(
    rows: &[Vec<f64>],
    labels: &[u8],
    indices: &[usize],
    feature: usize,
    min_samples_leaf: usize,
) -> Option<(f64, f64)> {
    let n = indices.len();
    if n < 2 * min_samples_leaf.max(1) {
        return None;
    }

    let mut pairs: Vec<(f64, u8)> = indices
        .iter()
        .map(|&i| (rows[i][feature], labels[i]))
        .collect();
    pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let total_positives = pairs.iter().filter(|(_, l)| *l == 1).count() as f64;
    let total_negatives = n as f64 - total_positives;
    let parent_gini = gini_impurity(total_positives, total_negatives);

    let mut best_gain = 0.0;
    let mut best_threshold = None;

    let mut left_positives = 0.0f64;
    let mut left_negatives = 0.0f64;

    for i in 0..n - 1 {
        if pairs[i].1 == 1 {
            left_positives += 1.0;
        } else {
            left_negatives += 1.0;
        }

        let left_count = i + 1;
        let right_count = n - left_count;
        if left_count < min_samples_leaf || right_count < min_samples_leaf {
            continue;
        }

        // No threshold separates equal values
        if (pairs[i].0 - pairs[i + 1].0).abs() < 1e-10 {
            continue;
        }

        let right_positives = total_positives - left_positives;
        let right_negatives = total_negatives - left_negatives;

        let left_prop = left_count as f64 / n as f64;
        let right_prop = right_count as f64 / n as f64;
        let weighted_child_gini = left_prop * gini_impurity(left_positives, left_negatives)
            + right_prop * gini_impurity(right_positives, right_negatives);

        let gain = parent_gini - weighted_child_gini;
        if gain > best_gain {
            best_gain = gain;
            best_threshold = Some((pairs[i].0 + pairs[i + 1].0) / 2.0);
        }
    }

    best_threshold.map(|threshold| (threshold, best_gain))
}

impl DecisionTree {
    /// Grow a tree on `indices` (a bootstrap sample may repeat rows).
    fn fit(
        rows: &[Vec<f64>],
        labels: &[u8],
        indices: Vec<usize>,
        config: &ForestConfig,
        rng: &mut StdRng,
    ) -> Self {
        let mut tree = DecisionTree { nodes: Vec::new() };
        let n_features = rows.first().map_or(0, |r| r.len());
        tree.grow(rows, labels, indices, 0, n_features, config, rng);
        tree
    }

    #[allow(clippy::too_many_arguments)]
    fn grow(
        &mut self,
        rows: &[Vec<f64>],
        labels: &[u8],
        indices: Vec<usize>,
        depth: usize,
        n_features: usize,
        config: &ForestConfig,
        rng: &mut StdRng,
    ) -> usize {
        let samples = indices.len();
        let positives = indices.iter().filter(|&&i| labels[i] == 1).count();
        let node_idx = self.nodes.len();
        self.nodes.push(Node::Leaf {
            positive_fraction: if samples == 0 {
                0.0
            } else {
                positives as f64 / samples as f64
            },
            samples,
        });

        let depth_reached = config.max_depth.is_some_and(|max| depth >= max);
        let pure = positives == 0 || positives == samples;
        if depth_reached || pure || samples < config.min_samples_split || n_features == 0 {
            return node_idx;
        }

        let k = config.max_features.resolve(n_features);
        let candidates = rand::seq::index::sample(rng, n_features, k);

        let mut best: Option<(usize, f64, f64)> = None;
        for feature in candidates.iter() {
            if let Some((threshold, gain)) =
                find_best_split(rows, labels, &indices, feature, config.min_samples_leaf)
            {
                if best.map_or(true, |(_, _, best_gain)| gain > best_gain) {
                    best = Some((feature, threshold, gain));
                }
            }
        }

        let Some((feature, threshold, _)) = best else {
            return node_idx;
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| rows[i][feature] <= threshold);

        let left = self.grow(rows, labels, left_indices, depth + 1, n_features, config, rng);
        let right = self.grow(rows, labels, right_indices, depth + 1, n_features, config, rng);

        self.nodes[node_idx] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        node_idx
    }

    /// Class-1 fraction of the leaf `row` falls into
    pub fn predict_proba_row(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf {
                    positive_fraction, ..
                } => return *positive_fraction,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Majority class of the leaf; an even split goes to 0.
    pub fn predict_row(&self, row: &[f64]) -> u8 {
        u8::from(self.predict_proba_row(row) > 0.5)
    }

    /// Longest root-to-leaf path, counted in edges
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match &nodes[idx] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    /// Check that every split reads a known feature and points forward to
    /// existing nodes, so traversal always terminates inside the arena.
    fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            if let Node::Split {
                feature,
                left,
                right,
                ..
            } = node
            {
                if *feature >= n_features {
                    return Err(format!(
                        "node {} splits on feature {} but the model has {} features",
                        idx, feature, n_features
                    ));
                }
                for child in [*left, *right] {
                    if child <= idx || child >= self.nodes.len() {
                        return Err(format!("node {} has invalid child index {}", idx, child));
                    }
                }
            }
        }
        Ok(())
    }
}

/// A fitted forest together with the feature order it expects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    config: ForestConfig,
    feature_names: Vec<String>,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Fit a forest on row-major `rows` and 0/1 `labels`.
    pub fn fit(
        config: &ForestConfig,
        rows: &[Vec<f64>],
        labels: &[u8],
        feature_names: Vec<String>,
    ) -> Result<Self> {
        if rows.is_empty() {
            return Err(PipelineError::EmptyTrainingSet.into());
        }
        if labels.len() != rows.len() {
            return Err(PipelineError::LengthMismatch {
                expected: rows.len(),
                actual: labels.len(),
            }
            .into());
        }
        if let Some((row, value)) = labels.iter().enumerate().find(|(_, l)| **l > 1) {
            return Err(PipelineError::InvalidLabel {
                row,
                value: value.to_string(),
            }
            .into());
        }
        check_width(rows, feature_names.len())?;
        if config.n_estimators == 0 {
            anyhow::bail!("n_estimators must be at least 1");
        }

        let mut seeder = StdRng::seed_from_u64(config.seed);
        let tree_seeds: Vec<u64> = (0..config.n_estimators).map(|_| seeder.gen()).collect();
        let n = rows.len();

        let trees = tree_seeds
            .par_iter()
            .map(|&seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                let indices: Vec<usize> = if config.bootstrap {
                    (0..n).map(|_| rng.gen_range(0..n)).collect()
                } else {
                    (0..n).collect()
                };
                DecisionTree::fit(rows, labels, indices, config, &mut rng)
            })
            .collect();

        Ok(Self {
            config: config.clone(),
            feature_names,
            trees,
        })
    }

    /// One 0/1 label per row by majority vote; ties go to 0.
    pub fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<u8>> {
        check_width(rows, self.feature_names.len())?;
        let n_trees = self.trees.len();
        Ok(rows
            .iter()
            .map(|row| {
                let votes = self.trees.iter().filter(|t| t.predict_row(row) == 1).count();
                u8::from(2 * votes > n_trees)
            })
            .collect())
    }

    /// Mean class-1 probability across trees for each row
    pub fn predict_proba(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        check_width(rows, self.feature_names.len())?;
        let n_trees = self.trees.len() as f64;
        Ok(rows
            .iter()
            .map(|row| {
                self.trees
                    .iter()
                    .map(|t| t.predict_proba_row(row))
                    .sum::<f64>()
                    / n_trees
            })
            .collect())
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// Serialize the fitted model to `path` as JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create model file: {}", path.display()))?;
        serde_json::to_writer(BufWriter::new(file), self)
            .with_context(|| format!("Failed to serialize model to {}", path.display()))?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open model file: {}", path.display()))?;
        let model: RandomForest = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to deserialize model from {}", path.display()))?;
        model
            .validate()
            .with_context(|| format!("Rejected model file {}", path.display()))?;
        Ok(model)
    }

    fn validate(&self) -> Result<(), PipelineError> {
        if self.trees.is_empty() {
            return Err(PipelineError::InvalidModel {
                reason: "forest has no trees".to_string(),
            });
        }
        let n_features = self.feature_names.len();
        for (tree_idx, tree) in self.trees.iter().enumerate() {
            tree.validate(n_features)
                .map_err(|reason| PipelineError::InvalidModel {
                    reason: format!("tree {}: {}", tree_idx, reason),
                })?;
        }
        Ok(())
    }
}

fn check_width(rows: &[Vec<f64>], expected: usize) -> Result<()> {
    if let Some(row) = rows.iter().find(|r| r.len() != expected) {
        return Err(PipelineError::LengthMismatch {
            expected,
            actual: row.len(),
        }
        .into());
    }
    Ok(())
}
