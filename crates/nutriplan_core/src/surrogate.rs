//! Tree-ensemble surrogate for the yield response.
//!
//! The surrogate path trains a small regression forest on synthetic samples
//! drawn from the closed-form model (with observation noise) and lets the
//! global stage score candidates through it. Only primary macronutrient
//! rates are features; the remaining dimensions move so little yield that
//! they would only dilute the splits.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng, distr::Distribution};
use serde::{Deserialize, Serialize};

use crate::formulate::Problem;
use crate::response::ResponseModel;

/// Training and forest-shape settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurrogateConfig {
    #[serde(default = "default_samples")]
    pub samples: usize,
    /// Standard deviation of the Gaussian noise added to training targets.
    #[serde(default = "default_noise_std")]
    pub noise_std: f64,
    #[serde(default = "default_trees")]
    pub trees: usize,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_min_leaf")]
    pub min_leaf: usize,
    #[serde(default = "default_surrogate_seed")]
    pub seed: u64,
}

fn default_samples() -> usize {
    1000
}

fn default_noise_std() -> f64 {
    0.01
}

fn default_trees() -> usize {
    25
}

fn default_max_depth() -> usize {
    6
}

fn default_min_leaf() -> usize {
    5
}

fn default_surrogate_seed() -> u64 {
    7
}

impl Default for SurrogateConfig {
    fn default() -> Self {
        Self {
            samples: default_samples(),
            noise_std: default_noise_std(),
            trees: default_trees(),
            max_depth: default_max_depth(),
            min_leaf: default_min_leaf(),
            seed: default_surrogate_seed(),
        }
    }
}

/// One synthetic observation: macro rates and the noisy yield fraction.
#[derive(Debug, Clone)]
pub struct TrainingSample {
    pub rates: Vec<f64>,
    pub target: f64,
}

/// Anything the objective can query for a yield estimate.
pub trait SurrogateModel: Sync {
    /// Predicted yield fraction for a macro-rate vector.
    fn predict(&self, macro_rates: &[f64]) -> f64;

    /// Prediction plus a spread estimate across the ensemble.
    fn predict_with_spread(&self, macro_rates: &[f64]) -> (f64, f64);
}

/// Draw synthetic observations from the closed-form model.
///
/// Macro rates are sampled uniformly inside their bounds; non-macro
/// dimensions stay pinned at the formulator's guess, matching how the
/// surrogate is later queried.
#[must_use]
pub fn generate_training_samples(
    config: &SurrogateConfig,
    problem: &Problem,
    model: &ResponseModel<'_>,
) -> Vec<TrainingSample> {
    let mut rng = SmallRng::seed_from_u64(config.seed);
    // A negative noise width in a hand-edited config just disables noise.
    let noise = rand_distr::Normal::new(0.0, config.noise_std.max(0.0)).ok();
    let bounds = problem.bounds();
    let mut full_rates = problem.initial_guess();
    let mut samples = Vec::with_capacity(config.samples);
    for _ in 0..config.samples {
        let mut macro_rates = Vec::with_capacity(problem.macro_indices().len());
        for &index in problem.macro_indices() {
            let (lower, upper) = bounds[index];
            let rate = if upper > lower {
                rng.random_range(lower..upper)
            } else {
                lower
            };
            full_rates[index] = rate;
            macro_rates.push(rate);
        }
        let jitter = noise.as_ref().map_or(0.0, |n| n.sample(&mut rng));
        samples.push(TrainingSample {
            rates: macro_rates,
            target: model.yield_fraction(&full_rates) + jitter,
        });
    }
    samples
}

/// Bootstrap-aggregated regression trees over macro rates.
#[derive(Debug, Clone)]
pub struct RegressionForest {
    trees: Vec<RegressionTree>,
}

impl RegressionForest {
    /// Fit one tree per bootstrap resample. Deterministic for a fixed
    /// config seed.
    #[must_use]
    pub fn fit(samples: &[TrainingSample], config: &SurrogateConfig) -> Self {
        let trees = (0..config.trees)
            .map(|tree_index| {
                let mut rng = SmallRng::seed_from_u64(config.seed.wrapping_add(tree_index as u64));
                let indices: Vec<usize> = if samples.is_empty() {
                    Vec::new()
                } else {
                    (0..samples.len())
                        .map(|_| rng.random_range(0..samples.len()))
                        .collect()
                };
                RegressionTree::fit(samples, &indices, config)
            })
            .collect();
        Self { trees }
    }
}

impl SurrogateModel for RegressionForest {
    fn predict(&self, macro_rates: &[f64]) -> f64 {
        self.predict_with_spread(macro_rates).0
    }

    fn predict_with_spread(&self, macro_rates: &[f64]) -> (f64, f64) {
        if self.trees.is_empty() {
            return (0.0, 0.0);
        }
        let votes: Vec<f64> = self
            .trees
            .iter()
            .map(|tree| tree.predict(macro_rates))
            .collect();
        let mean = votes.iter().sum::<f64>() / votes.len() as f64;
        let variance = votes
            .iter()
            .map(|v| (v - mean) * (v - mean))
            .sum::<f64>()
            / votes.len() as f64;
        (mean, variance.sqrt())
    }
}

#[derive(Debug, Clone)]
enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

#[derive(Debug, Clone)]
struct RegressionTree {
    nodes: Vec<TreeNode>,
}

impl RegressionTree {
    fn fit(samples: &[TrainingSample], indices: &[usize], config: &SurrogateConfig) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(samples, indices, 0, config);
        tree
    }

    /// Recursively grow a node, returning its index in the arena.
    fn grow(
        &mut self,
        samples: &[TrainingSample],
        indices: &[usize],
        depth: usize,
        config: &SurrogateConfig,
    ) -> usize {
        let mean = node_mean(samples, indices);
        if depth >= config.max_depth || indices.len() < 2 * config.min_leaf {
            return self.push(TreeNode::Leaf { value: mean });
        }

        let Some((feature, threshold)) = best_split(samples, indices, config.min_leaf) else {
            return self.push(TreeNode::Leaf { value: mean });
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| samples[i].rates[feature] <= threshold);

        let node = self.push(TreeNode::Leaf { value: mean });
        let left = self.grow(samples, &left_indices, depth + 1, config);
        let right = self.grow(samples, &right_indices, depth + 1, config);
        self.nodes[node] = TreeNode::Split {
            feature,
            threshold,
            left,
            right,
        };
        node
    }

    fn push(&mut self, node: TreeNode) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn predict(&self, rates: &[f64]) -> f64 {
        let mut index = 0usize;
        loop {
            match &self.nodes[index] {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let rate = rates.get(*feature).copied().unwrap_or(0.0);
                    index = if rate <= *threshold { *left } else { *right };
                }
            }
        }
    }
}

fn node_mean(samples: &[TrainingSample], indices: &[usize]) -> f64 {
    if indices.is_empty() {
        return 0.0;
    }
    indices.iter().map(|&i| samples[i].target).sum::<f64>() / indices.len() as f64
}

/// Best axis-aligned split by squared-error reduction, trying decile
/// thresholds per feature. `None` when nothing improves on the parent.
fn best_split(
    samples: &[TrainingSample],
    indices: &[usize],
    min_leaf: usize,
) -> Option<(usize, f64)> {
    let feature_count = indices
        .first()
        .map(|&i| samples[i].rates.len())
        .unwrap_or(0);
    let parent_sse = node_sse(samples, indices);
    let mut best: Option<(usize, f64, f64)> = None;

    for feature in 0..feature_count {
        let mut values: Vec<f64> = indices.iter().map(|&i| samples[i].rates[feature]).collect();
        values.sort_by(f64::total_cmp);
        for decile in 1..10 {
            let position = indices.len() * decile / 10;
            let threshold = values[position.min(values.len() - 1)];
            let left: Vec<usize> = indices
                .iter()
                .copied()
                .filter(|&i| samples[i].rates[feature] <= threshold)
                .collect();
            if left.len() < min_leaf || indices.len() - left.len() < min_leaf {
                continue;
            }
            let right: Vec<usize> = indices
                .iter()
                .copied()
                .filter(|&i| samples[i].rates[feature] > threshold)
                .collect();
            let split_sse = node_sse(samples, &left) + node_sse(samples, &right);
            let improvement = parent_sse - split_sse;
            if improvement > 1e-12
                && best.is_none_or(|(_, _, best_improvement)| improvement > best_improvement)
            {
                best = Some((feature, threshold, improvement));
            }
        }
    }

    best.map(|(feature, threshold, _)| (feature, threshold))
}

fn node_sse(samples: &[TrainingSample], indices: &[usize]) -> f64 {
    let mean = node_mean(samples, indices);
    indices
        .iter()
        .map(|&i| {
            let d = samples[i].target - mean;
            d * d
        })
        .sum()
}
