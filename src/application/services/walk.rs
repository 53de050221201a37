//! Random walk over hypotheses
//!
//! Drives the split/prune state machine from the empty hypothesis, keeping
//! every intermediate hypothesis. No scoring or agent interaction happens
//! here; it exists to inspect how the mutation API moves through the space.

use std::collections::HashMap;
use std::fmt;

use rand::Rng;
use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult};
use crate::config::Settings;
use crate::domain::{Hypothesis, Tree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Split,
    Prune,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepKind::Split => f.pad("split"),
            StepKind::Prune => f.pad("prune"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WalkStep {
    pub step: usize,
    pub kind: StepKind,
    pub hypothesis: Hypothesis,
    pub leaf_splits: usize,
    pub splittable_nodes: usize,
}

#[derive(Debug, Clone)]
pub struct HypothesisWalk {
    split_num: usize,
    steps: usize,
    prune_probability: f64,
}

impl HypothesisWalk {
    pub fn new(split_num: usize, steps: usize, prune_probability: f64) -> ApplicationResult<Self> {
        if !(0.0..=1.0).contains(&prune_probability) {
            return Err(ApplicationError::Config {
                message: format!("prune probability must be within [0, 1], got {prune_probability}"),
            });
        }
        Ok(Self {
            split_num,
            steps,
            prune_probability,
        })
    }

    pub fn from_settings(settings: &Settings) -> ApplicationResult<Self> {
        Self::new(
            settings.split_num,
            settings.walk.steps,
            settings.walk.prune_probability,
        )
    }

    /// Runs the walk. Pruning is forced when nothing can be split, splitting
    /// when nothing can be pruned.
    #[instrument(level = "debug", skip(self, tree, rng))]
    pub fn run<D, R>(&self, tree: &Tree<D>, rng: &mut R) -> ApplicationResult<Vec<WalkStep>>
    where
        R: Rng + ?Sized,
    {
        if self.split_num == 0 || tree.children(tree.root()).len() < self.split_num {
            return Err(ApplicationError::Unsplittable {
                depth: tree.depth(),
                branch_count: tree.branch_count(),
                split_num: self.split_num,
            });
        }

        let mut current = Hypothesis::empty();
        let mut trail = Vec::with_capacity(self.steps);
        for step in 0..self.steps {
            let can_split = current.is_empty() || current.count_splittable_leaf_nodes(tree) > 0;
            let can_prune = !current.is_empty();
            let kind = if can_prune && (!can_split || rng.gen_bool(self.prune_probability)) {
                StepKind::Prune
            } else {
                StepKind::Split
            };
            current = match kind {
                StepKind::Split => current.random_split(tree, self.split_num, rng)?,
                StepKind::Prune => current.random_prune(tree, rng)?,
            };
            let leaf_splits = current.count_leaf_splits();
            let splittable_nodes = current.count_splittable_leaf_nodes(tree);
            debug!(
                "step {}: {} -> {} leaf splits, {} splittable nodes",
                step, kind, leaf_splits, splittable_nodes
            );
            trail.push(WalkStep {
                step,
                kind,
                hypothesis: current.clone(),
                leaf_splits,
                splittable_nodes,
            });
        }
        Ok(trail)
    }
}

/// Groups structurally equal hypotheses (same flattened node set) and counts
/// them, largest cluster first. Ties keep first-seen order.
pub fn cluster_counts<'a, I>(hypotheses: I) -> Vec<(Hypothesis, usize)>
where
    I: IntoIterator<Item = &'a Hypothesis>,
{
    let mut order: Vec<Hypothesis> = Vec::new();
    let mut counts: HashMap<Hypothesis, usize> = HashMap::new();
    for hypothesis in hypotheses {
        let count = counts.entry(hypothesis.clone()).or_insert(0);
        if *count == 0 {
            order.push(hypothesis.clone());
        }
        *count += 1;
    }
    let mut clusters: Vec<(Hypothesis, usize)> = order
        .into_iter()
        .map(|h| {
            let count = counts.get(&h).copied().unwrap_or_default();
            (h, count)
        })
        .collect();
    clusters.sort_by(|a, b| b.1.cmp(&a.1));
    clusters
}
