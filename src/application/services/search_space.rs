//! Exhaustive scoring of partitions over a random search space
//!
//! Every node carries a uniform random value; a partition scores the mean
//! value of its nodes. Used for offline analysis of what the online search
//! should be able to find.

use itertools::iproduct;
use rand::Rng;
use tracing::{debug, info, instrument};

use crate::domain::{build_tree_with, enumerate_partitions, NodeId, Tree};

/// A partition with its score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPartition {
    pub nodes: Vec<NodeId>,
    pub score: f64,
}

/// One cell of a [`survey`] grid.
#[derive(Debug, Clone, PartialEq)]
pub struct SurveyRow {
    pub depth: usize,
    pub branch_count: usize,
    pub split_num: usize,
    /// Partitions evaluated
    pub partition_count: usize,
    pub best_score: f64,
    /// Node names of the best partition
    pub best_names: String,
}

/// Tree whose node data is a uniform sample from `[0, 1)`.
#[derive(Debug)]
pub struct SearchSpace {
    tree: Tree<f64>,
}

impl SearchSpace {
    #[instrument(level = "debug", skip(rng))]
    pub fn random<R>(depth: usize, branch_count: usize, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let tree = build_tree_with(depth, branch_count, |_| rng.gen::<f64>());
        for (_, node) in tree.breadth_first() {
            debug!("{}: {:.3}", node.path, node.data);
        }
        Self { tree }
    }

    pub fn from_tree(tree: Tree<f64>) -> Self {
        Self { tree }
    }

    pub fn tree(&self) -> &Tree<f64> {
        &self.tree
    }

    /// Mean node data; 0.0 for an empty slice.
    pub fn score(&self, nodes: &[NodeId]) -> f64 {
        if nodes.is_empty() {
            return 0.0;
        }
        let total: f64 = nodes
            .iter()
            .filter_map(|&id| self.tree.get(id))
            .map(|node| node.data)
            .sum();
        total / nodes.len() as f64
    }

    /// The `top` best partitions of the whole tree, best first. Ties keep
    /// enumeration order.
    pub fn best_partitions(&self, split_num: usize, top: usize) -> Vec<ScoredPartition> {
        self.scan(split_num, top).1
    }

    /// Enumerates every partition once, returning the total count together
    /// with the `top` best.
    #[instrument(level = "debug", skip(self))]
    pub fn scan(&self, split_num: usize, top: usize) -> (usize, Vec<ScoredPartition>) {
        let mut best: Vec<ScoredPartition> = Vec::new();
        let mut count = 0usize;
        for nodes in enumerate_partitions(&self.tree, self.tree.root(), split_num) {
            count += 1;
            if top == 0 {
                continue;
            }
            let score = self.score(&nodes);
            let pos = best.partition_point(|s| s.score >= score);
            if pos < top {
                best.insert(pos, ScoredPartition { nodes, score });
                best.truncate(top);
            }
        }
        debug!("evaluated {} partitions", count);
        (count, best)
    }
}

/// Builds a random search space for every combination of the given grids
/// and reports the best partition of each.
#[instrument(level = "info", skip(rng))]
pub fn survey<R>(
    depths: &[usize],
    branch_counts: &[usize],
    split_nums: &[usize],
    rng: &mut R,
) -> Vec<SurveyRow>
where
    R: Rng + ?Sized,
{
    iproduct!(depths, branch_counts, split_nums)
        .map(|(&depth, &branch_count, &split_num)| {
            let space = SearchSpace::random(depth, branch_count, &mut *rng);
            let (partition_count, best) = space.scan(split_num, 1);
            let (best_score, best_names) = best
                .first()
                .map(|b| (b.score, space.tree().names(&b.nodes)))
                .unwrap_or_default();
            info!(
                "depth {} branches {} split {}: {} partitions, best {:.3} [{}]",
                depth, branch_count, split_num, partition_count, best_score, best_names
            );
            SurveyRow {
                depth,
                branch_count,
                split_num,
                partition_count,
                best_score,
                best_names,
            }
        })
        .collect()
}
