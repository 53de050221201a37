//! Candidate solutions for the tree search.
//!
//! A hypothesis is EMPTY or holds a root [`Partition`]. Every edit returns a
//! new hypothesis built from a deep clone, so a hypothesis shared between
//! agents is never changed underneath them.

use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

use rand::Rng;
use tracing::{debug, instrument};

use crate::domain::arena::{NodeId, Tree, TreeId};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::partition::{sample_children, Partition};

#[derive(Debug, Clone, Default)]
pub struct Hypothesis {
    root: Option<Partition>,
    /// Tree the root was built against, None while empty
    tree: Option<TreeId>,
}

impl Hypothesis {
    /// The hypothesis with no structure yet.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wraps a hand-built partition after checking that every node in it
    /// belongs to `tree`.
    pub fn from_partition<D>(tree: &Tree<D>, root: Partition) -> DomainResult<Self> {
        if root.leaf_nodes().into_iter().any(|id| !tree.contains(id)) {
            return Err(DomainError::UnknownNode);
        }
        Ok(Self::populated(tree, Some(root)))
    }

    fn populated<D>(tree: &Tree<D>, root: Option<Partition>) -> Self {
        let tree = root.as_ref().map(|_| tree.id());
        Self { root, tree }
    }

    pub fn root(&self) -> Option<&Partition> {
        self.root.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn tree_id(&self) -> Option<TreeId> {
        self.tree
    }

    /// A fresh hypothesis whose root holds `split_num` random children of the
    /// tree root, in branch order.
    #[instrument(level = "debug", skip(tree, rng))]
    pub fn first_split<D, R>(tree: &Tree<D>, split_num: usize, rng: &mut R) -> DomainResult<Self>
    where
        R: Rng + ?Sized,
    {
        let root = sample_children(tree, tree.root(), split_num, rng)?;
        Ok(Self::populated(tree, Some(root)))
    }

    /// Expands a uniformly chosen splittable leaf node, or performs the first
    /// split when empty.
    #[instrument(level = "debug", skip(self, tree, rng))]
    pub fn random_split<D, R>(&self, tree: &Tree<D>, split_num: usize, rng: &mut R) -> DomainResult<Self>
    where
        R: Rng + ?Sized,
    {
        if self.is_empty() {
            return Self::first_split(tree, split_num, rng);
        }
        self.check_tree(tree)?;
        let count = self.count_splittable_leaf_nodes(tree);
        if count == 0 {
            return Err(DomainError::NothingToSplit);
        }
        let node_index = rng.gen_range(0..count);
        debug!("splitting node #{} of {}", node_index, count);
        self.split_at(node_index, split_num, tree, rng)
    }

    /// Collapses a uniformly chosen leaf partition.
    #[instrument(level = "debug", skip(self, tree, rng))]
    pub fn random_prune<D, R>(&self, tree: &Tree<D>, rng: &mut R) -> DomainResult<Self>
    where
        R: Rng + ?Sized,
    {
        if self.is_empty() {
            return Err(DomainError::EmptyHypothesis);
        }
        self.check_tree(tree)?;
        let count = self.count_leaf_splits();
        let leaf_index = rng.gen_range(0..count);
        debug!("pruning leaf partition #{} of {}", leaf_index, count);
        self.prune_at(leaf_index, tree)
    }

    /// Splits the `node_index`-th splittable leaf node of a clone.
    pub fn split_at<D, R>(
        &self,
        node_index: usize,
        split_num: usize,
        tree: &Tree<D>,
        rng: &mut R,
    ) -> DomainResult<Self>
    where
        R: Rng + ?Sized,
    {
        let root = self.root.as_ref().ok_or(DomainError::EmptyHypothesis)?;
        self.check_tree(tree)?;
        let mut clone = root.deep_clone();
        clone.split_node(node_index, split_num, tree, rng)?;
        Ok(Self::populated(tree, Some(clone)))
    }

    /// Prunes the `leaf_index`-th leaf partition of a clone. Pruning the only
    /// leaf partition of a leaf root yields the empty hypothesis.
    pub fn prune_at<D>(&self, leaf_index: usize, tree: &Tree<D>) -> DomainResult<Self> {
        let root = self.root.as_ref().ok_or(DomainError::EmptyHypothesis)?;
        self.check_tree(tree)?;
        let pruned = root.deep_clone().prune_leaf(leaf_index, tree)?;
        Ok(Self::populated(tree, pruned))
    }

    pub fn count_leaf_splits(&self) -> usize {
        self.root.as_ref().map_or(0, Partition::count_leaf_splits)
    }

    pub fn count_splittable_leaf_nodes<D>(&self, tree: &Tree<D>) -> usize {
        self.root
            .as_ref()
            .map_or(0, |root| root.count_splittable_leaf_nodes(tree))
    }

    /// Flattened set of tree nodes; this is the hypothesis' identity.
    pub fn leaf_nodes(&self) -> BTreeSet<NodeId> {
        self.root
            .as_ref()
            .map(|root| root.leaf_nodes().into_iter().collect())
            .unwrap_or_default()
    }

    fn check_tree<D>(&self, tree: &Tree<D>) -> DomainResult<()> {
        match self.tree {
            Some(expected) if expected != tree.id() => Err(DomainError::ForeignTree {
                expected,
                actual: tree.id(),
            }),
            _ => Ok(()),
        }
    }
}

impl PartialEq for Hypothesis {
    fn eq(&self, other: &Self) -> bool {
        self.leaf_nodes() == other.leaf_nodes()
    }
}

impl Eq for Hypothesis {}

impl Hash for Hypothesis {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.leaf_nodes().hash(state);
    }
}
