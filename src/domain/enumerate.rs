//! Lazy enumeration of every k-ary recursive partition of a subtree.
//!
//! A partition of `node` is either `[node]` or, for some choice of `k`
//! distinct children, the concatenation of one partition per chosen child.
//! Children are combined in lexicographic order and the per-child choices
//! vary rightmost first, so the sequence is deterministic.

use itertools::structs::Combinations;
use itertools::Itertools;
use tracing::instrument;

use crate::domain::arena::{NodeId, Tree};

/// All partitions of `node`'s subtree with split arity `split_num`.
///
/// The first item is always `[node]`. Nodes with fewer than `split_num`
/// children, and `split_num == 0`, contribute only that base case.
#[instrument(level = "debug", skip(tree))]
pub fn enumerate_partitions<D>(tree: &Tree<D>, node: NodeId, split_num: usize) -> Partitions<'_, D> {
    Partitions::new(tree, node, split_num)
}

/// Shorthand for `enumerate_partitions(tree, node, 2)`.
pub fn binary_partitions<D>(tree: &Tree<D>, node: NodeId) -> Partitions<'_, D> {
    enumerate_partitions(tree, node, 2)
}

/// Closed form of the partition count for the root of
/// `build_tree(depth, branch_count)`:
/// `count(leaf) = 1`, `count(level) = 1 + C(b, k) * count(level - 1)^k`.
///
/// Saturates at `u128::MAX`.
pub fn expected_partition_count(depth: usize, branch_count: usize, split_num: usize) -> u128 {
    if split_num == 0 {
        return 1;
    }
    let ways = binomial(branch_count as u128, split_num as u128);
    (1..depth.max(1)).fold(1u128, |below, _| {
        let mut product = 1u128;
        for _ in 0..split_num {
            product = product.saturating_mul(below);
        }
        ways.saturating_mul(product).saturating_add(1)
    })
}

fn binomial(n: u128, k: u128) -> u128 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    (0..k).fold(1u128, |acc, i| acc.saturating_mul(n - i) / (i + 1))
}

/// Iterator returned by [`enumerate_partitions`].
///
/// Holds only borrowed tree state plus one sub-iterator per chosen child, so
/// dropping it mid-way releases everything.
pub struct Partitions<'a, D> {
    tree: &'a Tree<D>,
    node: NodeId,
    split_num: usize,
    base_pending: bool,
    combinations: Option<Combinations<std::vec::IntoIter<NodeId>>>,
    product: Option<ChildProduct<'a, D>>,
}

impl<'a, D> Partitions<'a, D> {
    fn new(tree: &'a Tree<D>, node: NodeId, split_num: usize) -> Self {
        let children = tree.children(node);
        let combinations = if split_num > 0 && children.len() >= split_num {
            Some(children.to_vec().into_iter().combinations(split_num))
        } else {
            None
        };
        Self {
            tree,
            node,
            split_num,
            base_pending: tree.contains(node),
            combinations,
            product: None,
        }
    }
}

impl<D> Iterator for Partitions<'_, D> {
    type Item = Vec<NodeId>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.base_pending {
            self.base_pending = false;
            return Some(vec![self.node]);
        }
        loop {
            if let Some(product) = self.product.as_mut() {
                if let Some(partition) = product.next_partition() {
                    return Some(partition);
                }
                self.product = None;
            }
            let chosen = self.combinations.as_mut()?.next()?;
            self.product = Some(ChildProduct::new(self.tree, chosen, self.split_num));
        }
    }
}

/// Cartesian product over the partitions of a fixed set of chosen children.
///
/// Works like an odometer: the last child advances first, and every child to
/// the right of an advanced one restarts from a fresh enumerator.
struct ChildProduct<'a, D> {
    tree: &'a Tree<D>,
    split_num: usize,
    children: Vec<NodeId>,
    iters: Vec<Partitions<'a, D>>,
    current: Vec<Vec<NodeId>>,
    started: bool,
    exhausted: bool,
}

impl<'a, D> ChildProduct<'a, D> {
    fn new(tree: &'a Tree<D>, children: Vec<NodeId>, split_num: usize) -> Self {
        let mut iters: Vec<_> = children
            .iter()
            .map(|&child| Partitions::new(tree, child, split_num))
            .collect();
        let current: Option<Vec<_>> = iters.iter_mut().map(|it| it.next()).collect();
        let exhausted = current.is_none();
        Self {
            tree,
            split_num,
            children,
            iters,
            current: current.unwrap_or_default(),
            started: false,
            exhausted,
        }
    }

    fn next_partition(&mut self) -> Option<Vec<NodeId>> {
        if self.exhausted {
            return None;
        }
        if self.started {
            self.advance();
            if self.exhausted {
                return None;
            }
        }
        self.started = true;
        Some(self.current.concat())
    }

    fn advance(&mut self) {
        let mut pos = self.iters.len();
        loop {
            if pos == 0 {
                self.exhausted = true;
                return;
            }
            pos -= 1;
            if let Some(partition) = self.iters[pos].next() {
                self.current[pos] = partition;
                break;
            }
        }
        for j in pos + 1..self.iters.len() {
            let mut fresh = Partitions::new(self.tree, self.children[j], self.split_num);
            match fresh.next() {
                Some(partition) => self.current[j] = partition,
                None => {
                    self.exhausted = true;
                    return;
                }
            }
            self.iters[j] = fresh;
        }
    }
}
