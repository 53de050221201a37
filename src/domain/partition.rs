//! Mutable partition trees over the nodes of a [`Tree`].
//!
//! A partition holds an ordered list of members, each either a tree node or
//! a nested partition. Structural edits address members by counting through
//! a breadth-first walk, which is what the search loop indexes into after
//! asking for `count_leaf_splits` / `count_splittable_leaf_nodes`.

use std::collections::VecDeque;

use rand::Rng;
use tracing::{debug, instrument};

use crate::domain::arena::{NodeId, Tree, TreeNode};
use crate::domain::error::{DomainError, DomainResult};

/// One entry of a partition: a raw tree node or a nested partition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Member {
    Node(NodeId),
    Partition(Partition),
}

impl Member {
    fn is_splittable_node<D>(&self, tree: &Tree<D>) -> bool {
        match self {
            Member::Node(id) => tree.get(*id).is_some_and(TreeNode::is_splittable),
            Member::Partition(_) => false,
        }
    }

    fn is_leaf_partition(&self) -> bool {
        matches!(self, Member::Partition(p) if p.is_leaf_partition())
    }
}

impl From<NodeId> for Member {
    fn from(id: NodeId) -> Self {
        Member::Node(id)
    }
}

impl From<Partition> for Member {
    fn from(partition: Partition) -> Self {
        Member::Partition(partition)
    }
}

/// Internal node of a hypothesis. Owns its nested partitions; tree nodes are
/// referenced by id only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Partition {
    members: Vec<Member>,
}

/// A member visited by [`Partition::breadth_first`].
#[derive(Debug, Clone)]
pub struct MemberEntry<'a> {
    /// Partition that directly holds the member
    pub parent: &'a Partition,
    /// Position of the member inside `parent`
    pub index: usize,
    /// Member positions leading from the walked partition to this member
    pub path: Vec<usize>,
    pub member: &'a Member,
}

impl Partition {
    pub fn new(members: Vec<Member>) -> Self {
        Self { members }
    }

    pub fn of_nodes(nodes: impl IntoIterator<Item = NodeId>) -> Self {
        Self::new(nodes.into_iter().map(Member::Node).collect())
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// True iff no member is itself a partition.
    pub fn is_leaf_partition(&self) -> bool {
        !self
            .members
            .iter()
            .any(|m| matches!(m, Member::Partition(_)))
    }

    /// Members level by level: all of this partition's members first, then
    /// the members of nested partitions in the order they were reached.
    pub fn breadth_first(&self) -> MemberWalk<'_> {
        let mut queue = VecDeque::new();
        enqueue_members(&mut queue, self, &[]);
        MemberWalk { queue }
    }

    /// Structurally independent copy. Tree nodes are shared by id.
    pub fn deep_clone(&self) -> Self {
        self.clone()
    }

    /// Number of leaf partitions reachable from here, counting `self`.
    pub fn count_leaf_splits(&self) -> usize {
        if self.is_leaf_partition() {
            return 1;
        }
        self.members
            .iter()
            .map(|member| match member {
                Member::Partition(p) => p.count_leaf_splits(),
                Member::Node(_) => 0,
            })
            .sum()
    }

    /// Number of node members (at any depth) that have children in `tree`.
    pub fn count_splittable_leaf_nodes<D>(&self, tree: &Tree<D>) -> usize {
        self.members
            .iter()
            .map(|member| match member {
                Member::Partition(p) => p.count_splittable_leaf_nodes(tree),
                Member::Node(_) if member.is_splittable_node(tree) => 1,
                Member::Node(_) => 0,
            })
            .sum()
    }

    /// All node members, flattened depth first.
    pub fn leaf_nodes(&self) -> Vec<NodeId> {
        let mut nodes = Vec::new();
        self.collect_nodes(&mut nodes);
        nodes
    }

    fn collect_nodes(&self, nodes: &mut Vec<NodeId>) {
        for member in &self.members {
            match member {
                Member::Node(id) => nodes.push(*id),
                Member::Partition(p) => p.collect_nodes(nodes),
            }
        }
    }

    /// Replaces the `node_index`-th splittable node member (breadth-first
    /// order) with a partition of `split_num` of its children, drawn
    /// uniformly without replacement and kept in branch order.
    #[instrument(level = "debug", skip(self, tree, rng))]
    pub fn split_node<D, R>(
        &mut self,
        node_index: usize,
        split_num: usize,
        tree: &Tree<D>,
        rng: &mut R,
    ) -> DomainResult<()>
    where
        R: Rng + ?Sized,
    {
        let path = self
            .locate(node_index, |m| m.is_splittable_node(tree))
            .ok_or_else(|| DomainError::NodeIndexOutOfRange {
                index: node_index,
                count: self.count_splittable_leaf_nodes(tree),
            })?;
        if let Some(slot) = self.member_mut(&path) {
            if let Member::Node(target) = slot {
                let expansion = sample_children(tree, *target, split_num, rng)?;
                debug!("splitting node {}", tree.name(*target).unwrap_or("?"));
                *slot = Member::Partition(expansion);
            }
        }
        Ok(())
    }

    /// Collapses the `leaf_index`-th nested leaf partition (breadth-first
    /// order) back into the tree node it was expanded from.
    ///
    /// If `self` is a leaf partition, index 0 collapses everything and the
    /// result is `None`.
    #[instrument(level = "debug", skip(self, tree))]
    pub fn prune_leaf<D>(mut self, leaf_index: usize, tree: &Tree<D>) -> DomainResult<Option<Self>> {
        if self.is_leaf_partition() {
            return match leaf_index {
                0 => Ok(None),
                _ => Err(DomainError::LeafIndexOutOfRange {
                    index: leaf_index,
                    count: 1,
                }),
            };
        }
        let path = self
            .locate(leaf_index, Member::is_leaf_partition)
            .ok_or_else(|| DomainError::LeafIndexOutOfRange {
                index: leaf_index,
                count: self.count_leaf_splits(),
            })?;
        if let Some(slot) = self.member_mut(&path) {
            if let Member::Partition(leaf) = slot {
                let origin = leaf.expanded_from(tree)?;
                debug!("collapsing leaf partition into {}", tree.name(origin).unwrap_or("?"));
                *slot = Member::Node(origin);
            }
        }
        Ok(Some(self))
    }

    /// The tree node this partition was split from: the parent of its first
    /// member.
    fn expanded_from<D>(&self, tree: &Tree<D>) -> DomainResult<NodeId> {
        let first = match self.members.first() {
            Some(Member::Node(id)) => *id,
            Some(Member::Partition(p)) => return p.expanded_from(tree),
            None => return Err(DomainError::EmptyPartition),
        };
        let node = tree.node(first)?;
        node.parent
            .ok_or_else(|| DomainError::RootHasNoParent(node.name.clone()))
    }

    /// Path of the `target`-th member matching `predicate` in breadth-first
    /// order. Both index-addressed edits go through here so their numbering
    /// agrees with the corresponding `count_*`.
    fn locate<P>(&self, target: usize, predicate: P) -> Option<Vec<usize>>
    where
        P: Fn(&Member) -> bool,
    {
        self.breadth_first()
            .filter(|entry| predicate(entry.member))
            .nth(target)
            .map(|entry| entry.path)
    }

    fn member_mut(&mut self, path: &[usize]) -> Option<&mut Member> {
        let (&first, rest) = path.split_first()?;
        let mut member = self.members.get_mut(first)?;
        for &index in rest {
            member = match member {
                Member::Partition(p) => p.members.get_mut(index)?,
                Member::Node(_) => return None,
            };
        }
        Some(member)
    }
}

fn enqueue_members<'a>(queue: &mut VecDeque<MemberEntry<'a>>, parent: &'a Partition, prefix: &[usize]) {
    for (index, member) in parent.members.iter().enumerate() {
        let mut path = prefix.to_vec();
        path.push(index);
        queue.push_back(MemberEntry {
            parent,
            index,
            path,
            member,
        });
    }
}

pub struct MemberWalk<'a> {
    queue: VecDeque<MemberEntry<'a>>,
}

impl<'a> Iterator for MemberWalk<'a> {
    type Item = MemberEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.queue.pop_front()?;
        if let Member::Partition(nested) = entry.member {
            enqueue_members(&mut self.queue, nested, &entry.path);
        }
        Some(entry)
    }
}

/// Partition of `split_num` children of `node`, sampled without replacement
/// and sorted into branch order.
pub(crate) fn sample_children<D, R>(
    tree: &Tree<D>,
    node: NodeId,
    split_num: usize,
    rng: &mut R,
) -> DomainResult<Partition>
where
    R: Rng + ?Sized,
{
    if split_num == 0 {
        return Err(DomainError::InvalidArity);
    }
    let parent = tree.node(node)?;
    if parent.children.len() < split_num {
        return Err(DomainError::TooFewChildren {
            name: parent.name.clone(),
            available: parent.children.len(),
            requested: split_num,
        });
    }
    let mut picks = rand::seq::index::sample(rng, parent.children.len(), split_num).into_vec();
    picks.sort_unstable();
    Ok(Partition::of_nodes(picks.into_iter().map(|i| parent.children[i])))
}
