use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};
use std::fmt;

use generational_arena::{Arena, Index};
use itertools::Itertools;
use tracing::{instrument, trace};
use uuid::Uuid;

use crate::domain::error::{DomainError, DomainResult};

/// Name of the root node; children append their branch number.
pub const ROOT_NAME: &str = "r";

/// Stable handle of a node inside its tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(Index);

impl Ord for NodeId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.into_raw_parts().cmp(&other.0.into_raw_parts())
    }
}

impl PartialOrd for NodeId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Identity of one constructed tree, used to reject node ids from other trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TreeId(Uuid);

impl fmt::Display for TreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Branch choices leading from the root to a node. Empty for the root itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn child(&self, child_num: usize) -> Self {
        let mut branches = self.0.clone();
        branches.push(child_num);
        Self(branches)
    }

    pub fn branches(&self) -> &[usize] {
        &self.0
    }

    /// Number of edges between the root and this node.
    pub fn level(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(root")?;
        for branch in &self.0 {
            write!(f, ", {}", branch)?;
        }
        write!(f, ")")
    }
}

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug, Clone)]
pub struct TreeNode<D> {
    /// Human readable path name, e.g. `r01`
    pub name: String,
    /// Branch choices from the root
    pub path: NodePath,
    /// Position among the parent's children, 0 for the root
    pub child_num: usize,
    /// Index of parent node in the arena, None for the root
    pub parent: Option<NodeId>,
    /// Indices of child nodes in the arena, in branch order
    pub children: Vec<NodeId>,
    /// Payload computed once at construction
    pub data: D,
}

impl<D> TreeNode<D> {
    /// A node can be expanded into a partition only if it has children.
    pub fn is_splittable(&self) -> bool {
        !self.children.is_empty()
    }
}

impl<D: fmt::Debug> fmt::Display for TreeNode<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:?}", self.name, self.data)
    }
}

/// View of a node under construction, handed to the data function.
///
/// The parent is fully built, so its `data` can seed the child's data.
#[derive(Debug)]
pub struct NewNode<'a, D> {
    pub name: &'a str,
    pub path: &'a NodePath,
    pub child_num: usize,
    pub parent: Option<&'a TreeNode<D>>,
}

/// Fixed-shape n-ary tree stored in a generational arena.
///
/// Built once, top-down, and immutable afterwards. Every node id handed out
/// stays valid for the lifetime of the tree.
#[derive(Debug)]
pub struct Tree<D = ()> {
    id: TreeId,
    arena: Arena<TreeNode<D>>,
    root: NodeId,
    branch_count: usize,
}

/// Builds a tree without payload. See [`build_tree_with`].
pub fn build_tree(depth: usize, branch_count: usize) -> Tree<()> {
    build_tree_with(depth, branch_count, |_| ())
}

/// Builds a tree of `depth` levels (root included) with `branch_count`
/// children per inner node.
///
/// `data_fn` runs exactly once per node, in pre-order (`r`, `r0`, `r00`, ...),
/// so a parent is always built before its children.
/// `depth <= 1` or `branch_count == 0` yields a lone root.
#[instrument(level = "debug", skip(data_fn))]
pub fn build_tree_with<D, F>(depth: usize, branch_count: usize, mut data_fn: F) -> Tree<D>
where
    F: FnMut(NewNode<'_, D>) -> D,
{
    let mut arena = Arena::new();

    let root_name = ROOT_NAME.to_string();
    let root_path = NodePath::root();
    let root_data = data_fn(NewNode {
        name: &root_name,
        path: &root_path,
        child_num: 0,
        parent: None,
    });
    let root = NodeId(arena.insert(TreeNode {
        name: root_name,
        path: root_path,
        child_num: 0,
        parent: None,
        children: Vec::new(),
        data: root_data,
    }));

    // (parent, child_num, levels from this child down); popped in pre-order
    let mut stack: Vec<(NodeId, usize, usize)> = Vec::new();
    push_children(&mut stack, root, branch_count, depth.saturating_sub(1));
    while let Some((parent_id, child_num, levels)) = stack.pop() {
        let (name, path) = {
            let parent = &arena[parent_id.0];
            (
                format!("{}{}", parent.name, child_num),
                parent.path.child(child_num),
            )
        };
        let data = data_fn(NewNode {
            name: &name,
            path: &path,
            child_num,
            parent: Some(&arena[parent_id.0]),
        });
        trace!("child #{} '{}' with {} levels below", child_num, name, levels - 1);
        let child = NodeId(arena.insert(TreeNode {
            name,
            path,
            child_num,
            parent: Some(parent_id),
            children: Vec::new(),
            data,
        }));
        arena[parent_id.0].children.push(child);
        push_children(&mut stack, child, branch_count, levels - 1);
    }

    Tree {
        id: TreeId(Uuid::new_v4()),
        arena,
        root,
        branch_count,
    }
}

fn push_children(stack: &mut Vec<(NodeId, usize, usize)>, parent: NodeId, branch_count: usize, levels: usize) {
    if levels == 0 {
        return;
    }
    stack.extend((0..branch_count).rev().map(|child_num| (parent, child_num, levels)));
}

/// Node count of a tree built with `build_tree(depth, branch_count)`.
pub fn expected_node_count(depth: usize, branch_count: usize) -> usize {
    (0..depth.max(1))
        .map(|level| branch_count.saturating_pow(level as u32))
        .fold(0usize, |acc, n| acc.saturating_add(n))
}

impl<D> Tree<D> {
    pub fn id(&self) -> TreeId {
        self.id
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn branch_count(&self) -> usize {
        self.branch_count
    }

    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    pub fn get(&self, id: NodeId) -> Option<&TreeNode<D>> {
        self.arena.get(id.0)
    }

    /// Like [`Tree::get`] but reports foreign ids as a domain error.
    pub fn node(&self, id: NodeId) -> DomainResult<&TreeNode<D>> {
        self.get(id).ok_or(DomainError::UnknownNode)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.contains(id.0)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.get(id).map(|n| n.name.as_str())
    }

    /// Level-order traversal of the whole tree.
    #[instrument(level = "trace", skip(self))]
    pub fn breadth_first(&self) -> BreadthFirst<'_, D> {
        self.breadth_first_from(self.root)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn breadth_first_from(&self, start: NodeId) -> BreadthFirst<'_, D> {
        let mut queue = VecDeque::new();
        if self.contains(start) {
            queue.push_back(start);
        }
        BreadthFirst { tree: self, queue }
    }

    /// Pre-order traversal of the whole tree.
    #[instrument(level = "trace", skip(self))]
    pub fn depth_first(&self) -> DepthFirst<'_, D> {
        self.depth_first_from(self.root)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn depth_first_from(&self, start: NodeId) -> DepthFirst<'_, D> {
        let mut stack = Vec::new();
        if self.contains(start) {
            stack.push(start);
        }
        DepthFirst { tree: self, stack }
    }

    /// Number of levels, root included.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.breadth_first()
            .map(|(_, node)| node.path.level() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Collects all nodes without children, left to right.
    pub fn leaf_nodes(&self) -> Vec<NodeId> {
        self.depth_first()
            .filter(|(_, node)| node.children.is_empty())
            .map(|(id, _)| id)
            .collect()
    }

    /// Maps node names to ids. With more than ten branches names stop being
    /// unique (`r1` + `0` vs `r10`); the node visited last wins.
    pub fn name_index(&self) -> HashMap<String, NodeId> {
        self.breadth_first()
            .map(|(id, node)| (node.name.clone(), id))
            .collect()
    }

    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.breadth_first()
            .find(|(_, node)| node.name == name)
            .map(|(id, _)| id)
    }

    /// One-line description of a node and its neighbourhood.
    pub fn report(&self, id: NodeId) -> DomainResult<String> {
        let node = self.node(id)?;
        let parent = node
            .parent
            .and_then(|p| self.name(p))
            .unwrap_or("None");
        Ok(format!(
            "Node '{}' has this parent '{}' and these {} children [{}]",
            node.name,
            parent,
            node.children.len(),
            self.names(&node.children)
        ))
    }

    /// Node names in level order, e.g. `[r r0 r1 r00 r01 r10 r11]`.
    pub fn shape_report(&self) -> String {
        format!(
            "[{}]",
            self.breadth_first().map(|(_, node)| node.name.as_str()).join(" ")
        )
    }

    /// Comma separated names of the given nodes; unknown ids render as `?`.
    pub fn names(&self, ids: &[NodeId]) -> String {
        ids.iter().map(|&id| self.name(id).unwrap_or("?")).join(", ")
    }
}

pub struct BreadthFirst<'a, D> {
    tree: &'a Tree<D>,
    queue: VecDeque<NodeId>,
}

impl<'a, D> Iterator for BreadthFirst<'a, D> {
    type Item = (NodeId, &'a TreeNode<D>);

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.queue.pop_front()?;
        let node = self.tree.get(current)?;
        self.queue.extend(node.children.iter().copied());
        Some((current, node))
    }
}

pub struct DepthFirst<'a, D> {
    tree: &'a Tree<D>,
    stack: Vec<NodeId>,
}

impl<'a, D> Iterator for DepthFirst<'a, D> {
    type Item = (NodeId, &'a TreeNode<D>);

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        let node = self.tree.get(current)?;
        // Push children in reverse order for left-to-right traversal
        self.stack.extend(node.children.iter().rev().copied());
        Some((current, node))
    }
}
