/*
Node ids carry no names, so partitions and hypotheses are rendered through a
`Named` view that borrows the tree they were built against.
 */
use std::fmt;

use termtree::Tree as TermTree;

use crate::domain::arena::{NodeId, Tree};
use crate::domain::hypothesis::Hypothesis;
use crate::domain::partition::{Member, Partition};

pub trait ToTermTree {
    fn to_termtree(&self) -> TermTree<String>;
}

impl<D> ToTermTree for Tree<D> {
    fn to_termtree(&self) -> TermTree<String> {
        fn build<D>(tree: &Tree<D>, node_id: NodeId) -> TermTree<String> {
            let label = tree.name(node_id).unwrap_or("?").to_string();
            TermTree::new(label).with_leaves(
                tree.children(node_id)
                    .iter()
                    .map(|&child| build(tree, child)),
            )
        }
        build(self, self.root())
    }
}

/// A value paired with the tree that resolves its node ids.
pub struct Named<'a, T: ?Sized, D> {
    item: &'a T,
    tree: &'a Tree<D>,
}

impl Partition {
    pub fn named<'a, D>(&'a self, tree: &'a Tree<D>) -> Named<'a, Partition, D> {
        Named { item: self, tree }
    }
}

impl Hypothesis {
    pub fn named<'a, D>(&'a self, tree: &'a Tree<D>) -> Named<'a, Hypothesis, D> {
        Named { item: self, tree }
    }
}

fn write_partition<D>(f: &mut fmt::Formatter<'_>, partition: &Partition, tree: &Tree<D>) -> fmt::Result {
    write!(f, "[")?;
    for (i, member) in partition.members().iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        match member {
            Member::Node(id) => write!(f, "{}", tree.name(*id).unwrap_or("?"))?,
            Member::Partition(nested) => write_partition(f, nested, tree)?,
        }
    }
    write!(f, "]")
}

/// `[r0, [r10, r11], r2]`
impl<D> fmt::Display for Named<'_, Partition, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_partition(f, self.item, self.tree)
    }
}

impl<D> fmt::Display for Named<'_, Hypothesis, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.item.root() {
            Some(root) => write_partition(f, root, self.tree),
            None => write!(f, "[]"),
        }
    }
}

fn partition_termtree<D>(label: String, partition: &Partition, tree: &Tree<D>) -> TermTree<String> {
    TermTree::new(label).with_leaves(partition.members().iter().map(|member| match member {
        Member::Node(id) => TermTree::new(tree.name(*id).unwrap_or("?").to_string()),
        Member::Partition(nested) => partition_termtree("split".to_string(), nested, tree),
    }))
}

impl<D> ToTermTree for Named<'_, Partition, D> {
    fn to_termtree(&self) -> TermTree<String> {
        partition_termtree("split".to_string(), self.item, self.tree)
    }
}

impl<D> ToTermTree for Named<'_, Hypothesis, D> {
    fn to_termtree(&self) -> TermTree<String> {
        match self.item.root() {
            Some(root) => partition_termtree("hypothesis".to_string(), root, self.tree),
            None => TermTree::new("empty hypothesis".to_string()),
        }
    }
}
