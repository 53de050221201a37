//! Domain layer: tree, enumeration and hypothesis structures
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod enumerate;
pub mod error;
pub mod hypothesis;
pub mod partition;
pub mod render;

pub use arena::{
    build_tree, build_tree_with, expected_node_count, NewNode, NodeId, NodePath, Tree, TreeId,
    TreeNode, ROOT_NAME,
};
pub use enumerate::{binary_partitions, enumerate_partitions, expected_partition_count, Partitions};
pub use error::{DomainError, DomainResult, ErrorKind};
pub use hypothesis::Hypothesis;
pub use partition::{Member, MemberEntry, Partition};
pub use render::{Named, ToTermTree};
