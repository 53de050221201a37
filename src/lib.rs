//! hyptree: hierarchical subtree enumeration and mutable partition hypotheses
//!
//! Layered like a small service:
//! - `domain`: arena tree, exhaustive enumerator, partitions and hypotheses
//! - `application`: scoring search spaces and random hypothesis walks
//! - `cli`: argument parsing, dispatch and terminal output

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod util;

pub use config::Settings;
pub use domain::{
    build_tree, enumerate_partitions, DomainError, DomainResult, Hypothesis, NodeId, Partition,
    Tree, TreeId,
};
