//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::arena::TreeId;

/// Coarse classification of domain failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// An index was outside the range reported by the matching `count_*` call.
    Addressing,
    /// The structure cannot support the requested edit.
    StructuralPrecondition,
}

/// Domain errors represent caller contract violations.
/// A failed edit never touches the hypothesis it was invoked on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("splittable node index {index} out of range (count: {count})")]
    NodeIndexOutOfRange { index: usize, count: usize },

    #[error("leaf partition index {index} out of range (count: {count})")]
    LeafIndexOutOfRange { index: usize, count: usize },

    #[error("node {name} has {available} children, cannot split into {requested}")]
    TooFewChildren {
        name: String,
        available: usize,
        requested: usize,
    },

    #[error("split arity must be at least 1")]
    InvalidArity,

    #[error("hypothesis is empty")]
    EmptyHypothesis,

    #[error("hypothesis has no splittable leaf nodes")]
    NothingToSplit,

    #[error("leaf partition has no members")]
    EmptyPartition,

    #[error("cannot collapse a partition of the root node {0}")]
    RootHasNoParent(String),

    #[error("node id does not belong to this tree")]
    UnknownNode,

    #[error("hypothesis was built against tree {expected}, got tree {actual}")]
    ForeignTree { expected: TreeId, actual: TreeId },
}

impl DomainError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::NodeIndexOutOfRange { .. } | DomainError::LeafIndexOutOfRange { .. } => {
                ErrorKind::Addressing
            }
            _ => ErrorKind::StructuralPrecondition,
        }
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
