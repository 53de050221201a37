//! Application-level errors (wraps domain errors)

use thiserror::Error;

use crate::domain::DomainError;

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("config error: {message}")]
    Config { message: String },

    #[error("tree of depth {depth} with {branch_count} branches cannot be split {split_num} ways")]
    Unsplittable {
        depth: usize,
        branch_count: usize,
        split_num: usize,
    },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
