//! CLI-level errors (wraps application errors)

use thiserror::Error;

use crate::application::ApplicationError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Application(#[from] ApplicationError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("check failed: {0}")]
    CheckFailed(String),
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) => crate::exitcode::USAGE,
            CliError::CheckFailed(_) => crate::exitcode::SOFTWARE,
            CliError::Application(e) => match e {
                ApplicationError::Config { .. } => crate::exitcode::CONFIG,
                ApplicationError::Unsplittable { .. } => crate::exitcode::USAGE,
                ApplicationError::Domain(_) => crate::exitcode::SOFTWARE,
            },
        }
    }
}
