//! Application layer: services and use cases
//!
//! This layer orchestrates domain logic for the command line front end.

pub mod error;
pub mod services;

pub use error::{ApplicationError, ApplicationResult};
