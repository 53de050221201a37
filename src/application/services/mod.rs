//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Randomness is always injected by the caller.

mod search_space;
mod walk;

pub use search_space::{survey, ScoredPartition, SearchSpace, SurveyRow};
pub use walk::{cluster_counts, HypothesisWalk, StepKind, WalkStep};
