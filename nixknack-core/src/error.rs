//! Error types for NixKnack domain rules

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("Achievement {name} must have at least one threshold")]
    EmptyThresholds { name: String },

    #[error("Thresholds for achievement {name} must be ascending")]
    UnsortedThresholds { name: String },

    #[error("A plan holds at most {max} tasks, got {actual}")]
    TooManyTasks { max: usize, actual: usize },

    #[error("{0} must be non-empty")]
    Empty(&'static str),
}
