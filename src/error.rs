//! Error types.
//!
//! Only fatal conditions are errors: malformed input, unknown indices,
//! bad configuration. Expected search and scheduling outcomes (infeasible
//! branches, exhausted search, negative cycles) are returned as values.

use thiserror::Error;

use crate::validation::ValidationError;

/// Errors raised by temporal network edits.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleError {
    /// The action index is out of range or was removed.
    #[error("unknown action {0}")]
    UnknownAction(usize),

    /// The disjunct index is out of range.
    #[error("unknown disjunct {0}")]
    UnknownDisjunct(usize),

    /// A disjunct identifier of the wrong length was supplied.
    #[error("disjunct id has {actual} bits, network has {expected} disjuncts")]
    DisjunctLength { expected: usize, actual: usize },

    /// Durations must be finite and non-negative.
    #[error("invalid duration {duration} for action {action}")]
    InvalidDuration { action: usize, duration: f64 },

    /// The ordering constraint to remove does not exist.
    #[error("no ordering constraint {before} -> {after}")]
    MissingOrdering { before: usize, after: usize },

    /// There is no edit to revert.
    #[error("no edit to revert")]
    NothingToRevert,
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main error type for allocation and scheduling operations.
#[derive(Debug, Error)]
pub enum AllocationError {
    /// Problem input failed validation.
    #[error("invalid problem: {}", summarize(.0))]
    Validation(Vec<ValidationError>),

    /// A vector does not have the problem's trait dimension.
    #[error("dimension mismatch in {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    /// A species index is out of range.
    #[error("unknown species {0}")]
    UnknownSpecies(usize),

    /// An allocation key could not be decoded.
    #[error("invalid allocation key {0:?}")]
    InvalidKey(String),

    /// Temporal network error.
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for allocation operations.
pub type Result<T> = std::result::Result<T, AllocationError>;
