//! Temporal scheduling.
//!
//! Builds a temporal network from action durations and precedence
//! constraints, edits it incrementally, and resolves resource-contention
//! pairs (disjuncts) with tabu search.
//!
//! # Submodules
//!
//! - [`network`]: Time-point network with incremental propagation
//! - [`tabu`]: Tabu search over disjunct orientations

pub mod network;
pub mod tabu;

pub use network::{ActionState, Disjunct, DisjunctId, TemporalNetwork};
pub use tabu::{TabuConfig, TabuOutcome, TabuSearch};
