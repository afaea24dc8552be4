//! Task allocation search domain.
//!
//! Plugs allocation states into the generic [`search`](crate::search)
//! engine. A state assigns robot counts to actions; the root is the empty
//! allocation and each edge adds one robot to the first action whose
//! cumulative requirement is still unmet.
//!
//! # Components
//!
//! - [`Allocation`] / [`AllocationKey`]: state and identity
//! - [`is_allocatable`] / [`check_allocatable`]: capacity pre-checks
//! - [`AllocationExpander`]: successor generation
//! - [`ScheduleCost`] / [`StepCost`]: edge costs via [`PathCost`]
//! - [`TraitDeficitHeuristic`]: goal distance
//! - [`AllocationIsGoal`] / [`AllocationResultsPackager`]: goal test and result

mod cost;
mod expander;
mod feasibility;
mod goal;
mod heuristic;
mod state;

pub use cost::{PathCost, ScheduleCost, StepCost};
pub use expander::AllocationExpander;
pub use feasibility::{check_allocatable, is_allocatable};
pub use goal::{AllocationIsGoal, AllocationResult, AllocationResultsPackager};
pub use heuristic::TraitDeficitHeuristic;
pub use state::{Allocation, AllocationKey, ScheduleSummary};
