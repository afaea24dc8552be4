//! Allocation domain models.
//!
//! Provides the data types for multi-robot task allocation problems and
//! their schedules. Everything here is plain data: search, scheduling and
//! tabu resolution live in sibling modules.
//!
//! # Domain Mappings
//!
//! | u-allocation | Warehouse | Disaster Response | Agriculture |
//! |--------------|-----------|-------------------|-------------|
//! | RobotSpecies | Forklift fleet | UAV / UGV team | Harvester type |
//! | ActionRequirement | Pallet move | Search sector | Field row |
//! | TraitVector | Payload, speed | Camera, range | Capacity, reach |
//! | Schedule | Shift plan | Mission timeline | Harvest plan |

mod action;
mod ordering;
mod problem;
mod robot;
mod schedule;
mod traits;

pub use action::{ActionRequirement, LocationId};
pub use ordering::OrderingConstraint;
pub use problem::AllocationProblem;
pub use robot::RobotSpecies;
pub use schedule::{Schedule, ScheduledAction};
pub use traits::TraitVector;
