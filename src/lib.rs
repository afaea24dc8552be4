//! Multi-robot task allocation for the U-Engine ecosystem.
//!
//! Decides how many robots of each species serve each action so that every
//! action's trait requirements are met, then schedules the result under
//! precedence constraints, robot contention and travel time.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `TraitVector`, `RobotSpecies`,
//!   `ActionRequirement`, `OrderingConstraint`, `AllocationProblem`, `Schedule`
//! - **`validation`**: Input integrity checks (dimensions, DAG cycles, references)
//! - **`search`**: Generic re-entrant A* over pluggable expander, heuristic,
//!   goal test and result packager
//! - **`temporal`**: Temporal network with incremental edits and tabu search
//!   over disjunct orientations
//! - **`allocation`**: Allocation states, expansion, costs and heuristic
//! - **`connector`**: Allocation-to-schedule bridge and motion planner interface
//! - **`solver`**: End-to-end solve with reporting and KPIs
//! - **`config`**: TOML-backed solver settings
//! - **`error`**: Error types
//!
//! # Example
//!
//! ```
//! use u_allocation::config::SolverConfig;
//! use u_allocation::models::{ActionRequirement, AllocationProblem, RobotSpecies};
//! use u_allocation::solver::Solver;
//!
//! // trait 0: lift capacity, trait 1: sensing
//! let problem = AllocationProblem::new()
//!     .with_species(RobotSpecies::new([2.0, 0.0]).with_name("lifter").with_count(2))
//!     .with_species(RobotSpecies::new([0.0, 1.0]).with_name("scout"))
//!     .with_action(ActionRequirement::new("move_crate", [4.0, 0.0]).with_duration(6.0))
//!     .with_action(ActionRequirement::new("survey", [0.0, 1.0]).with_duration(3.0))
//!     .with_ordering(1, 0);
//!
//! let report = Solver::new(SolverConfig::default()).solve(problem).unwrap();
//! assert!(report.is_solved());
//! assert_eq!(report.count(0, 0), 2);
//! assert_eq!(report.makespan, Some(9.0));
//! ```
//!
//! # References
//!
//! - Gerkey & Mataric (2004), "A Formal Analysis and Taxonomy of Task
//!   Allocation in Multi-Robot Systems"
//! - Hart, Nilsson & Raphael (1968), "A Formal Basis for the Heuristic
//!   Determination of Minimum Cost Paths"
//! - Dechter, Meiri & Pearl (1991), "Temporal Constraint Networks"
//! - Glover (1989), "Tabu Search, Part I"

pub mod allocation;
pub mod config;
pub mod connector;
pub mod error;
pub mod models;
pub mod search;
pub mod solver;
pub mod temporal;
pub mod validation;

mod property_tests;

pub use error::{AllocationError, Result};
