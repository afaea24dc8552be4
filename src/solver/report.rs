//! Solve outcome record.

use serde::{Deserialize, Serialize};

use crate::models::{LocationId, Schedule};

use super::kpi::AllocationKpi;

/// How a solve ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    /// A complete allocation with a feasible schedule.
    Solved,
    /// A complete allocation whose schedule is temporally infeasible.
    TemporallyInfeasible,
    /// The robots cannot cover some action even all together.
    InfeasibleProblem,
    /// Search ran out of states without a complete allocation.
    SearchExhausted,
    /// Time or expansion budget ran out; the report holds the best effort.
    ResourceLimit,
}

/// Result of [`Solver::solve`](super::Solver::solve).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveReport {
    /// Outcome.
    pub status: SolveStatus,
    /// Whether the reported allocation meets every requirement.
    pub allocation_found: bool,
    /// Makespan of the reported schedule.
    pub makespan: Option<f64>,
    /// Encoded allocation key.
    pub allocation_key: Option<String>,
    /// Robot counts `[action][species]` of the reported allocation.
    pub counts: Vec<Vec<u16>>,
    /// Per-action times.
    pub schedule: Option<Schedule>,
    /// Location sequence per robot, species-major.
    pub waypoints: Vec<Vec<LocationId>>,
    /// Quality metrics of a feasible schedule.
    pub kpi: Option<AllocationKpi>,
    /// Nodes expanded by the search.
    pub nodes_expanded: u64,
    /// Distinct states generated by the search.
    pub nodes_visited: u64,
    /// Wall-clock time (ms).
    pub elapsed_ms: u64,
}

impl SolveReport {
    /// A report with no allocation.
    pub fn empty(status: SolveStatus) -> Self {
        Self {
            status,
            allocation_found: false,
            makespan: None,
            allocation_key: None,
            counts: Vec::new(),
            schedule: None,
            waypoints: Vec::new(),
            kpi: None,
            nodes_expanded: 0,
            nodes_visited: 0,
            elapsed_ms: 0,
        }
    }

    /// Whether the solve produced a feasible complete allocation.
    pub fn is_solved(&self) -> bool {
        self.status == SolveStatus::Solved
    }

    /// Robots of `species` on `action` in the reported allocation.
    pub fn count(&self, action: usize, species: usize) -> u16 {
        self.counts
            .get(action)
            .and_then(|row| row.get(species))
            .copied()
            .unwrap_or(0)
    }
}
