//! Allocation quality metrics (KPIs).
//!
//! Computes performance indicators from a resolved schedule and the
//! allocation it was built from.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Makespan | Latest completion time |
//! | Assignments | Sum of robot counts over all actions |
//! | Species Utilization | Robot-time on actions / (robots x makespan) |
//! | Travel Time | Scheduled duration beyond nominal, summed over actions |
//!
//! # Reference
//! Gerkey & Mataric (2004), "A Formal Analysis and Taxonomy of Task
//! Allocation in Multi-Robot Systems"

use serde::{Deserialize, Serialize};

use crate::allocation::Allocation;
use crate::models::Schedule;

/// Allocation performance indicators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationKpi {
    /// Latest completion time.
    pub makespan: f64,
    /// Robot assignments over all actions.
    pub assignments: usize,
    /// Species with at least one assignment.
    pub species_used: usize,
    /// Per-species utilization (0.0..1.0), indexed like the problem's species.
    pub utilization_by_species: Vec<f64>,
    /// Mean utilization over used species.
    pub avg_utilization: f64,
    /// Time added to actions for travel.
    pub travel_time: f64,
}

impl AllocationKpi {
    /// Computes KPIs from a schedule and its allocation.
    pub fn calculate(schedule: &Schedule, allocation: &Allocation) -> Self {
        let problem = allocation.problem();
        let makespan = schedule.makespan();

        let utilization_by_species: Vec<f64> = problem
            .species
            .iter()
            .enumerate()
            .map(|(s, species)| {
                let capacity = f64::from(species.count) * makespan;
                if capacity <= 0.0 {
                    return 0.0;
                }
                let busy: f64 = allocation
                    .served_actions(s)
                    .into_iter()
                    .filter_map(|a| {
                        schedule
                            .entry_for(a)
                            .map(|e| f64::from(allocation.count(a, s)) * e.duration())
                    })
                    .sum();
                (busy / capacity).min(1.0)
            })
            .collect();

        let used: Vec<usize> = (0..problem.species_count())
            .filter(|&s| !allocation.served_actions(s).is_empty())
            .collect();
        let avg_utilization = if used.is_empty() {
            0.0
        } else {
            used.iter().map(|&s| utilization_by_species[s]).sum::<f64>() / used.len() as f64
        };

        let travel_time = schedule
            .entries
            .iter()
            .map(|e| (e.duration() - problem.actions[e.action].duration).max(0.0))
            .sum();

        Self {
            makespan,
            assignments: allocation.assignments(),
            species_used: used.len(),
            utilization_by_species,
            avg_utilization,
            travel_time,
        }
    }

    /// Whether the allocation meets the given quality thresholds.
    pub fn meets_thresholds(&self, max_makespan: f64, min_utilization: f64) -> bool {
        self.makespan <= max_makespan && self.avg_utilization >= min_utilization
    }
}
