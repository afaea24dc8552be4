//! Allocation solver and result reporting.
//!
//! # Algorithm
//!
//! 1. Validate the configuration and the problem (fatal on failure)
//! 2. Capacity pre-check; an uncoverable action ends with `InfeasibleProblem`
//! 3. A* from the empty allocation with the configured cost model and
//!    heuristic
//! 4. Schedule the goal (reusing the schedule it was costed with):
//!    - one-shot mode reports it as found, feasible or not
//!    - sequential mode re-enters the search until a goal schedules feasibly,
//!      keeping the first infeasible goal as fallback
//!
//! The time limit covers the whole solve: search, tabu and final scheduling.
//!
//! # KPI
//!
//! `AllocationKpi` summarizes a feasible result: makespan, assignments,
//! species utilization and travel time.

mod kpi;
mod report;

pub use kpi::AllocationKpi;
pub use report::{SolveReport, SolveStatus};

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::allocation::{
    is_allocatable, Allocation, AllocationExpander, AllocationIsGoal, AllocationResultsPackager,
    ScheduleCost, StepCost, TraitDeficitHeuristic,
};
use crate::config::{SearchMode, SolverConfig};
use crate::connector::{ConnectorOutcome, MapDescription, MotionPlanner, ScheduleConnector};
use crate::error::{AllocationError, Result};
use crate::models::AllocationProblem;
use crate::search::{AStarSearch, SearchLimits, SearchStatus};
use crate::temporal::TabuConfig;
use crate::validation::validate_problem;

type AllocationSearch =
    AStarSearch<Allocation, AllocationExpander, TraitDeficitHeuristic, AllocationIsGoal>;

/// The schedule the search costed `allocation` with, or a fresh one.
fn schedule(
    search: &AllocationSearch,
    connector: &mut ScheduleConnector,
    allocation: &Allocation,
) -> Result<ConnectorOutcome> {
    match search.expander().cached_outcome(&allocation.key()) {
        Some(outcome) => Ok(outcome.clone()),
        None => connector.connect(allocation),
    }
}

/// Multi-robot task allocation solver.
///
/// # Example
///
/// ```
/// use u_allocation::config::SolverConfig;
/// use u_allocation::models::{ActionRequirement, AllocationProblem, RobotSpecies};
/// use u_allocation::solver::{SolveStatus, Solver};
///
/// let problem = AllocationProblem::new()
///     .with_species(RobotSpecies::new([1.0, 0.0]))
///     .with_species(RobotSpecies::new([0.0, 1.0]))
///     .with_action(ActionRequirement::new("inspect", [1.0, 0.0]).with_duration(5.0));
///
/// let report = Solver::new(SolverConfig::default().with_seed(1)).solve(problem).unwrap();
/// assert_eq!(report.status, SolveStatus::Solved);
/// assert_eq!(report.count(0, 0), 1);
/// assert_eq!(report.makespan, Some(5.0));
/// ```
pub struct Solver {
    config: SolverConfig,
    planner: Option<Arc<dyn MotionPlanner>>,
}

impl Solver {
    /// Creates a solver without a motion planner.
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            planner: None,
        }
    }

    /// Uses `planner` for travel times.
    pub fn with_planner(mut self, planner: impl MotionPlanner + 'static) -> Self {
        self.planner = Some(Arc::new(planner));
        self
    }

    /// Installs `map` into `planner`, then uses it for travel times.
    pub fn with_motion(self, mut planner: impl MotionPlanner + 'static, map: &MapDescription) -> Self {
        planner.set_map(map);
        self.with_planner(planner)
    }

    /// Configuration in use.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    fn connector(&self, tabu: &TabuConfig, deadline: Option<Instant>) -> ScheduleConnector {
        let connector = ScheduleConnector::new(tabu.clone())
            .with_query_budget(self.config.motion.query_budget())
            .with_deadline(deadline);
        match &self.planner {
            Some(planner) => connector.with_planner(Arc::clone(planner)),
            None => connector,
        }
    }

    /// Solves an allocation problem.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration or the problem is invalid.
    /// Infeasibility and exhausted budgets are reported through
    /// [`SolveStatus`].
    pub fn solve(&self, problem: AllocationProblem) -> Result<SolveReport> {
        let started = Instant::now();
        self.config.validate()?;
        validate_problem(&problem).map_err(AllocationError::Validation)?;
        let problem = Arc::new(problem);

        info!(
            event = "solve_start",
            actions = problem.action_count(),
            species = problem.species_count(),
            robots = problem.robot_count(),
            mode = ?self.config.search.mode
        );

        if !is_allocatable(&problem) {
            let mut report = SolveReport::empty(SolveStatus::InfeasibleProblem);
            report.elapsed_ms = started.elapsed().as_millis() as u64;
            info!(event = "solve_end", status = ?report.status, elapsed_ms = report.elapsed_ms);
            return Ok(report);
        }

        let deadline = self.config.time_limit().map(|limit| started + limit);
        // one seed per solve, so every connector resolves an allocation alike
        let mut tabu = self.config.tabu.clone();
        if tabu.seed.is_none() {
            tabu.seed = Some(rand::random());
        }
        let mut expander = if self.config.search.schedule_partial {
            AllocationExpander::new(ScheduleCost::new(self.connector(&tabu, deadline)))
        } else {
            AllocationExpander::new(StepCost)
        };
        let mut root = Allocation::new(Arc::clone(&problem));
        expander.prepare_root(&mut root);

        let mut search = AStarSearch::new(
            root,
            expander,
            TraitDeficitHeuristic::new(self.config.search.alpha),
            AllocationIsGoal::new(),
        );
        let limits = SearchLimits {
            max_expansions: self.config.search.max_expansions,
            deadline,
        };
        let mut connector = self.connector(&tabu, deadline);
        let mut fallback: Option<(Allocation, ConnectorOutcome)> = None;

        let (status, chosen) = loop {
            match search.search(limits) {
                SearchStatus::GoalFound => {
                    let Some(goal) = search.package(&AllocationResultsPackager).allocation else {
                        break (SolveStatus::SearchExhausted, fallback.take());
                    };
                    let outcome = schedule(&search, &mut connector, &goal)?;
                    if outcome.makespan.is_some() {
                        break (SolveStatus::Solved, Some((goal, outcome)));
                    }
                    match self.config.search.mode {
                        SearchMode::OneShot => {
                            break (SolveStatus::TemporallyInfeasible, Some((goal, outcome)));
                        }
                        SearchMode::Sequential => {
                            debug!(event = "goal_rejected", key = %goal.key());
                            if fallback.is_none() {
                                fallback = Some((goal, outcome));
                            }
                        }
                    }
                }
                SearchStatus::Exhausted => {
                    break match fallback.take() {
                        Some(found) => (SolveStatus::TemporallyInfeasible, Some(found)),
                        None => (SolveStatus::SearchExhausted, None),
                    };
                }
                SearchStatus::LimitReached => {
                    let best = match fallback.take() {
                        Some(found) => Some(found),
                        None => match search.package(&AllocationResultsPackager).allocation {
                            Some(partial) => {
                                let outcome = schedule(&search, &mut connector, &partial)?;
                                Some((partial, outcome))
                            }
                            None => None,
                        },
                    };
                    break (SolveStatus::ResourceLimit, best);
                }
            }
        };

        let stats = *search.stats();
        let mut report = SolveReport::empty(status);
        report.nodes_expanded = stats.nodes_expanded;
        report.nodes_visited = stats.nodes_visited;
        if let Some((allocation, outcome)) = chosen {
            report.allocation_found = allocation.is_goal();
            report.makespan = outcome.makespan;
            report.allocation_key = Some(allocation.key().to_string());
            report.counts = (0..problem.action_count())
                .map(|a| {
                    (0..problem.species_count())
                        .map(|s| allocation.count(a, s))
                        .collect::<Vec<u16>>()
                })
                .collect();
            report.kpi = outcome
                .schedule
                .as_ref()
                .map(|schedule| AllocationKpi::calculate(schedule, &allocation));
            report.schedule = outcome.schedule;
            report.waypoints = outcome.waypoints;
        }
        report.elapsed_ms = started.elapsed().as_millis() as u64;

        info!(
            event = "solve_end",
            status = ?report.status,
            makespan = ?report.makespan,
            nodes_expanded = report.nodes_expanded,
            nodes_visited = report.nodes_visited,
            elapsed_ms = report.elapsed_ms
        );
        Ok(report)
    }
}
