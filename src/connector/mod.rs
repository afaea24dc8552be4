//! Allocation-to-schedule connector.
//!
//! Turns an allocation into a resolved temporal network:
//!
//! 1. Nominal durations and the problem's precedence constraints
//! 2. Robot slots: each robot of a species is a slot; actions take the
//!    least-loaded slots of each species they need, in topological order
//! 3. Contention pairs: two actions sharing a slot, unless precedence
//!    already orders them
//! 4. Initial pair orientation taken from a topological order of the
//!    precedence graph, which is always feasible
//! 5. Tabu search over pair orientations
//! 6. Travel: in order of end time, each action is lengthened by the time
//!    its robots need to reach it plus its own start-to-end move
//!
//! Planner queries are memoized per `(from, to)` for the connector's life.

mod motion;

pub use motion::{DistanceTable, MapDescription, MotionPlanner};

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::trace;

use crate::allocation::{Allocation, ScheduleSummary};
use crate::error::{AllocationError, Result};
use crate::models::{LocationId, Schedule};
use crate::temporal::{Disjunct, DisjunctId, TabuConfig, TabuSearch, TemporalNetwork};

/// A scheduled allocation.
#[derive(Debug, Clone)]
pub struct ConnectorOutcome {
    /// Resolved network (travel included).
    pub network: TemporalNetwork,
    /// Makespan; `None` if temporally infeasible.
    pub makespan: Option<f64>,
    /// Per-action times, if feasible.
    pub schedule: Option<Schedule>,
    /// Location sequence per robot (species-major), starting at the
    /// species' start location.
    pub waypoints: Vec<Vec<LocationId>>,
    /// Contention pairs found.
    pub disjuncts: usize,
    /// Tabu restarts used.
    pub tabu_rounds: usize,
    /// Precedence-only critical path.
    pub lower_bound: f64,
    /// Serial sum of nominal durations.
    pub serial_bound: f64,
}

impl ConnectorOutcome {
    /// Figures attached to the allocation's search node.
    pub fn summary(&self) -> ScheduleSummary {
        ScheduleSummary::new(self.makespan, self.lower_bound, self.serial_bound)
    }
}

/// Builds and resolves temporal networks for allocations.
pub struct ScheduleConnector {
    tabu: TabuConfig,
    planner: Option<Arc<dyn MotionPlanner>>,
    query_budget: Duration,
    deadline: Option<Instant>,
    distances: HashMap<(LocationId, LocationId), Option<f64>>,
    queries: u64,
}

impl ScheduleConnector {
    /// Creates a connector without a planner (travel takes no time).
    pub fn new(tabu: TabuConfig) -> Self {
        Self {
            tabu,
            planner: None,
            query_budget: Duration::from_secs(1),
            deadline: None,
            distances: HashMap::new(),
            queries: 0,
        }
    }

    /// Uses `planner` for travel distances.
    pub fn with_planner(mut self, planner: Arc<dyn MotionPlanner>) -> Self {
        self.planner = Some(planner);
        self
    }

    /// Time budget per planner query.
    pub fn with_query_budget(mut self, budget: Duration) -> Self {
        self.query_budget = budget;
        self
    }

    /// Stops tabu search once `deadline` passes.
    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Planner queries issued (cache misses).
    pub fn queries(&self) -> u64 {
        self.queries
    }

    /// Schedules an allocation.
    ///
    /// # Errors
    ///
    /// Returns error if the problem has locations but not one start location
    /// per species, or if its orderings reference unknown actions.
    pub fn connect(&mut self, allocation: &Allocation) -> Result<ConnectorOutcome> {
        let problem = Arc::clone(allocation.problem());
        if problem.has_locations() && problem.start_locations.len() != problem.species_count() {
            return Err(AllocationError::DimensionMismatch {
                context: "start locations".into(),
                expected: problem.species_count(),
                actual: problem.start_locations.len(),
            });
        }
        let durations = problem.durations();
        let serial_bound = durations.iter().sum();
        let mut network = TemporalNetwork::from_orderings(&durations, &problem.orderings)?;
        let lower_bound = network.makespan().unwrap_or(serial_bound);

        let mut outcome = ConnectorOutcome {
            network: TemporalNetwork::new(),
            makespan: None,
            schedule: None,
            waypoints: Vec::new(),
            disjuncts: 0,
            tabu_rounds: 0,
            lower_bound,
            serial_bound,
        };
        let Some(order) = network.topological_order() else {
            outcome.network = network;
            return Ok(outcome);
        };

        let slots = RobotSlots::assign(allocation, &order, &durations);
        let pairs = slots.contention_pairs(&network);
        let mut rank = vec![0; durations.len()];
        for (position, &action) in order.iter().enumerate() {
            rank[action] = position;
        }
        let orientation = DisjunctId::new(pairs.iter().map(|d| rank[d.first] > rank[d.second]).collect());
        outcome.disjuncts = pairs.len();
        network.set_disjuncts(pairs, orientation)?;

        if network.disjunct_count() > 0 {
            let resolved = TabuSearch::new(self.tabu.clone()).resolve_until(&network, self.deadline);
            outcome.tabu_rounds = resolved.rounds;
            network = resolved.network;
        } else {
            network.mark_resolved();
        }

        if network.is_feasible() && problem.has_locations() {
            match self.apply_travel(allocation, &slots, &mut network)? {
                Some(waypoints) => outcome.waypoints = waypoints,
                None => {
                    trace!(key = %allocation.key(), "motion query failed");
                    outcome.network = network;
                    return Ok(outcome);
                }
            }
        }

        outcome.makespan = network.makespan();
        outcome.schedule = network.schedule();
        outcome.network = network;
        trace!(
            key = %allocation.key(),
            disjuncts = outcome.disjuncts,
            makespan = ?outcome.makespan,
            "allocation scheduled"
        );
        Ok(outcome)
    }

    /// Adds travel time in end-time order; `None` if a query failed.
    fn apply_travel(
        &mut self,
        allocation: &Allocation,
        slots: &RobotSlots,
        network: &mut TemporalNetwork,
    ) -> Result<Option<Vec<Vec<LocationId>>>> {
        let problem = Arc::clone(allocation.problem());
        let Some(schedule) = network.schedule() else {
            return Ok(None);
        };
        let mut at: Vec<LocationId> = slots
            .species
            .iter()
            .map(|&s| problem.start_locations[s])
            .collect();
        let mut waypoints: Vec<Vec<LocationId>> = at.iter().map(|l| vec![*l]).collect();

        for action in schedule.order_by_end() {
            let Some((start, end)) = problem.actions[action].locations else {
                continue;
            };
            let team = &slots.teams[action];
            if team.is_empty() {
                continue;
            }

            let mut approach: f64 = 0.0;
            let mut slowest = f64::INFINITY;
            for &slot in team {
                let species = &problem.species[slots.species[slot]];
                let speed = species.speed(problem.speed_index).unwrap_or(1.0);
                slowest = slowest.min(speed);
                let Some(distance) = self.distance(at[slot], start) else {
                    return Ok(None);
                };
                approach = approach.max(distance / speed);
            }
            let Some(distance) = self.distance(start, end) else {
                return Ok(None);
            };
            let travel = approach + distance / slowest;
            if travel > 0.0 {
                network.increase_duration(action, travel)?;
            }

            for &slot in team {
                if waypoints[slot].last() != Some(&start) {
                    waypoints[slot].push(start);
                }
                if end != start {
                    waypoints[slot].push(end);
                }
                at[slot] = end;
            }
        }
        Ok(Some(waypoints))
    }

    fn distance(&mut self, from: LocationId, to: LocationId) -> Option<f64> {
        if from == to {
            return Some(0.0);
        }
        let Some(planner) = &self.planner else {
            return Some(0.0);
        };
        if let Some(cached) = self.distances.get(&(from, to)) {
            return *cached;
        }
        let distance = planner.query(from, to, self.query_budget);
        self.queries += 1;
        self.distances.insert((from, to), distance);
        distance
    }
}

/// Individual robots behind an allocation's species counts.
///
/// Every robot of a species is one slot. Actions take slots in topological
/// order, each picking the least-loaded free robots of the species it
/// needs, so a robot serves its actions one after another.
struct RobotSlots {
    /// Species of each slot, species-major.
    species: Vec<usize>,
    /// Slots serving each action.
    teams: Vec<Vec<usize>>,
}

impl RobotSlots {
    fn assign(allocation: &Allocation, order: &[usize], durations: &[f64]) -> Self {
        let problem = allocation.problem();
        let mut species = Vec::with_capacity(problem.robot_count());
        let mut first = Vec::with_capacity(problem.species_count());
        for (s, row) in problem.species.iter().enumerate() {
            first.push(species.len());
            species.extend(std::iter::repeat(s).take(usize::from(row.count)));
        }

        let mut load = vec![0.0_f64; species.len()];
        let mut teams = vec![Vec::new(); durations.len()];
        for &action in order {
            for (s, row) in problem.species.iter().enumerate() {
                let need = usize::from(allocation.count(action, s));
                if need == 0 {
                    continue;
                }
                let mut candidates: Vec<usize> = (first[s]..first[s] + usize::from(row.count)).collect();
                candidates.sort_by(|a, b| load[*a].total_cmp(&load[*b]));
                for &slot in candidates.iter().take(need) {
                    load[slot] += durations[action];
                    teams[action].push(slot);
                }
            }
        }
        Self { species, teams }
    }

    /// Pairs of actions sharing a robot, unless precedence already orders them.
    fn contention_pairs(&self, network: &TemporalNetwork) -> Vec<Disjunct> {
        let mut served: Vec<Vec<usize>> = vec![Vec::new(); self.species.len()];
        for (action, team) in self.teams.iter().enumerate() {
            for &slot in team {
                served[slot].push(action);
            }
        }
        let mut pairs = BTreeSet::new();
        for actions in &served {
            for (i, &a) in actions.iter().enumerate() {
                for &b in &actions[i + 1..] {
                    if !network.precedence_reaches(a, b) && !network.precedence_reaches(b, a) {
                        pairs.insert((a, b));
                    }
                }
            }
        }
        pairs.into_iter().map(|(a, b)| Disjunct::new(a, b)).collect()
    }
}
