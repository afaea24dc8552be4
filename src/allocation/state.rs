//! Allocation state and identity key.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{AllocationError, Result, ScheduleError};
use crate::models::{AllocationProblem, TraitVector};
use crate::search::SearchState;

/// Identity of an allocation: robot counts in action-major order.
///
/// Renders as fixed-width zero-padded decimals, one field per
/// `(action, species)` cell. The width is the number of digits in the
/// largest species count, so every key of a problem has the same length.
///
/// ```
/// use u_allocation::allocation::AllocationKey;
///
/// let key = AllocationKey::new(vec![0, 12, 3, 0], 2);
/// assert_eq!(key.to_string(), "00120300");
/// assert_eq!(AllocationKey::decode("00120300", 2).unwrap(), key);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AllocationKey {
    counts: Vec<u16>,
    width: usize,
}

impl AllocationKey {
    /// Creates a key from raw counts and field width.
    pub fn new(counts: Vec<u16>, width: usize) -> Self {
        Self {
            counts,
            width: width.max(1),
        }
    }

    /// Decodes a rendered key.
    pub fn decode(encoded: &str, width: usize) -> Result<Self> {
        let width = width.max(1);
        if !encoded.is_ascii() || encoded.len() % width != 0 {
            return Err(AllocationError::InvalidKey(encoded.to_string()));
        }
        let counts = encoded
            .as_bytes()
            .chunks(width)
            .map(|field| {
                std::str::from_utf8(field)
                    .ok()
                    .and_then(|s| s.parse::<u16>().ok())
                    .ok_or_else(|| AllocationError::InvalidKey(encoded.to_string()))
            })
            .collect::<Result<Vec<u16>>>()?;
        Ok(Self { counts, width })
    }

    /// Raw counts, action-major.
    pub fn counts(&self) -> &[u16] {
        &self.counts
    }

    /// Digits per field.
    pub fn width(&self) -> usize {
        self.width
    }
}

impl fmt::Display for AllocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for count in &self.counts {
            write!(f, "{:0width$}", count, width = self.width)?;
        }
        Ok(())
    }
}

/// Schedule figures attached to an allocation after costing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    /// Makespan of the resolved schedule; `None` if temporally infeasible.
    pub makespan: Option<f64>,
    /// Precedence-only critical path (lower bound, no contention or travel).
    pub best: f64,
    /// Serial sum of durations.
    pub worst: f64,
}

impl ScheduleSummary {
    /// Creates a summary.
    pub fn new(makespan: Option<f64>, best: f64, worst: f64) -> Self {
        Self {
            makespan,
            best,
            worst,
        }
    }

    /// Whether the schedule is temporally feasible.
    pub fn is_feasible(&self) -> bool {
        self.makespan.is_some()
    }

    /// Normalized quality in `[0, 1]`: 0 at the lower bound, 1 at the serial
    /// bound or when infeasible.
    pub fn quality(&self) -> f64 {
        match self.makespan {
            None => 1.0,
            Some(_) if self.worst <= self.best => 0.0,
            Some(m) => ((m - self.best) / (self.worst - self.best)).clamp(0.0, 1.0),
        }
    }
}

/// An assignment of robot counts to actions.
///
/// Counts are per `(action, species)` cell and bounded by the species count:
/// robots of a species serve actions one after another, so the same robots
/// may appear on several actions. Allocations are values: adding a robot
/// returns a new allocation.
#[derive(Debug, Clone)]
pub struct Allocation {
    problem: Arc<AllocationProblem>,
    counts: Vec<u16>,
    assigned: Vec<TraitVector>,
    goal_distance: f64,
    summary: Option<ScheduleSummary>,
}

impl Allocation {
    /// The empty allocation of a problem.
    pub fn new(problem: Arc<AllocationProblem>) -> Self {
        let dim = problem.trait_dimension();
        let actions = problem.action_count();
        let counts = vec![0; actions * problem.species_count()];
        let assigned = vec![TraitVector::zeros(dim); actions];
        let mut allocation = Self {
            problem,
            counts,
            assigned,
            goal_distance: 0.0,
            summary: None,
        };
        allocation.goal_distance = allocation.compute_goal_distance();
        allocation
    }

    /// Rebuilds an allocation from a decoded key.
    pub fn from_key(problem: Arc<AllocationProblem>, key: &AllocationKey) -> Result<Self> {
        let expected = problem.action_count() * problem.species_count();
        if key.counts().len() != expected {
            return Err(AllocationError::DimensionMismatch {
                context: "allocation key".into(),
                expected,
                actual: key.counts().len(),
            });
        }
        let mut allocation = Self::new(problem);
        allocation.counts = key.counts().to_vec();
        allocation.recompute();
        Ok(allocation)
    }

    /// The shared problem.
    pub fn problem(&self) -> &Arc<AllocationProblem> {
        &self.problem
    }

    /// Robots of `species` assigned to `action`.
    #[inline]
    pub fn count(&self, action: usize, species: usize) -> u16 {
        self.counts[action * self.problem.species_count() + species]
    }

    /// Raw counts, action-major.
    pub fn counts(&self) -> &[u16] {
        &self.counts
    }

    /// Summed traits of the robots on `action`.
    pub fn assigned(&self, action: usize) -> &TraitVector {
        &self.assigned[action]
    }

    /// Remaining deficit of `action`.
    pub fn deficit(&self, action: usize) -> TraitVector {
        self.assigned[action].deficit_to(&self.problem.actions[action].cumulative)
    }

    /// Total remaining deficit over all actions.
    pub fn goal_distance(&self) -> f64 {
        self.goal_distance
    }

    /// Whether every action's requirement is met.
    pub fn is_goal(&self) -> bool {
        self.problem
            .actions
            .iter()
            .zip(&self.assigned)
            .all(|(action, have)| have.dominates(&action.cumulative))
    }

    /// Total robot assignments.
    pub fn assignments(&self) -> usize {
        self.counts.iter().map(|c| *c as usize).sum()
    }

    /// Actions served by at least one robot of `species`.
    pub fn served_actions(&self, species: usize) -> Vec<usize> {
        (0..self.problem.action_count())
            .filter(|&a| self.count(a, species) > 0)
            .collect()
    }

    /// Species with at least one robot on `action`.
    pub fn team(&self, action: usize) -> Vec<usize> {
        (0..self.problem.species_count())
            .filter(|&s| self.count(action, s) > 0)
            .collect()
    }

    /// Identity key.
    pub fn key(&self) -> AllocationKey {
        AllocationKey::new(self.counts.clone(), key_width(&self.problem))
    }

    /// Schedule figures, once costed.
    pub fn schedule_summary(&self) -> Option<&ScheduleSummary> {
        self.summary.as_ref()
    }

    /// Makespan of the attached schedule, if feasible.
    pub fn makespan(&self) -> Option<f64> {
        self.summary.and_then(|s| s.makespan)
    }

    pub(crate) fn set_schedule_summary(&mut self, summary: ScheduleSummary) {
        self.summary = Some(summary);
    }

    /// Assigns one more robot of `species` to `action`.
    ///
    /// Returns `Ok(None)` when the species is not eligible for the action or
    /// all of its robots are already on it.
    pub fn add_robot(&self, species: usize, action: usize) -> Result<Option<Allocation>> {
        let row = self
            .problem
            .species
            .get(species)
            .ok_or(AllocationError::UnknownSpecies(species))?;
        if action >= self.problem.action_count() {
            return Err(ScheduleError::UnknownAction(action).into());
        }
        if !self.problem.is_eligible(species, action) || self.count(action, species) >= row.count {
            return Ok(None);
        }

        let mut child = self.clone();
        child.summary = None;
        child.counts[action * self.problem.species_count() + species] += 1;
        child.assigned[action].add_scaled(&row.traits, 1.0);
        child.goal_distance = child.compute_goal_distance();
        Ok(Some(child))
    }

    fn recompute(&mut self) {
        let species = self.problem.species_count();
        for (action, sum) in self.assigned.iter_mut().enumerate() {
            *sum = TraitVector::zeros(sum.len());
            for (s, row) in self.problem.species.iter().enumerate() {
                sum.add_scaled(&row.traits, self.counts[action * species + s] as f64);
            }
        }
        self.goal_distance = self.compute_goal_distance();
        self.summary = None;
    }

    fn compute_goal_distance(&self) -> f64 {
        (0..self.problem.action_count())
            .map(|a| self.deficit(a).sum())
            .sum()
    }
}

impl SearchState for Allocation {
    type Key = AllocationKey;

    fn key(&self) -> AllocationKey {
        Allocation::key(self)
    }
}

/// Digits in the largest species count.
pub(crate) fn key_width(problem: &AllocationProblem) -> usize {
    let max = problem.species.iter().map(|s| s.count).max().unwrap_or(0);
    max.to_string().len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActionRequirement, RobotSpecies};

    fn problem() -> Arc<AllocationProblem> {
        Arc::new(
            AllocationProblem::new()
                .with_species(RobotSpecies::new([1.0, 0.0]).with_count(2))
                .with_species(RobotSpecies::new([0.0, 1.0]).with_count(12))
                .with_action(ActionRequirement::new("lift", [2.0, 0.0]))
                .with_action(
                    ActionRequirement::new("scan", [0.0, 1.0]).with_cutoff([0.0, 1.0]),
                ),
        )
    }

    #[test]
    fn test_empty_allocation() {
        let alloc = Allocation::new(problem());
        assert_eq!(alloc.goal_distance(), 3.0);
        assert!(!alloc.is_goal());
        assert_eq!(alloc.assignments(), 0);
        assert_eq!(alloc.key().to_string(), "00000000");
    }

    #[test]
    fn test_add_robot() {
        let alloc = Allocation::new(problem());
        let child = alloc.add_robot(0, 0).unwrap().unwrap();
        assert_eq!(child.count(0, 0), 1);
        assert_eq!(child.goal_distance(), 2.0);
        assert_eq!(child.assigned(0).values(), &[1.0, 0.0]);
        // parent untouched
        assert_eq!(alloc.count(0, 0), 0);

        let full = child.add_robot(0, 0).unwrap().unwrap();
        assert_eq!(full.count(0, 0), 2);
        // only two robots of species 0
        assert!(full.add_robot(0, 0).unwrap().is_none());
        assert_eq!(full.key().to_string(), "02000000");
    }

    #[test]
    fn test_cutoff_blocks_ineligible_species() {
        let alloc = Allocation::new(problem());
        assert!(alloc.add_robot(0, 1).unwrap().is_none());
        assert!(alloc.add_robot(1, 1).unwrap().is_some());
    }

    #[test]
    fn test_unknown_indices() {
        let alloc = Allocation::new(problem());
        assert!(matches!(
            alloc.add_robot(5, 0),
            Err(AllocationError::UnknownSpecies(5))
        ));
        assert!(alloc.add_robot(0, 9).is_err());
    }

    #[test]
    fn test_goal() {
        let alloc = Allocation::new(problem())
            .add_robot(0, 0)
            .unwrap()
            .unwrap()
            .add_robot(0, 0)
            .unwrap()
            .unwrap()
            .add_robot(1, 1)
            .unwrap()
            .unwrap();
        assert!(alloc.is_goal());
        assert_eq!(alloc.goal_distance(), 0.0);
        assert_eq!(alloc.served_actions(0), vec![0]);
        assert_eq!(alloc.team(1), vec![1]);
    }

    #[test]
    fn test_key_round_trip_through_allocation() {
        let p = problem();
        let alloc = Allocation::new(p.clone())
            .add_robot(1, 1)
            .unwrap()
            .unwrap();
        let key = AllocationKey::decode(&alloc.key().to_string(), 2).unwrap();
        let rebuilt = Allocation::from_key(p, &key).unwrap();
        assert_eq!(rebuilt.key(), alloc.key());
        assert_eq!(rebuilt.goal_distance(), alloc.goal_distance());
    }

    #[test]
    fn test_key_decode_errors() {
        assert!(AllocationKey::decode("123", 2).is_err());
        assert!(AllocationKey::decode("1x", 2).is_err());
        let p = problem();
        let short = AllocationKey::new(vec![0, 0], 2);
        assert!(matches!(
            Allocation::from_key(p, &short),
            Err(AllocationError::DimensionMismatch { expected: 4, .. })
        ));
    }

    #[test]
    fn test_summary_quality() {
        assert_eq!(ScheduleSummary::new(Some(10.0), 10.0, 20.0).quality(), 0.0);
        assert_eq!(ScheduleSummary::new(Some(15.0), 10.0, 20.0).quality(), 0.5);
        assert_eq!(ScheduleSummary::new(Some(30.0), 10.0, 20.0).quality(), 1.0);
        assert_eq!(ScheduleSummary::new(None, 10.0, 20.0).quality(), 1.0);
        assert_eq!(ScheduleSummary::new(Some(5.0), 5.0, 5.0).quality(), 0.0);
    }
}
