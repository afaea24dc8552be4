//! Allocation problem definition.
//!
//! Bundles everything the search needs: robot species, required actions,
//! precedence constraints, and where each species starts. A problem is
//! read-only once search begins and is shared by every allocation state.

use serde::{Deserialize, Serialize};

use super::{ActionRequirement, LocationId, OrderingConstraint, RobotSpecies};

/// A complete, materialized allocation problem.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllocationProblem {
    /// Robot species (trait rows with counts).
    pub species: Vec<RobotSpecies>,
    /// Required actions.
    pub actions: Vec<ActionRequirement>,
    /// Precedence constraints between actions.
    pub orderings: Vec<OrderingConstraint>,
    /// Start location per species. Empty = no travel modelling.
    pub start_locations: Vec<LocationId>,
    /// Trait index holding robot speed. `None` = unit speed.
    pub speed_index: Option<usize>,
}

impl AllocationProblem {
    /// Creates an empty problem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a robot species.
    pub fn with_species(mut self, species: RobotSpecies) -> Self {
        self.species.push(species);
        self
    }

    /// Adds an action.
    pub fn with_action(mut self, action: ActionRequirement) -> Self {
        self.actions.push(action);
        self
    }

    /// Adds a precedence constraint `before -> after`.
    pub fn with_ordering(mut self, before: usize, after: usize) -> Self {
        self.orderings.push(OrderingConstraint::new(before, after));
        self
    }

    /// Sets the start location of every species.
    pub fn with_start_locations(mut self, locations: Vec<LocationId>) -> Self {
        self.start_locations = locations;
        self
    }

    /// Sets the speed trait index.
    pub fn with_speed_index(mut self, index: usize) -> Self {
        self.speed_index = Some(index);
        self
    }

    /// Number of trait dimensions (taken from the first species or action).
    pub fn trait_dimension(&self) -> usize {
        self.species
            .first()
            .map(|s| s.traits.len())
            .or_else(|| self.actions.first().map(|a| a.cumulative.len()))
            .unwrap_or(0)
    }

    /// Number of species rows.
    #[inline]
    pub fn species_count(&self) -> usize {
        self.species.len()
    }

    /// Number of actions.
    #[inline]
    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    /// Total robots across all species.
    pub fn robot_count(&self) -> usize {
        self.species.iter().map(|s| s.count as usize).sum()
    }

    /// Nominal action durations in action order.
    pub fn durations(&self) -> Vec<f64> {
        self.actions.iter().map(|a| a.duration).collect()
    }

    /// Sum of all cumulative requirements (goal distance of the empty allocation).
    pub fn total_requirement(&self) -> f64 {
        self.actions.iter().map(|a| a.cumulative.sum()).sum()
    }

    /// Whether species `species` may be assigned to action `action`.
    pub fn is_eligible(&self, species: usize, action: usize) -> bool {
        match (self.species.get(species), self.actions.get(action)) {
            (Some(s), Some(a)) => a.admits(&s.traits),
            _ => false,
        }
    }

    /// Whether any species has a start location (travel is modelled).
    pub fn has_locations(&self) -> bool {
        !self.start_locations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AllocationProblem {
        AllocationProblem::new()
            .with_species(RobotSpecies::new([1.0, 0.0]).with_count(2))
            .with_species(RobotSpecies::new([0.0, 3.0]))
            .with_action(ActionRequirement::new("a", [1.0, 1.0]).with_duration(4.0))
            .with_action(
                ActionRequirement::new("b", [2.0, 0.0])
                    .with_cutoff([1.0, 0.0])
                    .with_duration(2.0),
            )
            .with_ordering(0, 1)
    }

    #[test]
    fn test_problem_dimensions() {
        let p = sample();
        assert_eq!(p.trait_dimension(), 2);
        assert_eq!(p.species_count(), 2);
        assert_eq!(p.action_count(), 2);
        assert_eq!(p.robot_count(), 3);
        assert_eq!(p.durations(), vec![4.0, 2.0]);
        assert_eq!(p.total_requirement(), 4.0);
    }

    #[test]
    fn test_eligibility() {
        let p = sample();
        assert!(p.is_eligible(0, 1));
        assert!(!p.is_eligible(1, 1));
        assert!(p.is_eligible(1, 0));
        assert!(!p.is_eligible(5, 0));
    }

    #[test]
    fn test_problem_serde_roundtrip() {
        let p = sample().with_start_locations(vec![0, 1]).with_speed_index(0);
        let json = serde_json::to_string(&p).unwrap();
        let back: AllocationProblem = serde_json::from_str(&json).unwrap();
        assert_eq!(back.orderings, p.orderings);
        assert_eq!(back.start_locations, vec![0, 1]);
        assert_eq!(back.speed_index, Some(0));
    }
}
