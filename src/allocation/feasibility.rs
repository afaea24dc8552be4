//! Allocatability checks.
//!
//! Both checks are necessary conditions only: they compare trait capacity
//! per action and ignore that the same robots serve several actions.

use crate::models::{AllocationProblem, TraitVector};

use super::state::Allocation;

/// Whether every action could be covered by all eligible robots together.
///
/// For each action, sums `traits x count` over the species whose traits
/// meet the action's cutoff and compares it against the cumulative
/// requirement. Run once before search.
pub fn is_allocatable(problem: &AllocationProblem) -> bool {
    (0..problem.action_count()).all(|action| {
        let mut capacity = TraitVector::zeros(problem.trait_dimension());
        for (s, species) in problem.species.iter().enumerate() {
            if problem.is_eligible(s, action) {
                capacity.add_scaled(&species.traits, species.count as f64);
            }
        }
        capacity.dominates(&problem.actions[action].cumulative)
    })
}

/// Whether `allocation` can still reach a goal.
///
/// Per action: the assigned sum plus every eligible robot not yet on the
/// action must dominate the requirement.
pub fn check_allocatable(allocation: &Allocation) -> bool {
    let problem = allocation.problem();
    (0..problem.action_count()).all(|action| {
        let mut reachable = allocation.assigned(action).clone();
        for (s, species) in problem.species.iter().enumerate() {
            if problem.is_eligible(s, action) {
                let free = species.count.saturating_sub(allocation.count(action, s));
                reachable.add_scaled(&species.traits, free as f64);
            }
        }
        reachable.dominates(&problem.actions[action].cumulative)
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::models::{ActionRequirement, RobotSpecies};

    #[test]
    fn test_single_action_two_robots() {
        let problem = AllocationProblem::new()
            .with_species(RobotSpecies::new([1.0, 0.0]))
            .with_species(RobotSpecies::new([0.0, 1.0]))
            .with_action(ActionRequirement::new("a", [1.0, 0.0]));
        assert!(is_allocatable(&problem));
    }

    #[test]
    fn test_insufficient_capacity() {
        let problem = AllocationProblem::new()
            .with_species(RobotSpecies::new([1.0]).with_count(2))
            .with_action(ActionRequirement::new("a", [3.0]));
        assert!(!is_allocatable(&problem));
    }

    #[test]
    fn test_cutoff_excludes_capacity() {
        // Species 1 has plenty of the first trait but fails the cutoff.
        let problem = AllocationProblem::new()
            .with_species(RobotSpecies::new([1.0, 1.0]))
            .with_species(RobotSpecies::new([5.0, 0.0]))
            .with_action(ActionRequirement::new("a", [3.0, 0.0]).with_cutoff([0.0, 1.0]));
        assert!(!is_allocatable(&problem));
    }

    #[test]
    fn test_exact_boundary() {
        let problem = AllocationProblem::new()
            .with_species(RobotSpecies::new([1.5]).with_count(2))
            .with_action(ActionRequirement::new("a", [3.0]));
        assert!(is_allocatable(&problem));
    }

    #[test]
    fn test_check_allocatable_tracks_state() {
        let problem = Arc::new(
            AllocationProblem::new()
                .with_species(RobotSpecies::new([1.0]).with_count(2))
                .with_action(ActionRequirement::new("a", [2.0])),
        );
        let root = Allocation::new(problem);
        assert!(check_allocatable(&root));
        let one = root.add_robot(0, 0).unwrap().unwrap();
        assert!(check_allocatable(&one));
        let two = one.add_robot(0, 0).unwrap().unwrap();
        assert!(check_allocatable(&two));
        assert!(two.is_goal());
    }
}
