//! Goal test and result packaging for allocation search.

use crate::search::{
    GoalLocator, NodeId, SearchGraph, SearchResultPackager, SearchStats, SearchStatus,
};

use super::state::Allocation;

/// An allocation is a goal when every requirement is met.
///
/// Assigned robots always meet the cutoffs, since the expander never adds
/// an ineligible one. With `require_feasible_schedule`, the attached
/// schedule must also be temporally feasible.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllocationIsGoal {
    /// Also require a feasible schedule.
    pub require_feasible_schedule: bool,
}

impl AllocationIsGoal {
    /// Goal test on requirements only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Goal test that also rejects temporally infeasible allocations.
    pub fn feasible_only() -> Self {
        Self {
            require_feasible_schedule: true,
        }
    }
}

impl GoalLocator<Allocation> for AllocationIsGoal {
    fn is_goal(&self, state: &Allocation) -> bool {
        state.is_goal() && (!self.require_feasible_schedule || state.makespan().is_some())
    }
}

/// Packaged search result.
#[derive(Debug, Clone)]
pub struct AllocationResult {
    /// Goal allocation, or the most promising one when no goal was found.
    pub allocation: Option<Allocation>,
    /// Whether `allocation` meets every requirement.
    pub found: bool,
    /// Path cost of `allocation`.
    pub cost: Option<f64>,
    /// Assignments on the path to `allocation`.
    pub depth: usize,
    /// Status of the last search call.
    pub status: SearchStatus,
    /// Search counters.
    pub stats: SearchStats,
}

/// Extracts an [`AllocationResult`] from a finished search.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllocationResultsPackager;

impl SearchResultPackager<Allocation> for AllocationResultsPackager {
    type Output = AllocationResult;

    fn package(
        &self,
        graph: &SearchGraph<Allocation>,
        target: Option<NodeId>,
        status: SearchStatus,
        stats: &SearchStats,
    ) -> AllocationResult {
        let node = target.and_then(|id| graph.get(id));
        AllocationResult {
            allocation: node.map(|n| n.state.clone()),
            found: node.is_some_and(|n| n.state.is_goal()),
            cost: node.map(|n| n.g),
            depth: node.map_or(0, |n| n.depth),
            status,
            stats: *stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::allocation::{AllocationExpander, ScheduleSummary, StepCost, TraitDeficitHeuristic};
    use crate::models::{ActionRequirement, AllocationProblem, RobotSpecies};
    use crate::search::{AStarSearch, SearchLimits};

    fn problem() -> Arc<AllocationProblem> {
        Arc::new(
            AllocationProblem::new()
                .with_species(RobotSpecies::new([1.0, 0.0]))
                .with_species(RobotSpecies::new([0.0, 1.0]))
                .with_action(ActionRequirement::new("a", [1.0, 0.0])),
        )
    }

    #[test]
    fn test_goal_flags() {
        let mut goal = Allocation::new(problem()).add_robot(0, 0).unwrap().unwrap();
        assert!(AllocationIsGoal::new().is_goal(&goal));
        assert!(!AllocationIsGoal::feasible_only().is_goal(&goal));
        goal.set_schedule_summary(ScheduleSummary::new(Some(1.0), 1.0, 1.0));
        assert!(AllocationIsGoal::feasible_only().is_goal(&goal));
        assert!(!AllocationIsGoal::new().is_goal(&Allocation::new(problem())));
    }

    #[test]
    fn test_single_action_assigns_matching_robot() {
        let mut search = AStarSearch::new(
            Allocation::new(problem()),
            AllocationExpander::new(StepCost),
            TraitDeficitHeuristic::new(0.0),
            AllocationIsGoal::new(),
        );
        assert_eq!(search.search(SearchLimits::none()), SearchStatus::GoalFound);
        let result = search.package(&AllocationResultsPackager);
        assert!(result.found);
        assert_eq!(result.depth, 1);
        assert_eq!(result.cost, Some(1.0));
        let allocation = result.allocation.unwrap();
        assert_eq!(allocation.count(0, 0), 1);
        assert_eq!(allocation.count(0, 1), 0);
    }

    #[test]
    fn test_package_without_goal() {
        let search = AStarSearch::new(
            Allocation::new(problem()),
            AllocationExpander::new(StepCost),
            TraitDeficitHeuristic::new(0.0),
            AllocationIsGoal::new(),
        );
        let result = search.package(&AllocationResultsPackager);
        assert!(!result.found);
        assert_eq!(result.depth, 0);
        assert_eq!(result.stats.nodes_visited, 1);
    }
}
