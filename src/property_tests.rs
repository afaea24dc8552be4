//! Property-based tests for allocation search and temporal networks.
//!
//! Uses proptest to check invariants across randomly generated problems.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use proptest::prelude::*;

    use crate::allocation::{
        is_allocatable, Allocation, AllocationExpander, AllocationIsGoal,
        AllocationResultsPackager, StepCost, TraitDeficitHeuristic,
    };
    use crate::config::SolverConfig;
    use crate::models::{ActionRequirement, AllocationProblem, OrderingConstraint, RobotSpecies};
    use crate::solver::Solver;
    use crate::search::{AStarSearch, SearchLimits, SearchStatus};
    use crate::temporal::{Disjunct, DisjunctId, TabuConfig, TabuSearch, TemporalNetwork};

    // ========================================================================
    // Generators
    // ========================================================================

    /// Integer-valued traits keep dominance checks exact.
    fn traits(dim: usize) -> impl Strategy<Value = Vec<f64>> {
        prop::collection::vec((0u8..4).prop_map(f64::from), dim)
    }

    fn problem() -> impl Strategy<Value = AllocationProblem> {
        (1usize..=3).prop_flat_map(|dim| {
            (
                prop::collection::vec((traits(dim), 1u16..=3), 1..=3),
                prop::collection::vec((traits(dim), 1u8..=5), 1..=3),
            )
                .prop_map(|(species, actions)| {
                    let mut problem = AllocationProblem::new();
                    for (traits, count) in species {
                        problem = problem.with_species(RobotSpecies::new(traits).with_count(count));
                    }
                    for (i, (requirement, duration)) in actions.into_iter().enumerate() {
                        problem = problem.with_action(
                            ActionRequirement::new(format!("a{i}"), requirement)
                                .with_duration(f64::from(duration)),
                        );
                    }
                    problem
                })
        })
    }

    /// One trait, few robots and many actions, so robots are shared.
    fn crowded() -> impl Strategy<Value = AllocationProblem> {
        (
            prop::collection::vec((1u8..=2, 1u16..=3), 1..=2),
            prop::collection::vec((1u8..=3, 1u8..=5), 2..=5),
        )
            .prop_map(|(species, actions)| {
                let mut problem = AllocationProblem::new();
                for (value, count) in species {
                    problem = problem
                        .with_species(RobotSpecies::new([f64::from(value)]).with_count(count));
                }
                for (i, (requirement, duration)) in actions.into_iter().enumerate() {
                    problem = problem.with_action(
                        ActionRequirement::new(format!("a{i}"), [f64::from(requirement)])
                            .with_duration(f64::from(duration)),
                    );
                }
                problem
            })
    }

    /// Durations plus forward-only orderings (always acyclic).
    fn dag() -> impl Strategy<Value = (Vec<f64>, Vec<OrderingConstraint>)> {
        (2usize..8).prop_flat_map(|n| {
            (
                prop::collection::vec((1u8..10).prop_map(f64::from), n),
                prop::collection::vec((0..n, 0..n), 0..n * 2),
            )
                .prop_map(|(durations, pairs)| {
                    let orderings = pairs
                        .into_iter()
                        .filter(|(a, b)| a < b)
                        .map(OrderingConstraint::from)
                        .collect();
                    (durations, orderings)
                })
        })
    }

    fn search(
        problem: Arc<AllocationProblem>,
    ) -> AStarSearch<Allocation, AllocationExpander, TraitDeficitHeuristic, AllocationIsGoal> {
        AStarSearch::new(
            Allocation::new(problem),
            AllocationExpander::new(StepCost),
            TraitDeficitHeuristic::new(0.0),
            AllocationIsGoal::new(),
        )
    }

    // ========================================================================
    // Allocation Search Property Tests
    // ========================================================================

    proptest! {
        /// Every allocatable problem yields a goal whose teams cover each
        /// requirement.
        #[test]
        fn prop_goal_dominates_requirements(problem in problem()) {
            prop_assume!(is_allocatable(&problem));
            let problem = Arc::new(problem);
            let mut search = search(Arc::clone(&problem));
            prop_assert_eq!(search.search(SearchLimits::none()), SearchStatus::GoalFound);

            let result = search.package(&AllocationResultsPackager);
            prop_assert!(result.found);
            let allocation = result.allocation.unwrap();
            for (a, action) in problem.actions.iter().enumerate() {
                prop_assert!(allocation.assigned(a).dominates(&action.cumulative));
                for s in 0..problem.species_count() {
                    prop_assert!(allocation.count(a, s) <= problem.species[s].count);
                }
            }
        }

        /// Path cost never decreases from parent to child.
        #[test]
        fn prop_path_cost_monotone(problem in problem()) {
            prop_assume!(is_allocatable(&problem));
            let mut search = search(Arc::new(problem));
            search.search(SearchLimits::none());
            let graph = search.graph();
            for node in graph.nodes() {
                if let Some(parent) = node.parent {
                    prop_assert!(node.g >= graph.node(parent).g);
                    prop_assert_eq!(node.depth, graph.node(parent).depth + 1);
                }
            }
        }

        /// Keys identify allocations: decoding a key rebuilds the same counts.
        #[test]
        fn prop_key_rebuilds_allocation(problem in problem()) {
            prop_assume!(is_allocatable(&problem));
            let problem = Arc::new(problem);
            let mut search = search(Arc::clone(&problem));
            search.search(SearchLimits::none());
            for node in search.graph().nodes() {
                let rebuilt = Allocation::from_key(Arc::clone(&problem), &node.key).unwrap();
                prop_assert_eq!(rebuilt.counts(), node.state.counts());
            }
        }
    }

    // ========================================================================
    // Temporal Network Property Tests
    // ========================================================================

    proptest! {
        /// Building twice from the same input gives the same times.
        #[test]
        fn prop_rebuild_idempotent((durations, orderings) in dag()) {
            let mut net = TemporalNetwork::from_orderings(&durations, &orderings).unwrap();
            let first = net.schedule();
            net.build(&durations, &orderings).unwrap();
            prop_assert_eq!(net.schedule(), first);
        }

        /// Earliest times satisfy every ordering and the makespan is at
        /// least the longest action.
        #[test]
        fn prop_schedule_respects_orderings((durations, orderings) in dag()) {
            let net = TemporalNetwork::from_orderings(&durations, &orderings).unwrap();
            let schedule = net.schedule().unwrap();
            for o in &orderings {
                prop_assert!(schedule.respects(o.before, o.after));
            }
            let longest = durations.iter().copied().fold(0.0, f64::max);
            prop_assert!(net.makespan().unwrap() >= longest);
        }

        /// Removing an ordering and adding it back restores the makespan.
        #[test]
        fn prop_remove_then_add_ordering_restores((durations, orderings) in dag()) {
            prop_assume!(!orderings.is_empty());
            let mut net = TemporalNetwork::from_orderings(&durations, &orderings).unwrap();
            let before = net.makespan();
            let o = orderings[0];
            net.remove_ordering(o.before, o.after).unwrap();
            prop_assert!(net.makespan() <= before);
            net.add_ordering(o.before, o.after).unwrap();
            prop_assert_eq!(net.makespan(), before);
        }

        /// Reverting a duration increase restores the schedule.
        #[test]
        fn prop_revert_duration_edit(
            (durations, orderings) in dag(),
            delta in 1u8..20,
        ) {
            let mut net = TemporalNetwork::from_orderings(&durations, &orderings).unwrap();
            let before = net.schedule();
            net.increase_duration(0, f64::from(delta)).unwrap();
            prop_assert!(net.makespan() >= before.as_ref().map(|s| s.makespan()));
            net.revert_last_edit().unwrap();
            prop_assert_eq!(net.schedule(), before);
        }

        /// Tabu search never reports something worse than the starting
        /// orientation, and its best trace never goes up.
        #[test]
        fn prop_tabu_never_worse(
            durations in prop::collection::vec((1u8..10).prop_map(f64::from), 4),
            flips in prop::collection::vec(any::<bool>(), 3),
            seed in any::<u64>(),
        ) {
            // a chain of contention pairs over four actions
            let disjuncts = vec![Disjunct::new(0, 1), Disjunct::new(1, 2), Disjunct::new(2, 3)];
            let mut net = TemporalNetwork::new();
            net.build_with_disjuncts(&durations, &[], disjuncts, DisjunctId::new(flips)).unwrap();
            let start = net.makespan();

            let config = TabuConfig::default().with_candidates(3).with_seed(seed);
            let outcome = TabuSearch::new(config).resolve(&net);
            let found = outcome.makespan.unwrap();
            if let Some(start) = start {
                prop_assert!(found <= start);
            }
            prop_assert!(found >= durations.iter().copied().fold(0.0, f64::max));
            for pair in outcome.best_trace.windows(2) {
                prop_assert!(pair[1] <= pair[0]);
            }
            prop_assert!(outcome.network.is_resolved());
        }
    }

    // ========================================================================
    // Solver Property Tests
    // ========================================================================

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        /// At no instant does a reported schedule use more robots of a
        /// species than the species has.
        #[test]
        fn prop_schedule_within_species_capacity(
            problem in prop_oneof![problem(), crowded()],
            seed in any::<u64>(),
        ) {
            let capacity: Vec<u16> = problem.species.iter().map(|s| s.count).collect();
            let config = SolverConfig::default()
                .with_tabu(TabuConfig::default().with_candidates(3))
                .with_seed(seed);
            let report = Solver::new(config).solve(problem).unwrap();
            let Some(schedule) = report.schedule.as_ref() else {
                return Ok(());
            };
            for entry in &schedule.entries {
                let t = entry.start;
                for (species, &count) in capacity.iter().enumerate() {
                    let busy: u16 = schedule
                        .entries
                        .iter()
                        .filter(|e| e.start <= t && t < e.end)
                        .map(|e| report.count(e.action, species))
                        .sum();
                    prop_assert!(
                        busy <= count,
                        "species {} runs {} robots at t={} with {} available",
                        species, busy, t, count
                    );
                }
            }
        }
    }
}
