//! Successor generation for allocation search.

use tracing::debug;

use crate::connector::ConnectorOutcome;
use crate::models::TraitVector;
use crate::search::{NodeExpander, Successor};

use super::cost::PathCost;
use super::feasibility::check_allocatable;
use super::state::{Allocation, AllocationKey};

/// Expands an allocation by one robot on the first unmet action.
///
/// Only the lowest-index action with a positive deficit is branched on, so
/// every allocation is reachable through exactly one assignment order per
/// action. A species yields a child if it meets the action's cutoff, still
/// has a robot off this action, and adds to at least one missing trait.
/// Children that can no longer reach a goal are dropped.
pub struct AllocationExpander {
    cost: Box<dyn PathCost>,
    pruned: u64,
}

impl AllocationExpander {
    /// Creates an expander with the given cost model.
    pub fn new(cost: impl PathCost + 'static) -> Self {
        Self::boxed(Box::new(cost))
    }

    /// Creates an expander from a boxed cost model.
    pub fn boxed(cost: Box<dyn PathCost>) -> Self {
        Self { cost, pruned: 0 }
    }

    /// Children dropped by the allocatability check so far.
    pub fn pruned(&self) -> u64 {
        self.pruned
    }

    /// Prepares the root with the cost model.
    pub fn prepare_root(&mut self, root: &mut Allocation) {
        self.cost.prepare_root(root);
    }

    /// Schedule the cost model produced for the allocation with `key`.
    pub fn cached_outcome(&self, key: &AllocationKey) -> Option<&ConnectorOutcome> {
        self.cost.outcome(key)
    }

    /// Uncosted children of `state`.
    pub fn children(&mut self, state: &Allocation) -> Vec<Allocation> {
        let problem = state.problem();
        let Some(action) = (0..problem.action_count()).find(|&a| state.deficit(a).sum() > 0.0) else {
            return Vec::new();
        };
        let deficit = state.deficit(action);

        let mut children = Vec::new();
        for (s, species) in problem.species.iter().enumerate() {
            if !TraitVector::reduces(&species.traits, &deficit) {
                continue;
            }
            if let Ok(Some(child)) = state.add_robot(s, action) {
                if check_allocatable(&child) {
                    children.push(child);
                } else {
                    self.pruned += 1;
                }
            }
        }
        debug!(
            event = "expand",
            key = %state.key(),
            action,
            children = children.len(),
        );
        children
    }
}

impl NodeExpander<Allocation> for AllocationExpander {
    fn expand(&mut self, state: &Allocation) -> Vec<Successor<Allocation>> {
        let children = self.children(state);
        children
            .into_iter()
            .map(|mut child| {
                let cost = self.cost.edge_cost(state, &mut child);
                Successor::new(child, cost)
            })
            .collect()
    }
}
