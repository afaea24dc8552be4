//! Edge costs for allocation search.

use std::collections::HashMap;

use tracing::warn;

use crate::connector::{ConnectorOutcome, ScheduleConnector};

use super::state::{Allocation, AllocationKey, ScheduleSummary};

/// Prices the edge from an allocation to one of its children.
pub trait PathCost {
    /// Edge cost; may attach schedule figures to `child`.
    fn edge_cost(&mut self, parent: &Allocation, child: &mut Allocation) -> f64;

    /// Attaches whatever the cost model needs to the root.
    fn prepare_root(&mut self, _root: &mut Allocation) {}

    /// Schedule produced while costing the allocation with `key`, if any.
    fn outcome(&self, _key: &AllocationKey) -> Option<&ConnectorOutcome> {
        None
    }
}

/// Unit cost per robot assignment.
#[derive(Debug, Clone, Copy, Default)]
pub struct StepCost;

impl PathCost for StepCost {
    fn edge_cost(&mut self, _parent: &Allocation, _child: &mut Allocation) -> f64 {
        1.0
    }
}

/// Makespan increase caused by an assignment.
///
/// Every child is scheduled through the connector; outcomes are cached per
/// allocation key, so a state reached along several paths is scheduled
/// once and the solver reports the same schedule the search was costed
/// with. The edge cost is `max(0, child makespan - parent makespan)`, which
/// keeps `g` equal to the makespan growth since the root. A temporally
/// infeasible child costs infinity, so it is only popped once every
/// feasible alternative is gone.
pub struct ScheduleCost {
    connector: ScheduleConnector,
    summaries: HashMap<AllocationKey, ScheduleSummary>,
    outcomes: HashMap<AllocationKey, ConnectorOutcome>,
    hits: u64,
}

impl ScheduleCost {
    /// Creates a cost model around a connector.
    pub fn new(connector: ScheduleConnector) -> Self {
        Self {
            connector,
            summaries: HashMap::new(),
            outcomes: HashMap::new(),
            hits: 0,
        }
    }

    /// Allocations scheduled so far.
    pub fn scheduled(&self) -> usize {
        self.summaries.len()
    }

    /// Cache hits so far.
    pub fn cache_hits(&self) -> u64 {
        self.hits
    }

    /// Schedules `allocation` (or returns the cached figures).
    pub fn summarize(&mut self, allocation: &Allocation) -> ScheduleSummary {
        let key = allocation.key();
        if let Some(summary) = self.summaries.get(&key) {
            self.hits += 1;
            return *summary;
        }
        let summary = match self.connector.connect(allocation) {
            Ok(outcome) => {
                let summary = outcome.summary();
                self.outcomes.insert(key.clone(), outcome);
                summary
            }
            Err(err) => {
                warn!(key = %key, error = %err, "scheduling failed");
                ScheduleSummary::new(None, 0.0, 0.0)
            }
        };
        self.summaries.insert(key, summary);
        summary
    }
}

impl PathCost for ScheduleCost {
    fn edge_cost(&mut self, parent: &Allocation, child: &mut Allocation) -> f64 {
        let summary = self.summarize(child);
        child.set_schedule_summary(summary);
        match (parent.makespan(), summary.makespan) {
            (_, None) => f64::INFINITY,
            (Some(before), Some(after)) => (after - before).max(0.0),
            (None, Some(after)) => after,
        }
    }

    fn prepare_root(&mut self, root: &mut Allocation) {
        let summary = self.summarize(root);
        root.set_schedule_summary(summary);
    }

    fn outcome(&self, key: &AllocationKey) -> Option<&ConnectorOutcome> {
        self.outcomes.get(key)
    }
}
