//! Schedule (solution) model.
//!
//! A schedule records when each action runs, as produced by a resolved
//! temporal network. Removed actions do not appear.

use serde::{Deserialize, Serialize};

/// A resolved schedule: per-action start/end times.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    /// Scheduled actions, ordered by action index.
    pub entries: Vec<ScheduledAction>,
}

/// An action placed in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduledAction {
    /// Action index in the problem.
    pub action: usize,
    /// Start time.
    pub start: f64,
    /// End time.
    pub end: f64,
}

impl ScheduledAction {
    /// Creates a scheduled action.
    pub fn new(action: usize, start: f64, end: f64) -> Self {
        Self { action, start, end }
    }

    /// Duration (end - start).
    #[inline]
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Whether two intervals overlap (touching endpoints do not overlap).
    pub fn overlaps(&self, other: &ScheduledAction) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl Schedule {
    /// Creates an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry.
    pub fn push(&mut self, entry: ScheduledAction) {
        self.entries.push(entry);
    }

    /// Makespan: latest end time across all entries.
    pub fn makespan(&self) -> f64 {
        self.entries.iter().map(|e| e.end).fold(0.0, f64::max)
    }

    /// Finds the entry for a given action.
    pub fn entry_for(&self, action: usize) -> Option<&ScheduledAction> {
        self.entries.iter().find(|e| e.action == action)
    }

    /// Number of scheduled actions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is scheduled.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Action indices sorted by end time (ties by start, then index).
    pub fn order_by_end(&self) -> Vec<usize> {
        let mut sorted: Vec<&ScheduledAction> = self.entries.iter().collect();
        sorted.sort_by(|a, b| {
            a.end
                .total_cmp(&b.end)
                .then(a.start.total_cmp(&b.start))
                .then(a.action.cmp(&b.action))
        });
        sorted.into_iter().map(|e| e.action).collect()
    }

    /// Checks that `before` ends no later than `after` starts.
    pub fn respects(&self, before: usize, after: usize) -> bool {
        match (self.entry_for(before), self.entry_for(after)) {
            (Some(b), Some(a)) => b.end <= a.start,
            _ => false,
        }
    }
}
