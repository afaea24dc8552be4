//! Ordering (precedence) constraints.
//!
//! An ordering constraint is a directed pair of action indices: `before`
//! must finish no later than `after` starts (`end(before) <= start(after)`).
//! Constraints between arbitrary time-points are not modeled.

use serde::{Deserialize, Serialize};

/// Directed precedence between two actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderingConstraint {
    /// Action that finishes first.
    pub before: usize,
    /// Action that starts afterwards.
    pub after: usize,
}

impl OrderingConstraint {
    /// Creates a precedence constraint `before -> after`.
    pub fn new(before: usize, after: usize) -> Self {
        Self { before, after }
    }

    /// The same pair with its direction swapped.
    pub fn reversed(self) -> Self {
        Self {
            before: self.after,
            after: self.before,
        }
    }

    /// Whether the constraint mentions `action`.
    pub fn involves(&self, action: usize) -> bool {
        self.before == action || self.after == action
    }
}

impl From<(usize, usize)> for OrderingConstraint {
    fn from((before, after): (usize, usize)) -> Self {
        Self::new(before, after)
    }
}
