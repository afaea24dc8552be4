//! Goal-distance heuristic.

use crate::search::Heuristic;

use super::state::Allocation;

/// Remaining trait deficit, optionally blended with schedule quality.
///
/// `h = (1 - alpha) * D + alpha * q * D0`, where `D` is the allocation's
/// remaining deficit, `D0` the deficit of the empty allocation and `q` the
/// normalized quality of the attached schedule (0 without one). With
/// `alpha = 0` this is the plain trait distance.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TraitDeficitHeuristic {
    /// Blend factor in `[0, 1]`.
    pub alpha: f64,
}

impl TraitDeficitHeuristic {
    /// Creates the heuristic; `alpha` is clamped to `[0, 1]`.
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
        }
    }
}

impl Heuristic<Allocation> for TraitDeficitHeuristic {
    fn estimate(&self, state: &Allocation) -> f64 {
        let distance = state.goal_distance();
        if self.alpha == 0.0 {
            return distance;
        }
        let root_distance = state.problem().total_requirement();
        let quality = state.schedule_summary().map_or(0.0, |s| s.quality());
        (1.0 - self.alpha) * distance + self.alpha * quality * root_distance
    }
}
