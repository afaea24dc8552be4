//! Action requirement model.
//!
//! An action is a unit of work that needs robots. Its requirement has two
//! parts:
//! - **Cumulative**: must be met by the *sum* of traits of every robot
//!   assigned to the action.
//! - **Non-cumulative**: per-robot cutoff; each assigned robot must meet it
//!   on its own.

use serde::{Deserialize, Serialize};

use super::TraitVector;

/// Identifier of a location known to the motion planner.
pub type LocationId = u32;

/// A required action with its trait needs and nominal duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRequirement {
    /// Action name (for reports).
    pub name: String,
    /// Trait total the assigned team must reach.
    pub cumulative: TraitVector,
    /// Minimum traits each assigned robot must have.
    pub noncumulative: TraitVector,
    /// Nominal duration, excluding travel.
    pub duration: f64,
    /// Where the action starts and ends. `None` = location-free action.
    pub locations: Option<(LocationId, LocationId)>,
}

impl ActionRequirement {
    /// Creates an action with a cumulative requirement and no cutoff.
    pub fn new(name: impl Into<String>, cumulative: impl Into<TraitVector>) -> Self {
        let cumulative = cumulative.into();
        let noncumulative = TraitVector::zeros(cumulative.len());
        Self {
            name: name.into(),
            cumulative,
            noncumulative,
            duration: 0.0,
            locations: None,
        }
    }

    /// Sets the per-robot cutoff.
    pub fn with_cutoff(mut self, noncumulative: impl Into<TraitVector>) -> Self {
        self.noncumulative = noncumulative.into();
        self
    }

    /// Sets the nominal duration.
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    /// Sets the start and end locations.
    pub fn with_locations(mut self, start: LocationId, end: LocationId) -> Self {
        self.locations = Some((start, end));
        self
    }

    /// Sets a single location (start = end).
    pub fn at(self, location: LocationId) -> Self {
        self.with_locations(location, location)
    }

    /// Whether a robot with `traits` may be assigned to this action.
    #[inline]
    pub fn admits(&self, traits: &TraitVector) -> bool {
        traits.dominates(&self.noncumulative)
    }

    /// Whether the action needs anything at all.
    pub fn has_requirement(&self) -> bool {
        !self.cumulative.is_zero()
    }
}
