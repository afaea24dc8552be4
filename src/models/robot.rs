//! Robot species model.
//!
//! Robots of identical capability may be grouped into a species: `count`
//! robots share one trait row. Ungrouped problems use one species per robot
//! with `count = 1`.

use serde::{Deserialize, Serialize};

use super::TraitVector;

/// A group of identical robots sharing one trait row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotSpecies {
    /// Human-readable name.
    pub name: String,
    /// Capability vector shared by every robot of this species.
    pub traits: TraitVector,
    /// Number of robots in the species (default: 1).
    pub count: u16,
}

impl RobotSpecies {
    /// Creates a single-robot species.
    pub fn new(traits: impl Into<TraitVector>) -> Self {
        Self {
            name: String::new(),
            traits: traits.into(),
            count: 1,
        }
    }

    /// Sets the species name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the number of robots in the species.
    pub fn with_count(mut self, count: u16) -> Self {
        self.count = count;
        self
    }

    /// Trait value used as speed, if the problem defines a speed dimension.
    ///
    /// Non-positive speeds are treated as missing.
    pub fn speed(&self, speed_index: Option<usize>) -> Option<f64> {
        speed_index
            .and_then(|i| self.traits.get(i))
            .filter(|s| *s > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_species_builder() {
        let s = RobotSpecies::new([2.0, 1.5])
            .with_name("drone")
            .with_count(3);
        assert_eq!(s.name, "drone");
        assert_eq!(s.count, 3);
        assert_eq!(s.traits.len(), 2);
    }

    #[test]
    fn test_speed_lookup() {
        let s = RobotSpecies::new([2.0, 0.0]);
        assert_eq!(s.speed(Some(0)), Some(2.0));
        assert_eq!(s.speed(Some(1)), None);
        assert_eq!(s.speed(Some(7)), None);
        assert_eq!(s.speed(None), None);
    }
}
