//! Motion planning interface.
//!
//! The connector only needs travel distances between locations. Any path
//! planner can sit behind [`MotionPlanner`]; [`DistanceTable`] covers tests
//! and offline problems where distances are known up front.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::models::LocationId;

/// Workspace description handed to a planner before any query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapDescription {
    /// Lower-left corner of the workspace.
    pub boundary_min: [f64; 2],
    /// Upper-right corner of the workspace.
    pub boundary_max: [f64; 2],
    /// Obstacle polygons, each a closed ring of vertices.
    pub obstacles: Vec<Vec<[f64; 2]>>,
}

impl MapDescription {
    /// Creates an obstacle-free map.
    pub fn new(boundary_min: [f64; 2], boundary_max: [f64; 2]) -> Self {
        Self {
            boundary_min,
            boundary_max,
            obstacles: Vec::new(),
        }
    }

    /// Adds an obstacle polygon.
    pub fn with_obstacle(mut self, polygon: Vec<[f64; 2]>) -> Self {
        self.obstacles.push(polygon);
        self
    }

    /// Whether a point lies inside the boundary.
    pub fn contains(&self, point: [f64; 2]) -> bool {
        (0..2).all(|i| point[i] >= self.boundary_min[i] && point[i] <= self.boundary_max[i])
    }
}

/// Travel distance oracle.
pub trait MotionPlanner {
    /// Installs the workspace map.
    fn set_map(&mut self, map: &MapDescription);

    /// Path length from `from` to `to`, or `None` if no path was found
    /// within `budget`.
    fn query(&self, from: LocationId, to: LocationId, budget: Duration) -> Option<f64>;
}

/// Table-backed planner.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use u_allocation::connector::{DistanceTable, MotionPlanner};
///
/// let table = DistanceTable::new().with_distance(1, 2, 5.0);
/// assert_eq!(table.query(2, 1, Duration::from_secs(1)), Some(5.0));
/// assert_eq!(table.query(1, 3, Duration::from_secs(1)), None);
/// ```
#[derive(Debug, Clone)]
pub struct DistanceTable {
    distances: HashMap<(LocationId, LocationId), f64>,
    coordinates: HashMap<LocationId, [f64; 2]>,
    symmetric: bool,
    map: Option<MapDescription>,
}

impl Default for DistanceTable {
    fn default() -> Self {
        Self {
            distances: HashMap::new(),
            coordinates: HashMap::new(),
            symmetric: true,
            map: None,
        }
    }
}

impl DistanceTable {
    /// Creates an empty symmetric table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Treats `(a, b)` and `(b, a)` as different entries.
    pub fn directed(mut self) -> Self {
        self.symmetric = false;
        self
    }

    /// Adds an explicit distance.
    pub fn with_distance(mut self, from: LocationId, to: LocationId, distance: f64) -> Self {
        self.distances.insert((from, to), distance);
        self
    }

    /// Adds a location with planar coordinates; pairs of located points
    /// without an explicit entry use the straight-line distance.
    pub fn with_point(mut self, location: LocationId, point: [f64; 2]) -> Self {
        self.coordinates.insert(location, point);
        self
    }

    /// Map installed by the last [`MotionPlanner::set_map`] call.
    pub fn map(&self) -> Option<&MapDescription> {
        self.map.as_ref()
    }

    fn lookup(&self, from: LocationId, to: LocationId) -> Option<f64> {
        if let Some(d) = self.distances.get(&(from, to)) {
            return Some(*d);
        }
        if self.symmetric {
            if let Some(d) = self.distances.get(&(to, from)) {
                return Some(*d);
            }
        }
        let (a, b) = (self.coordinates.get(&from)?, self.coordinates.get(&to)?);
        if let Some(map) = &self.map {
            if !map.contains(*a) || !map.contains(*b) {
                return None;
            }
        }
        Some(((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)).sqrt())
    }
}

impl MotionPlanner for DistanceTable {
    fn set_map(&mut self, map: &MapDescription) {
        self.map = Some(map.clone());
    }

    fn query(&self, from: LocationId, to: LocationId, _budget: Duration) -> Option<f64> {
        if from == to {
            return Some(0.0);
        }
        self.lookup(from, to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUDGET: Duration = Duration::from_millis(10);

    #[test]
    fn test_explicit_and_symmetric() {
        let table = DistanceTable::new().with_distance(0, 1, 4.0);
        assert_eq!(table.query(0, 1, BUDGET), Some(4.0));
        assert_eq!(table.query(1, 0, BUDGET), Some(4.0));
        assert_eq!(table.query(3, 3, BUDGET), Some(0.0));
    }

    #[test]
    fn test_directed() {
        let table = DistanceTable::new().directed().with_distance(0, 1, 4.0);
        assert_eq!(table.query(1, 0, BUDGET), None);
    }

    #[test]
    fn test_euclidean_points_and_map_bounds() {
        let mut table = DistanceTable::new()
            .with_point(0, [0.0, 0.0])
            .with_point(1, [3.0, 4.0])
            .with_point(2, [50.0, 0.0]);
        assert_eq!(table.query(0, 1, BUDGET), Some(5.0));

        table.set_map(&MapDescription::new([0.0, 0.0], [10.0, 10.0]));
        assert!(table.map().is_some());
        assert_eq!(table.query(0, 1, BUDGET), Some(5.0));
        // outside the workspace
        assert_eq!(table.query(0, 2, BUDGET), None);
    }
}
