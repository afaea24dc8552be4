//! Trait vectors.
//!
//! A trait is a scalar capability dimension shared by robots and action
//! requirements (payload, speed, sensor range, ...). Index meaning is
//! defined by the problem; every vector in a problem has the same length.
//!
//! # Comparison Semantics
//!
//! Dominance is component-wise `>=` with plain floating-point comparison.
//! No epsilon is applied, so boundary cases follow IEEE-754 rounding:
//! `0.1 + 0.2` meets a requirement of `0.3`, while `0.7 + 0.1` does not
//! meet `0.8`.

use serde::{Deserialize, Serialize};

/// An ordered, fixed-length vector of trait values.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraitVector(Vec<f64>);

impl TraitVector {
    /// Creates a trait vector from raw values.
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    /// Creates an all-zero vector of the given dimension.
    pub fn zeros(dimension: usize) -> Self {
        Self(vec![0.0; dimension])
    }

    /// Number of trait dimensions.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the vector has no dimensions.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Raw values.
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.0
    }

    /// Value of one dimension.
    #[inline]
    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied()
    }

    /// Whether every component is `>=` the matching component of `other`.
    pub fn dominates(&self, other: &TraitVector) -> bool {
        self.0.len() == other.0.len() && self.0.iter().zip(&other.0).all(|(a, b)| a >= b)
    }

    /// Whether every component is zero.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|v| *v == 0.0)
    }

    /// Adds `other * factor` into this vector in place.
    pub fn add_scaled(&mut self, other: &TraitVector, factor: f64) {
        for (a, b) in self.0.iter_mut().zip(&other.0) {
            *a += b * factor;
        }
    }

    /// Returns `self + other`.
    pub fn plus(&self, other: &TraitVector) -> TraitVector {
        let mut sum = self.clone();
        sum.add_scaled(other, 1.0);
        sum
    }

    /// Component-wise `max(0, requirement - self)`.
    pub fn deficit_to(&self, requirement: &TraitVector) -> TraitVector {
        TraitVector(
            requirement
                .0
                .iter()
                .zip(&self.0)
                .map(|(req, have)| (req - have).max(0.0))
                .collect(),
        )
    }

    /// Sum of all components.
    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }

    /// Whether adding `contribution` reduces at least one positive component
    /// of `deficit`.
    pub fn reduces(contribution: &TraitVector, deficit: &TraitVector) -> bool {
        contribution
            .0
            .iter()
            .zip(&deficit.0)
            .any(|(c, d)| *d > 0.0 && *c > 0.0)
    }
}

impl From<Vec<f64>> for TraitVector {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

impl<const N: usize> From<[f64; N]> for TraitVector {
    fn from(values: [f64; N]) -> Self {
        Self(values.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dominates_componentwise() {
        let a = TraitVector::from([1.0, 2.0]);
        assert!(a.dominates(&TraitVector::from([1.0, 2.0])));
        assert!(a.dominates(&TraitVector::from([0.5, 0.0])));
        assert!(!a.dominates(&TraitVector::from([1.5, 0.0])));
    }

    #[test]
    fn test_dominates_dimension_mismatch() {
        let a = TraitVector::from([1.0, 2.0]);
        assert!(!a.dominates(&TraitVector::from([1.0])));
    }

    #[test]
    fn test_deficit() {
        let have = TraitVector::from([1.0, 5.0]);
        let req = TraitVector::from([3.0, 2.0]);
        assert_eq!(have.deficit_to(&req), TraitVector::from([2.0, 0.0]));
        assert_eq!(have.deficit_to(&req).sum(), 2.0);
    }

    #[test]
    fn test_exact_float_boundary_has_no_tolerance() {
        // 0.1 + 0.2 lands just above 0.3, so it dominates.
        let mut sum = TraitVector::from([0.1]);
        sum.add_scaled(&TraitVector::from([0.2]), 1.0);
        assert!(sum.dominates(&TraitVector::from([0.3])));

        // 0.7 + 0.1 lands just below 0.8, so it does not.
        let mut sum = TraitVector::from([0.7]);
        sum.add_scaled(&TraitVector::from([0.1]), 1.0);
        assert!(!sum.dominates(&TraitVector::from([0.8])));
    }

    #[test]
    fn test_reduces() {
        let deficit = TraitVector::from([0.0, 1.0]);
        assert!(TraitVector::reduces(&TraitVector::from([0.0, 2.0]), &deficit));
        assert!(!TraitVector::reduces(&TraitVector::from([3.0, 0.0]), &deficit));
    }
}
