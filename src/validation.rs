//! Input validation for allocation problems.
//!
//! Checks structural integrity of species, actions, and precedence
//! constraints before search. Detects:
//! - Trait vectors whose length differs from the problem's dimension
//! - Orderings that reference unknown actions or self-loops
//! - Circular precedence dependencies (DAG validation)
//! - Negative or non-finite durations, zero-count species
//! - Duplicate action names
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4 (Topological Sort)

use std::collections::HashSet;

use crate::models::AllocationProblem;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// The problem has no species or no actions.
    EmptyProblem,
    /// A trait vector has the wrong number of dimensions.
    DimensionMismatch,
    /// Two actions share the same non-empty name.
    DuplicateName,
    /// An ordering references an action that doesn't exist.
    InvalidActionReference,
    /// Precedence graph contains a cycle.
    CyclicDependency,
    /// An action duration is negative or not finite.
    InvalidDuration,
    /// A species has zero robots.
    InvalidSpeciesCount,
    /// Start locations are given but not one per species.
    InvalidStartLocations,
    /// The speed index is outside the trait dimension.
    InvalidSpeedIndex,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates an allocation problem.
///
/// Checks:
/// 1. At least one species and one action
/// 2. Every trait vector has the problem's dimension
/// 3. Species counts are positive
/// 4. Durations are finite and non-negative
/// 5. No duplicate action names
/// 6. Orderings reference existing, distinct actions
/// 7. No circular precedence dependencies
/// 8. Start locations (if any) cover every species; speed index is in range
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_problem(problem: &AllocationProblem) -> ValidationResult {
    let mut errors = Vec::new();

    if problem.species.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyProblem,
            "Problem has no robot species",
        ));
    }
    if problem.actions.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyProblem,
            "Problem has no actions",
        ));
    }

    let dim = problem.trait_dimension();

    for (i, species) in problem.species.iter().enumerate() {
        if species.traits.len() != dim {
            errors.push(ValidationError::new(
                ValidationErrorKind::DimensionMismatch,
                format!(
                    "Species {i} has {} traits, expected {dim}",
                    species.traits.len()
                ),
            ));
        }
        if species.count == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidSpeciesCount,
                format!("Species {i} has zero robots"),
            ));
        }
    }

    let mut names = HashSet::new();
    for (i, action) in problem.actions.iter().enumerate() {
        if action.cumulative.len() != dim || action.noncumulative.len() != dim {
            errors.push(ValidationError::new(
                ValidationErrorKind::DimensionMismatch,
                format!(
                    "Action {i} has {}/{} cumulative/cutoff traits, expected {dim}",
                    action.cumulative.len(),
                    action.noncumulative.len()
                ),
            ));
        }
        if !action.duration.is_finite() || action.duration < 0.0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidDuration,
                format!("Action {i} has invalid duration {}", action.duration),
            ));
        }
        if !action.name.is_empty() && !names.insert(action.name.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateName,
                format!("Duplicate action name: {}", action.name),
            ));
        }
    }

    let n = problem.action_count();
    let mut references_ok = true;
    for ordering in &problem.orderings {
        if ordering.before >= n || ordering.after >= n {
            references_ok = false;
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidActionReference,
                format!(
                    "Ordering {} -> {} references an unknown action",
                    ordering.before, ordering.after
                ),
            ));
        } else if ordering.before == ordering.after {
            errors.push(ValidationError::new(
                ValidationErrorKind::CyclicDependency,
                format!("Action {} is ordered before itself", ordering.before),
            ));
        }
    }

    // Cycle detection needs valid indices
    if references_ok {
        if let Some(cycle_err) = detect_cycles(problem) {
            errors.push(cycle_err);
        }
    }

    if problem.has_locations() && problem.start_locations.len() != problem.species_count() {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidStartLocations,
            format!(
                "{} start locations for {} species",
                problem.start_locations.len(),
                problem.species_count()
            ),
        ));
    }

    if let Some(index) = problem.speed_index {
        if index >= dim {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidSpeedIndex,
                format!("Speed index {index} outside trait dimension {dim}"),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Detects cycles in the precedence graph using DFS.
///
/// # Algorithm
/// Topological sort via DFS. If a back-edge is found (visiting a node
/// currently in the recursion stack), a cycle exists.
fn detect_cycles(problem: &AllocationProblem) -> Option<ValidationError> {
    let n = problem.action_count();
    let mut adj: Vec<Vec<usize>> = vec![Vec::new(); n];
    for ordering in &problem.orderings {
        if ordering.before != ordering.after {
            adj[ordering.before].push(ordering.after);
        }
    }

    let mut visited = vec![false; n];
    let mut in_stack = vec![false; n];

    for node in 0..n {
        if !visited[node] && has_cycle_dfs(node, &adj, &mut visited, &mut in_stack) {
            return Some(ValidationError::new(
                ValidationErrorKind::CyclicDependency,
                format!("Circular dependency detected involving action {node}"),
            ));
        }
    }

    None
}

fn has_cycle_dfs(
    node: usize,
    adj: &[Vec<usize>],
    visited: &mut [bool],
    in_stack: &mut [bool],
) -> bool {
    visited[node] = true;
    in_stack[node] = true;

    for &next in &adj[node] {
        if in_stack[next] {
            return true; // Back edge → cycle
        }
        if !visited[next] && has_cycle_dfs(next, adj, visited, in_stack) {
            return true;
        }
    }

    in_stack[node] = false;
    false
}
