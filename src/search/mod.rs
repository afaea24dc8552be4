//! Generic best-first search.
//!
//! The search engine is domain-agnostic: a problem plugs in through four
//! traits and the engine owns the node graph, open set and counters.
//!
//! | Trait | Role |
//! |-------|------|
//! | [`SearchState`] | State with a hashable identity key |
//! | [`NodeExpander`] | Generates successors with edge costs |
//! | [`Heuristic`] | Estimates remaining cost |
//! | [`GoalLocator`] | Tests for goal states |
//! | [`SearchResultPackager`] | Turns the finished graph into a result |
//!
//! Plain closures implement [`Heuristic`], [`GoalLocator`] and
//! [`NodeExpander`], which keeps small searches and tests short.
//!
//! # Reference
//! Hart, Nilsson & Raphael (1968), "A Formal Basis for the Heuristic
//! Determination of Minimum Cost Paths"

mod astar;
mod graph;
mod node;

pub use astar::{AStarSearch, SearchLimits, SearchStats, SearchStatus};
pub use graph::SearchGraph;
pub use node::{Node, NodeId};

use std::fmt::Debug;
use std::hash::Hash;

/// A search state with an identity key.
///
/// Two states with equal keys are the same node of the search graph.
pub trait SearchState: Clone {
    /// Identity key.
    type Key: Hash + Eq + Clone + Debug;

    /// Returns this state's key.
    fn key(&self) -> Self::Key;
}

/// A generated successor and the cost of the edge leading to it.
#[derive(Debug, Clone)]
pub struct Successor<S> {
    /// Child state.
    pub state: S,
    /// Edge cost (non-negative).
    pub cost: f64,
}

impl<S> Successor<S> {
    /// Creates a successor.
    pub fn new(state: S, cost: f64) -> Self {
        Self { state, cost }
    }
}

/// Generates the successors of a state.
pub trait NodeExpander<S> {
    /// Returns every child of `state` with its edge cost.
    fn expand(&mut self, state: &S) -> Vec<Successor<S>>;
}

impl<S, F> NodeExpander<S> for F
where
    F: FnMut(&S) -> Vec<Successor<S>>,
{
    fn expand(&mut self, state: &S) -> Vec<Successor<S>> {
        self(state)
    }
}

/// Estimates the remaining cost from a state to a goal.
pub trait Heuristic<S> {
    /// Non-negative estimate.
    fn estimate(&self, state: &S) -> f64;
}

impl<S, F> Heuristic<S> for F
where
    F: Fn(&S) -> f64,
{
    fn estimate(&self, state: &S) -> f64 {
        self(state)
    }
}

/// Decides whether a state is a goal.
pub trait GoalLocator<S> {
    /// Whether `state` satisfies the goal.
    fn is_goal(&self, state: &S) -> bool;
}

impl<S, F> GoalLocator<S> for F
where
    F: Fn(&S) -> bool,
{
    fn is_goal(&self, state: &S) -> bool {
        self(state)
    }
}

/// Builds a result from a finished (or interrupted) search.
pub trait SearchResultPackager<S: SearchState> {
    /// Packaged result.
    type Output;

    /// Packages the result. `target` is the goal node, or the most promising
    /// node when no goal was found.
    fn package(
        &self,
        graph: &SearchGraph<S>,
        target: Option<NodeId>,
        status: SearchStatus,
        stats: &SearchStats,
    ) -> Self::Output;
}
