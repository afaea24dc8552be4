//! Search graph nodes.

use std::fmt;

use super::SearchState;

/// Index of a node in its [`SearchGraph`](super::SearchGraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Raw index.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A node of the search graph.
#[derive(Debug, Clone)]
pub struct Node<S: SearchState> {
    /// This node's id.
    pub id: NodeId,
    /// State payload.
    pub state: S,
    /// Identity key of `state`.
    pub key: S::Key,
    /// Best known path cost from the root.
    pub g: f64,
    /// Heuristic estimate to a goal.
    pub h: f64,
    /// Parent on the best known path (`None` for the root).
    pub parent: Option<NodeId>,
    /// Nodes generated from this one.
    pub children: Vec<NodeId>,
    /// Edges from the root on the best known path.
    pub depth: usize,
    /// Whether successors have been generated since `g` last improved.
    pub expanded: bool,
}

impl<S: SearchState> Node<S> {
    /// `g + h`.
    #[inline]
    pub fn f(&self) -> f64 {
        self.g + self.h
    }

    /// Whether this is the root.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}
