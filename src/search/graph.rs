//! Arena-backed search graph with duplicate detection.

use std::collections::HashMap;

use super::node::{Node, NodeId};
use super::SearchState;

/// All nodes generated by a search, indexed by id and by state key.
///
/// Parent and child links are [`NodeId`]s into the arena, so re-parenting a
/// node after a cheaper path is found never moves it.
#[derive(Debug, Clone)]
pub struct SearchGraph<S: SearchState> {
    nodes: Vec<Node<S>>,
    index: HashMap<S::Key, NodeId>,
}

impl<S: SearchState> Default for SearchGraph<S> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<S: SearchState> SearchGraph<S> {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node by id.
    pub fn node(&self, id: NodeId) -> &Node<S> {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node<S> {
        &mut self.nodes[id.0]
    }

    /// Node by id, if it exists.
    pub fn get(&self, id: NodeId) -> Option<&Node<S>> {
        self.nodes.get(id.0)
    }

    /// Node id for a state key.
    pub fn find(&self, key: &S::Key) -> Option<NodeId> {
        self.index.get(key).copied()
    }

    /// Iterates all nodes in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node<S>> {
        self.nodes.iter()
    }

    /// Adds a node; the key must not already be present.
    pub(crate) fn insert(&mut self, state: S, g: f64, h: f64, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        let key = state.key();
        let depth = parent.map_or(0, |p| self.nodes[p.0].depth + 1);
        self.nodes.push(Node {
            id,
            state,
            key: key.clone(),
            g,
            h,
            parent,
            children: Vec::new(),
            depth,
            expanded: false,
        });
        self.index.insert(key, id);
        if let Some(p) = parent {
            self.nodes[p.0].children.push(id);
        }
        id
    }

    /// Moves `child` under `parent` with a cheaper path cost.
    pub(crate) fn reparent(&mut self, child: NodeId, parent: NodeId, g: f64) {
        if let Some(old) = self.nodes[child.0].parent {
            self.nodes[old.0].children.retain(|c| *c != child);
        }
        let depth = self.nodes[parent.0].depth + 1;
        let node = &mut self.nodes[child.0];
        node.parent = Some(parent);
        node.g = g;
        node.depth = depth;
        node.expanded = false;
        self.nodes[parent.0].children.push(child);
    }

    /// Node ids from the root to `id` (inclusive).
    pub fn path_to(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = vec![id];
        let mut cursor = self.nodes[id.0].parent;
        while let Some(p) = cursor {
            path.push(p);
            cursor = self.nodes[p.0].parent;
        }
        path.reverse();
        path
    }

    /// States from the root to `id` (inclusive).
    pub fn states_to(&self, id: NodeId) -> Vec<&S> {
        self.path_to(id)
            .into_iter()
            .map(|n| &self.nodes[n.0].state)
            .collect()
    }
}
