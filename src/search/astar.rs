//! A* search engine.
//!
//! # Algorithm
//!
//! 1. Pop the open node with the lowest `f = g + h` (FIFO among ties)
//! 2. If it is a goal, record it and return
//! 3. Otherwise expand it; for each child:
//!    - unknown key: add a node and push it
//!    - known key with `g <= new g`: discard
//!    - known key with a worse `g`: re-parent it and push again
//!
//! Entries made stale by a re-parent are skipped when popped. The search is
//! re-entrant: calling [`AStarSearch::search`] again after a goal resumes
//! from the current open set, which is how callers obtain further goals.
//!
//! # Complexity
//! O(E log V) heap operations for E generated edges and V distinct states.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::graph::SearchGraph;
use super::node::NodeId;
use super::{GoalLocator, Heuristic, NodeExpander, SearchResultPackager, SearchState};

/// Why a call to [`AStarSearch::search`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchStatus {
    /// A goal node was popped.
    GoalFound,
    /// The open set is empty.
    Exhausted,
    /// The expansion limit or deadline was hit.
    LimitReached,
}

/// Cumulative search counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Nodes whose successors were generated.
    pub nodes_expanded: u64,
    /// Distinct states added to the graph (including the root).
    pub nodes_visited: u64,
    /// Known states reached again by a cheaper path.
    pub nodes_reopened: u64,
    /// Goals popped so far.
    pub goals_found: u64,
}

/// Stopping limits for one call to [`AStarSearch::search`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchLimits {
    /// Stop once this many nodes have been expanded in total.
    pub max_expansions: Option<u64>,
    /// Stop once this instant has passed.
    pub deadline: Option<Instant>,
}

impl SearchLimits {
    /// No limits.
    pub fn none() -> Self {
        Self::default()
    }

    /// Sets the expansion limit.
    pub fn with_max_expansions(mut self, max: u64) -> Self {
        self.max_expansions = Some(max);
        self
    }

    /// Sets the deadline.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    fn reached(&self, stats: &SearchStats) -> bool {
        self.max_expansions
            .is_some_and(|max| stats.nodes_expanded >= max)
            || self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

#[derive(Debug, Clone, Copy)]
struct OpenEntry {
    f: f64,
    g: f64,
    seq: u64,
    node: NodeId,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    // BinaryHeap is a max-heap: lowest f, then oldest entry, compares greatest.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Re-entrant A* search.
///
/// # Example
///
/// ```
/// use u_allocation::search::{AStarSearch, SearchLimits, SearchState, SearchStatus, Successor};
///
/// #[derive(Clone)]
/// struct Pos(u32);
/// impl SearchState for Pos {
///     type Key = u32;
///     fn key(&self) -> u32 { self.0 }
/// }
///
/// let expand = |p: &Pos| vec![Successor::new(Pos(p.0 + 1), 1.0), Successor::new(Pos(p.0 + 2), 3.0)];
/// let h = |p: &Pos| 4u32.saturating_sub(p.0) as f64;
/// let goal = |p: &Pos| p.0 == 4;
///
/// let mut search = AStarSearch::new(Pos(0), expand, h, goal);
/// assert_eq!(search.search(SearchLimits::none()), SearchStatus::GoalFound);
/// let goal = search.goal().unwrap();
/// assert_eq!(search.graph().node(goal).g, 4.0);
/// ```
pub struct AStarSearch<S, E, H, G>
where
    S: SearchState,
{
    graph: SearchGraph<S>,
    open: BinaryHeap<OpenEntry>,
    expander: E,
    heuristic: H,
    goal_locator: G,
    stats: SearchStats,
    seq: u64,
    goal: Option<NodeId>,
    status: Option<SearchStatus>,
}

impl<S, E, H, G> AStarSearch<S, E, H, G>
where
    S: SearchState,
    E: NodeExpander<S>,
    H: Heuristic<S>,
    G: GoalLocator<S>,
{
    /// Creates a search rooted at `root`.
    pub fn new(root: S, expander: E, heuristic: H, goal_locator: G) -> Self {
        let mut search = Self {
            graph: SearchGraph::new(),
            open: BinaryHeap::new(),
            expander,
            heuristic,
            goal_locator,
            stats: SearchStats::default(),
            seq: 0,
            goal: None,
            status: None,
        };
        let h = search.heuristic.estimate(&root);
        let id = search.graph.insert(root, 0.0, h, None);
        search.stats.nodes_visited = 1;
        search.push(id);
        search
    }

    /// Runs until a goal is popped, the open set empties, or a limit is hit.
    pub fn search(&mut self, limits: SearchLimits) -> SearchStatus {
        let status = self.run(limits);
        self.status = Some(status);
        status
    }

    fn run(&mut self, limits: SearchLimits) -> SearchStatus {
        loop {
            if limits.reached(&self.stats) {
                return SearchStatus::LimitReached;
            }
            let Some(entry) = self.open.pop() else {
                return SearchStatus::Exhausted;
            };
            let node = self.graph.node(entry.node);
            if node.expanded || entry.g > node.g {
                continue;
            }

            if self.goal_locator.is_goal(&node.state) {
                self.graph.node_mut(entry.node).expanded = true;
                self.goal = Some(entry.node);
                self.stats.goals_found += 1;
                trace!(node = %entry.node, g = entry.g, "goal popped");
                return SearchStatus::GoalFound;
            }

            self.expand(entry.node);
        }
    }

    fn expand(&mut self, id: NodeId) {
        let (children, g) = {
            let node = self.graph.node(id);
            (self.expander.expand(&node.state), node.g)
        };
        self.graph.node_mut(id).expanded = true;
        self.stats.nodes_expanded += 1;

        for child in children {
            let child_g = g + child.cost.max(0.0);
            match self.graph.find(&child.state.key()) {
                Some(existing) => {
                    if self.graph.node(existing).g <= child_g {
                        continue;
                    }
                    self.graph.reparent(existing, id, child_g);
                    self.stats.nodes_reopened += 1;
                    self.push(existing);
                }
                None => {
                    let h = self.heuristic.estimate(&child.state);
                    let new_id = self.graph.insert(child.state, child_g, h, Some(id));
                    self.stats.nodes_visited += 1;
                    self.push(new_id);
                }
            }
        }
    }

    fn push(&mut self, id: NodeId) {
        let node = self.graph.node(id);
        self.open.push(OpenEntry {
            f: node.f(),
            g: node.g,
            seq: self.seq,
            node: id,
        });
        self.seq += 1;
    }

    /// Most recently found goal.
    pub fn goal(&self) -> Option<NodeId> {
        self.goal
    }

    /// Status of the last call to [`search`](Self::search).
    pub fn status(&self) -> Option<SearchStatus> {
        self.status
    }

    /// The goal if one was found, else the node with the lowest `h`
    /// (ties broken by lower `g`).
    pub fn snapshot(&self) -> Option<NodeId> {
        if self.goal.is_some() {
            return self.goal;
        }
        self.graph
            .nodes()
            .min_by(|a, b| a.h.total_cmp(&b.h).then(a.g.total_cmp(&b.g)))
            .map(|n| n.id)
    }

    /// The search graph.
    pub fn graph(&self) -> &SearchGraph<S> {
        &self.graph
    }

    /// The node expander.
    pub fn expander(&self) -> &E {
        &self.expander
    }

    /// Cumulative counters.
    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    /// Entries left in the open set (including stale ones).
    pub fn open_len(&self) -> usize {
        self.open.len()
    }

    /// Hands the graph and the [`snapshot`](Self::snapshot) node to a packager.
    pub fn package<P: SearchResultPackager<S>>(&self, packager: &P) -> P::Output {
        packager.package(
            &self.graph,
            self.snapshot(),
            self.status.unwrap_or(SearchStatus::LimitReached),
            &self.stats,
        )
    }
}
