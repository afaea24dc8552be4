//! Temporal network over action intervals.
//!
//! Each action owns a start and an end time-point. Time 0 acts as the
//! source and the makespan as the sink. Edges are:
//! - **Duration**: `end(i) = start(i) + duration(i)`
//! - **Precedence**: `end(before) <= start(after)`
//! - **Disjunct**: one of two precedence directions between a pair of
//!   actions, selected by a bit of the [`DisjunctId`]
//!
//! Times are earliest times: `start(i)` is the maximum end over all active
//! predecessors. The network is feasible iff the active precedence graph is
//! acyclic, which is the negative-cycle condition of the equivalent distance
//! graph (all durations are non-negative).
//!
//! # Incremental propagation
//!
//! Edits re-propagate only the region reachable from the edited node. Any
//! cycle an edit introduces passes through that region, so cycle detection
//! is local as well. After an infeasible state the next edit falls back to
//! a full pass.
//!
//! # Reference
//! Dechter, Meiri & Pearl (1991), "Temporal constraint networks"

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::ScheduleError;
use crate::models::{OrderingConstraint, Schedule, ScheduledAction};

/// A resource-contention pair: the two actions must not overlap, in
/// whichever order the network's [`DisjunctId`] selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Disjunct {
    /// Runs first when the bit is `false`.
    pub first: usize,
    /// Runs first when the bit is `true`.
    pub second: usize,
}

impl Disjunct {
    /// Creates a disjunct between two actions.
    pub fn new(first: usize, second: usize) -> Self {
        Self { first, second }
    }

    /// Active precedence `(from, to)` for an orientation bit.
    #[inline]
    pub fn edge(&self, flipped: bool) -> (usize, usize) {
        if flipped {
            (self.second, self.first)
        } else {
            (self.first, self.second)
        }
    }
}

/// One bit per disjunct: `false` = `first -> second`, `true` = `second -> first`.
///
/// Used as the key of tabu memory and the makespan cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisjunctId(Vec<bool>);

impl DisjunctId {
    /// Creates an identifier from raw bits.
    pub fn new(bits: Vec<bool>) -> Self {
        Self(bits)
    }

    /// All-`false` identifier of the given length.
    pub fn zeros(len: usize) -> Self {
        Self(vec![false; len])
    }

    /// Number of bits.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no bits.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Bit `k`.
    #[inline]
    pub fn get(&self, k: usize) -> bool {
        self.0[k]
    }

    /// Raw bits.
    pub fn bits(&self) -> &[bool] {
        &self.0
    }

    /// Copy with bit `k` inverted.
    pub fn flipped(&self, k: usize) -> Self {
        let mut bits = self.0.clone();
        bits[k] = !bits[k];
        Self(bits)
    }

    fn toggle(&mut self, k: usize) {
        self.0[k] = !self.0[k];
    }
}

impl fmt::Display for DisjunctId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in &self.0 {
            f.write_str(if *bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Scheduling state of one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionState {
    /// The network has not been built.
    Unscheduled,
    /// Times are bounded but contention pairs touching the action are unresolved.
    TimeBounded,
    /// All contention pairs are fixed; times are final.
    Resolved,
    /// The network contains a cycle.
    Infeasible,
    /// The action was removed (tombstoned).
    Removed,
}

#[derive(Debug, Clone)]
enum Edit {
    AddOrdering(usize, usize),
    RemoveOrdering(usize, usize),
    Duration { action: usize, delta: f64 },
    AddAction(usize),
    RemoveAction {
        action: usize,
        predecessors: Vec<usize>,
        successors: Vec<usize>,
    },
    Switch(usize),
    SetDisjuncts(DisjunctId),
}

/// Temporal network with incremental propagation.
///
/// # Example
///
/// ```
/// use u_allocation::models::OrderingConstraint;
/// use u_allocation::temporal::TemporalNetwork;
///
/// let orderings = [(0, 3), (0, 1), (2, 1)].map(OrderingConstraint::from);
/// let mut net = TemporalNetwork::from_orderings(&[10.0, 2.0, 5.0, 3.0], &orderings).unwrap();
/// assert_eq!(net.makespan(), Some(13.0));
///
/// net.remove_ordering(0, 3).unwrap();
/// assert_eq!(net.makespan(), Some(12.0));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TemporalNetwork {
    durations: Vec<f64>,
    live: Vec<bool>,
    successors: Vec<Vec<usize>>,
    predecessors: Vec<Vec<usize>>,
    disjuncts: Vec<Disjunct>,
    disjuncts_of: Vec<Vec<usize>>,
    orientation: DisjunctId,
    start: Vec<f64>,
    end: Vec<f64>,
    feasible: bool,
    built: bool,
    resolved: bool,
    last_edit: Option<Edit>,
}

impl TemporalNetwork {
    /// Creates an empty, unbuilt network.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a network from durations and precedence constraints.
    pub fn from_orderings(
        durations: &[f64],
        orderings: &[OrderingConstraint],
    ) -> Result<Self, ScheduleError> {
        let mut net = Self::new();
        net.build(durations, orderings)?;
        Ok(net)
    }

    /// (Re)builds the network and propagates earliest times.
    ///
    /// Returns whether the result is temporally feasible.
    pub fn build(
        &mut self,
        durations: &[f64],
        orderings: &[OrderingConstraint],
    ) -> Result<bool, ScheduleError> {
        self.build_with_disjuncts(durations, orderings, Vec::new(), DisjunctId::default())
    }

    /// (Re)builds the network with contention pairs in the given orientation.
    pub fn build_with_disjuncts(
        &mut self,
        durations: &[f64],
        orderings: &[OrderingConstraint],
        disjuncts: Vec<Disjunct>,
        orientation: DisjunctId,
    ) -> Result<bool, ScheduleError> {
        for (action, &duration) in durations.iter().enumerate() {
            check_duration(action, duration)?;
        }
        let n = durations.len();
        for o in orderings {
            for index in [o.before, o.after] {
                if index >= n {
                    return Err(ScheduleError::UnknownAction(index));
                }
            }
        }

        *self = Self {
            durations: durations.to_vec(),
            live: vec![true; n],
            successors: vec![Vec::new(); n],
            predecessors: vec![Vec::new(); n],
            start: vec![0.0; n],
            end: vec![0.0; n],
            disjuncts_of: vec![Vec::new(); n],
            built: true,
            ..Self::default()
        };
        for o in orderings {
            self.successors[o.before].push(o.after);
            self.predecessors[o.after].push(o.before);
        }
        self.install_disjuncts(disjuncts, orientation)?;
        self.propagate_all();
        Ok(self.feasible)
    }

    /// Replaces all contention pairs and their orientation, then re-propagates.
    pub fn set_disjuncts(
        &mut self,
        disjuncts: Vec<Disjunct>,
        orientation: DisjunctId,
    ) -> Result<bool, ScheduleError> {
        self.install_disjuncts(disjuncts, orientation)?;
        self.last_edit = None;
        self.propagate_all();
        Ok(self.feasible)
    }

    fn install_disjuncts(
        &mut self,
        disjuncts: Vec<Disjunct>,
        orientation: DisjunctId,
    ) -> Result<(), ScheduleError> {
        if orientation.len() != disjuncts.len() {
            return Err(ScheduleError::DisjunctLength {
                expected: disjuncts.len(),
                actual: orientation.len(),
            });
        }
        let n = self.durations.len();
        for d in &disjuncts {
            for index in [d.first, d.second] {
                if index >= n {
                    return Err(ScheduleError::UnknownAction(index));
                }
            }
        }
        self.disjuncts_of = vec![Vec::new(); n];
        for (k, d) in disjuncts.iter().enumerate() {
            self.disjuncts_of[d.first].push(k);
            if d.second != d.first {
                self.disjuncts_of[d.second].push(k);
            }
        }
        self.resolved = disjuncts.is_empty();
        self.disjuncts = disjuncts;
        self.orientation = orientation;
        Ok(())
    }

    // ---- queries -------------------------------------------------------

    /// Whether the network has no cycle.
    #[inline]
    pub fn is_feasible(&self) -> bool {
        self.built && self.feasible
    }

    /// Latest end time over live actions; `None` when infeasible or unbuilt.
    pub fn makespan(&self) -> Option<f64> {
        if !self.is_feasible() {
            return None;
        }
        Some(
            (0..self.durations.len())
                .filter(|&i| self.live[i])
                .map(|i| self.end[i])
                .fold(0.0, f64::max),
        )
    }

    /// Number of time-point pairs, including removed actions.
    #[inline]
    pub fn action_count(&self) -> usize {
        self.durations.len()
    }

    /// Number of live actions.
    pub fn live_action_count(&self) -> usize {
        self.live.iter().filter(|l| **l).count()
    }

    /// Whether `action` exists and has not been removed.
    pub fn is_live(&self, action: usize) -> bool {
        self.live.get(action).copied().unwrap_or(false)
    }

    /// Current duration of an action.
    pub fn duration(&self, action: usize) -> Option<f64> {
        self.is_live(action).then(|| self.durations[action])
    }

    /// Earliest `(start, end)` of an action; `None` if removed or infeasible.
    pub fn times(&self, action: usize) -> Option<(f64, f64)> {
        (self.is_feasible() && self.is_live(action)).then(|| (self.start[action], self.end[action]))
    }

    /// Scheduling state of an action.
    pub fn action_state(&self, action: usize) -> ActionState {
        if !self.is_live(action) {
            ActionState::Removed
        } else if !self.built {
            ActionState::Unscheduled
        } else if !self.feasible {
            ActionState::Infeasible
        } else if !self.resolved && !self.disjuncts_of[action].is_empty() {
            ActionState::TimeBounded
        } else {
            ActionState::Resolved
        }
    }

    /// Marks the current contention orientation as final.
    pub fn mark_resolved(&mut self) {
        self.resolved = true;
    }

    /// Whether the orientation has been marked final.
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// The schedule of live actions; `None` when infeasible.
    pub fn schedule(&self) -> Option<Schedule> {
        if !self.is_feasible() {
            return None;
        }
        let mut schedule = Schedule::new();
        for i in (0..self.durations.len()).filter(|&i| self.live[i]) {
            schedule.push(ScheduledAction::new(i, self.start[i], self.end[i]));
        }
        Some(schedule)
    }

    /// Current orientation of every contention pair.
    pub fn disjunct_id(&self) -> &DisjunctId {
        &self.orientation
    }

    /// Number of contention pairs.
    pub fn disjunct_count(&self) -> usize {
        self.disjuncts.len()
    }

    /// The contention pairs.
    pub fn disjuncts(&self) -> &[Disjunct] {
        &self.disjuncts
    }

    /// Live actions in a topological order of the active precedence graph.
    ///
    /// Returns `None` when the graph has a cycle.
    pub fn topological_order(&self) -> Option<Vec<usize>> {
        let n = self.durations.len();
        let mut indegree = vec![0usize; n];
        for v in (0..n).filter(|&v| self.live[v]) {
            indegree[v] = self.preds(v).count();
        }
        let mut queue: VecDeque<usize> = (0..n)
            .filter(|&v| self.live[v] && indegree[v] == 0)
            .collect();
        let mut order = Vec::with_capacity(n);
        while let Some(v) = queue.pop_front() {
            order.push(v);
            for s in self.succs(v) {
                indegree[s] -= 1;
                if indegree[s] == 0 {
                    queue.push_back(s);
                }
            }
        }
        (order.len() == self.live_action_count()).then_some(order)
    }

    /// Whether precedence constraints alone (ignoring contention pairs)
    /// force `from` to finish before `to` starts.
    pub fn precedence_reaches(&self, from: usize, to: usize) -> bool {
        if !self.is_live(from) || !self.is_live(to) {
            return false;
        }
        let mut seen = vec![false; self.durations.len()];
        let mut stack = vec![from];
        while let Some(v) = stack.pop() {
            for &s in &self.successors[v] {
                if s == to {
                    return true;
                }
                if self.live[s] && !seen[s] {
                    seen[s] = true;
                    stack.push(s);
                }
            }
        }
        false
    }

    /// Latest `(start, end)` per action that keeps the current makespan.
    ///
    /// Entries for removed actions are meaningless. `None` when infeasible.
    pub fn latest_times(&self) -> Option<Vec<(f64, f64)>> {
        let makespan = self.makespan()?;
        let order = self.topological_order()?;
        let n = self.durations.len();
        let mut latest = vec![(makespan, makespan); n];
        for &v in order.iter().rev() {
            let latest_end = self.succs(v).map(|s| latest[s].0).fold(makespan, f64::min);
            latest[v] = (latest_end - self.durations[v], latest_end);
        }
        Some(latest)
    }

    /// How far an action can slip without extending the makespan.
    pub fn slack(&self, action: usize) -> Option<f64> {
        let (start, _) = self.times(action)?;
        let latest = self.latest_times()?;
        Some(latest[action].0 - start)
    }

    /// Live actions with zero slack (the critical path).
    pub fn critical_actions(&self) -> Vec<usize> {
        let Some(latest) = self.latest_times() else {
            return Vec::new();
        };
        let scale = self.makespan().unwrap_or(0.0).max(1.0);
        (0..self.durations.len())
            .filter(|&i| self.live[i] && latest[i].0 - self.start[i] <= 1e-9 * scale)
            .collect()
    }

    // ---- edits ---------------------------------------------------------

    /// Adds `before -> after` and re-propagates from `after`.
    ///
    /// Returns whether the network is still feasible.
    pub fn add_ordering(&mut self, before: usize, after: usize) -> Result<bool, ScheduleError> {
        self.check_live(before)?;
        self.check_live(after)?;
        self.insert_ordering(before, after);
        self.last_edit = Some(Edit::AddOrdering(before, after));
        Ok(self.feasible)
    }

    /// Removes one `before -> after` constraint and re-propagates from `after`.
    pub fn remove_ordering(&mut self, before: usize, after: usize) -> Result<bool, ScheduleError> {
        self.check_live(before)?;
        self.check_live(after)?;
        if !self.successors[before].contains(&after) {
            return Err(ScheduleError::MissingOrdering { before, after });
        }
        self.delete_ordering(before, after);
        self.last_edit = Some(Edit::RemoveOrdering(before, after));
        Ok(self.feasible)
    }

    /// Lengthens an action by `delta`.
    pub fn increase_duration(&mut self, action: usize, delta: f64) -> Result<bool, ScheduleError> {
        self.check_live(action)?;
        check_duration(action, delta)?;
        self.shift_duration(action, delta);
        self.last_edit = Some(Edit::Duration { action, delta });
        Ok(self.feasible)
    }

    /// Shortens an action by `delta` (never below zero).
    pub fn decrease_duration(&mut self, action: usize, delta: f64) -> Result<bool, ScheduleError> {
        self.check_live(action)?;
        check_duration(action, delta)?;
        let applied = -(delta.min(self.durations[action]));
        self.shift_duration(action, applied);
        self.last_edit = Some(Edit::Duration {
            action,
            delta: applied,
        });
        Ok(self.feasible)
    }

    /// Appends an action with precedence links; returns its index.
    ///
    /// `predecessors` must finish before the new action starts;
    /// `successors` start after it ends.
    pub fn add_action(
        &mut self,
        duration: f64,
        predecessors: &[usize],
        successors: &[usize],
    ) -> Result<usize, ScheduleError> {
        let index = self.durations.len();
        check_duration(index, duration)?;
        for &other in predecessors.iter().chain(successors) {
            self.check_live(other)?;
        }
        self.durations.push(duration);
        self.live.push(true);
        self.successors.push(successors.to_vec());
        self.predecessors.push(predecessors.to_vec());
        self.disjuncts_of.push(Vec::new());
        self.start.push(0.0);
        self.end.push(duration);
        for &p in predecessors {
            self.successors[p].push(index);
        }
        for &s in successors {
            self.predecessors[s].push(index);
        }
        self.built = true;
        if self.durations.len() == 1 {
            self.feasible = true;
        }
        self.propagate_from(&[index]);
        self.last_edit = Some(Edit::AddAction(index));
        Ok(index)
    }

    /// Tombstones an action and drops its precedence links.
    ///
    /// Indices of other actions are unchanged. Contention pairs touching the
    /// action become inert.
    pub fn remove_action(&mut self, action: usize) -> Result<bool, ScheduleError> {
        self.check_live(action)?;
        let affected: Vec<usize> = self.succs(action).collect();
        let predecessors = std::mem::take(&mut self.predecessors[action]);
        let successors = std::mem::take(&mut self.successors[action]);
        for &p in &predecessors {
            remove_one(&mut self.successors[p], action);
        }
        for &s in &successors {
            remove_one(&mut self.predecessors[s], action);
        }
        self.live[action] = false;
        self.propagate_from(&affected);
        self.last_edit = Some(Edit::RemoveAction {
            action,
            predecessors,
            successors,
        });
        Ok(self.feasible)
    }

    /// Probes flipping disjunct `k` on a copy; returns the resulting makespan.
    ///
    /// `None` means the flip would make the network infeasible.
    pub fn try_switch(&self, k: usize) -> Result<Option<f64>, ScheduleError> {
        self.check_disjunct(k)?;
        Ok(self.probe_switch(k))
    }

    pub(crate) fn probe_switch(&self, k: usize) -> Option<f64> {
        let mut probe = self.clone();
        probe.toggle_disjunct(k);
        probe.makespan()
    }

    /// Flips disjunct `k` in place.
    pub fn switch(&mut self, k: usize) -> Result<bool, ScheduleError> {
        self.check_disjunct(k)?;
        self.toggle_disjunct(k);
        self.last_edit = Some(Edit::Switch(k));
        Ok(self.feasible)
    }

    /// Applies a full orientation and re-propagates.
    pub fn set_disjunct_id(&mut self, id: DisjunctId) -> Result<bool, ScheduleError> {
        if id.len() != self.disjuncts.len() {
            return Err(ScheduleError::DisjunctLength {
                expected: self.disjuncts.len(),
                actual: id.len(),
            });
        }
        let previous = std::mem::replace(&mut self.orientation, id);
        self.propagate_all();
        self.last_edit = Some(Edit::SetDisjuncts(previous));
        Ok(self.feasible)
    }

    /// Undoes the most recent edit.
    ///
    /// Used by callers that keep exploring after an edit made the network
    /// infeasible. Only one level of undo is kept.
    pub fn revert_last_edit(&mut self) -> Result<bool, ScheduleError> {
        let edit = self.last_edit.take().ok_or(ScheduleError::NothingToRevert)?;
        match edit {
            Edit::AddOrdering(before, after) => self.delete_ordering(before, after),
            Edit::RemoveOrdering(before, after) => self.insert_ordering(before, after),
            Edit::Duration { action, delta } => self.shift_duration(action, -delta),
            Edit::AddAction(index) => self.truncate_action(index),
            Edit::RemoveAction {
                action,
                predecessors,
                successors,
            } => {
                for &p in &predecessors {
                    self.successors[p].push(action);
                }
                for &s in &successors {
                    self.predecessors[s].push(action);
                }
                self.predecessors[action] = predecessors;
                self.successors[action] = successors;
                self.live[action] = true;
                self.propagate_from(&[action]);
            }
            Edit::Switch(k) => self.toggle_disjunct(k),
            Edit::SetDisjuncts(previous) => {
                self.orientation = previous;
                self.propagate_all();
            }
        }
        Ok(self.feasible)
    }

    // ---- internals -----------------------------------------------------

    fn check_live(&self, action: usize) -> Result<(), ScheduleError> {
        if self.is_live(action) {
            Ok(())
        } else {
            Err(ScheduleError::UnknownAction(action))
        }
    }

    fn check_disjunct(&self, k: usize) -> Result<(), ScheduleError> {
        if k < self.disjuncts.len() {
            Ok(())
        } else {
            Err(ScheduleError::UnknownDisjunct(k))
        }
    }

    fn insert_ordering(&mut self, before: usize, after: usize) {
        self.successors[before].push(after);
        self.predecessors[after].push(before);
        self.propagate_from(&[after]);
    }

    fn delete_ordering(&mut self, before: usize, after: usize) {
        remove_one(&mut self.successors[before], after);
        remove_one(&mut self.predecessors[after], before);
        self.propagate_from(&[after]);
    }

    fn shift_duration(&mut self, action: usize, delta: f64) {
        self.durations[action] = (self.durations[action] + delta).max(0.0);
        self.propagate_from(&[action]);
    }

    fn toggle_disjunct(&mut self, k: usize) {
        self.orientation.toggle(k);
        // The new tail lost a predecessor, the new head gained one; both are
        // reachable from the new tail.
        let (from, _) = self.disjunct_edge(k);
        self.propagate_from(&[from]);
    }

    fn truncate_action(&mut self, index: usize) {
        for p in std::mem::take(&mut self.predecessors[index]) {
            remove_one(&mut self.successors[p], index);
        }
        for s in std::mem::take(&mut self.successors[index]) {
            remove_one(&mut self.predecessors[s], index);
            self.propagate_from(&[s]);
        }
        self.durations.truncate(index);
        self.live.truncate(index);
        self.successors.truncate(index);
        self.predecessors.truncate(index);
        self.disjuncts_of.truncate(index);
        self.start.truncate(index);
        self.end.truncate(index);
        if !self.feasible {
            self.propagate_all();
        }
    }

    #[inline]
    fn disjunct_edge(&self, k: usize) -> (usize, usize) {
        self.disjuncts[k].edge(self.orientation.get(k))
    }

    /// Active live predecessors of `v` (precedence and oriented disjuncts).
    fn preds(&self, v: usize) -> impl Iterator<Item = usize> + '_ {
        let oriented = self.disjuncts_of[v].iter().filter_map(move |&k| {
            let (from, to) = self.disjunct_edge(k);
            (to == v && from != v).then_some(from)
        });
        self.predecessors[v]
            .iter()
            .copied()
            .chain(oriented)
            .filter(move |&p| self.live[p])
    }

    /// Active live successors of `v`.
    fn succs(&self, v: usize) -> impl Iterator<Item = usize> + '_ {
        let oriented = self.disjuncts_of[v].iter().filter_map(move |&k| {
            let (from, to) = self.disjunct_edge(k);
            (from == v && to != v).then_some(to)
        });
        self.successors[v]
            .iter()
            .copied()
            .chain(oriented)
            .filter(move |&s| self.live[s])
    }

    fn earliest_start(&self, v: usize) -> f64 {
        self.preds(v).map(|p| self.end[p]).fold(0.0, f64::max)
    }

    /// Full Kahn pass over every live action.
    fn propagate_all(&mut self) {
        let n = self.durations.len();
        let mut indegree = vec![0usize; n];
        let mut live_count = 0;
        for v in (0..n).filter(|&v| self.live[v]) {
            live_count += 1;
            indegree[v] = self.preds(v).count();
        }
        let mut queue: VecDeque<usize> = (0..n)
            .filter(|&v| self.live[v] && indegree[v] == 0)
            .collect();
        let mut processed = 0;
        while let Some(v) = queue.pop_front() {
            processed += 1;
            self.start[v] = self.earliest_start(v);
            self.end[v] = self.start[v] + self.durations[v];
            let next: Vec<usize> = self.succs(v).collect();
            for s in next {
                indegree[s] -= 1;
                if indegree[s] == 0 {
                    queue.push_back(s);
                }
            }
        }
        self.feasible = processed == live_count;
        if !self.feasible {
            trace!(actions = live_count, processed, "temporal network has a cycle");
        }
    }

    /// Kahn pass restricted to the region reachable from `seeds`.
    fn propagate_from(&mut self, seeds: &[usize]) {
        if !self.feasible {
            self.propagate_all();
            return;
        }
        let n = self.durations.len();
        let mut in_region = vec![false; n];
        let mut region = Vec::new();
        let mut stack: Vec<usize> = seeds.iter().copied().filter(|&s| self.live[s]).collect();
        while let Some(v) = stack.pop() {
            if in_region[v] {
                continue;
            }
            in_region[v] = true;
            region.push(v);
            stack.extend(self.succs(v).filter(|&s| !in_region[s]));
        }

        let mut indegree = vec![0usize; n];
        for &v in &region {
            indegree[v] = self.preds(v).filter(|&p| in_region[p]).count();
        }
        let mut queue: VecDeque<usize> = region.iter().copied().filter(|&v| indegree[v] == 0).collect();
        let mut processed = 0;
        while let Some(v) = queue.pop_front() {
            processed += 1;
            self.start[v] = self.earliest_start(v);
            self.end[v] = self.start[v] + self.durations[v];
            let next: Vec<usize> = self.succs(v).collect();
            for s in next {
                indegree[s] -= 1;
                if indegree[s] == 0 {
                    queue.push_back(s);
                }
            }
        }
        if processed < region.len() {
            self.feasible = false;
            trace!(region = region.len(), processed, "edit introduced a cycle");
        }
    }
}

fn check_duration(action: usize, duration: f64) -> Result<(), ScheduleError> {
    if duration.is_finite() && duration >= 0.0 {
        Ok(())
    } else {
        Err(ScheduleError::InvalidDuration { action, duration })
    }
}

fn remove_one(list: &mut Vec<usize>, value: usize) {
    if let Some(pos) = list.iter().position(|v| *v == value) {
        list.swap_remove(pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orderings(pairs: &[(usize, usize)]) -> Vec<OrderingConstraint> {
        pairs.iter().copied().map(OrderingConstraint::from).collect()
    }

    /// Durations [10, 2, 5, 3]; 0 before 3, 0 before 1, 2 before 1.
    fn sample() -> TemporalNetwork {
        TemporalNetwork::from_orderings(&[10.0, 2.0, 5.0, 3.0], &orderings(&[(0, 3), (0, 1), (2, 1)]))
            .unwrap()
    }

    #[test]
    fn test_build_sample() {
        let net = sample();
        assert!(net.is_feasible());
        assert_eq!(net.makespan(), Some(13.0));
        assert_eq!(net.times(0), Some((0.0, 10.0)));
        assert_eq!(net.times(1), Some((10.0, 12.0)));
        assert_eq!(net.times(2), Some((0.0, 5.0)));
        assert_eq!(net.times(3), Some((10.0, 13.0)));
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let mut net = sample();
        let first = net.makespan();
        net.build(&[10.0, 2.0, 5.0, 3.0], &orderings(&[(0, 3), (0, 1), (2, 1)]))
            .unwrap();
        assert_eq!(net.makespan(), first);
        assert_eq!(sample().schedule(), net.schedule());
    }

    #[test]
    fn test_remove_ordering_does_not_increase_makespan() {
        let mut net = sample();
        let before = net.makespan().unwrap();
        net.remove_ordering(0, 3).unwrap();
        let after = net.makespan().unwrap();
        assert!(after <= before);
        assert_eq!(after, 12.0);
        assert_eq!(net.times(3), Some((0.0, 3.0)));
    }

    #[test]
    fn test_remove_then_readd_restores_makespan() {
        let mut net = sample();
        let original = net.makespan();
        net.remove_ordering(0, 3).unwrap();
        net.add_ordering(0, 3).unwrap();
        assert_eq!(net.makespan(), original);
        assert_eq!(net.schedule(), sample().schedule());
    }

    #[test]
    fn test_remove_missing_ordering() {
        let mut net = sample();
        assert_eq!(
            net.remove_ordering(3, 0),
            Err(ScheduleError::MissingOrdering {
                before: 3,
                after: 0
            })
        );
    }

    #[test]
    fn test_doubling_duration_does_not_decrease_makespan() {
        let mut net = sample();
        let before = net.makespan().unwrap();
        net.increase_duration(3, 3.0).unwrap();
        assert_eq!(net.duration(3), Some(6.0));
        assert!(net.makespan().unwrap() >= before);
        assert_eq!(net.makespan(), Some(16.0));
    }

    #[test]
    fn test_decrease_duration_propagates_earlier() {
        let mut net = sample();
        net.decrease_duration(0, 4.0).unwrap();
        assert_eq!(net.times(1), Some((6.0, 8.0)));
        assert_eq!(net.times(3), Some((6.0, 9.0)));
        net.decrease_duration(0, 100.0).unwrap();
        assert_eq!(net.duration(0), Some(0.0));
        assert_eq!(net.times(1), Some((5.0, 7.0)));
    }

    #[test]
    fn test_remove_and_add_action_keeps_relative_timing() {
        let mut net = sample();
        net.remove_action(0).unwrap();
        let before: Vec<_> = [1, 2, 3].iter().map(|&i| net.times(i).unwrap()).collect();

        let index = net.add_action(10.0, &[], &[]).unwrap();
        assert_eq!(index, 4);
        let after: Vec<_> = [1, 2, 3].iter().map(|&i| net.times(i).unwrap()).collect();
        assert_eq!(before, after);
        assert_eq!(net.times(4), Some((0.0, 10.0)));
        assert_eq!(net.action_state(0), ActionState::Removed);
        assert_eq!(net.live_action_count(), 4);
    }

    #[test]
    fn test_remove_action_releases_successors() {
        let mut net = sample();
        net.remove_action(0).unwrap();
        assert_eq!(net.times(3), Some((0.0, 3.0)));
        assert_eq!(net.times(1), Some((5.0, 7.0)));
        assert_eq!(net.makespan(), Some(7.0));
        assert_eq!(net.times(0), None);
        assert_eq!(net.remove_action(0), Err(ScheduleError::UnknownAction(0)));
    }

    #[test]
    fn test_cycle_is_infeasible_and_revertible() {
        let mut net = sample();
        assert_eq!(net.add_ordering(1, 0), Ok(false));
        assert!(!net.is_feasible());
        assert_eq!(net.makespan(), None);
        assert_eq!(net.action_state(0), ActionState::Infeasible);

        assert_eq!(net.revert_last_edit(), Ok(true));
        assert_eq!(net.makespan(), Some(13.0));
        assert_eq!(net.revert_last_edit(), Err(ScheduleError::NothingToRevert));
    }

    #[test]
    fn test_revert_each_edit_kind() {
        let mut net = sample();
        let original = net.schedule();

        net.increase_duration(2, 20.0).unwrap();
        net.revert_last_edit().unwrap();
        assert_eq!(net.schedule(), original);

        net.remove_action(0).unwrap();
        net.revert_last_edit().unwrap();
        assert_eq!(net.schedule(), original);

        net.add_action(4.0, &[1], &[]).unwrap();
        net.revert_last_edit().unwrap();
        assert_eq!(net.action_count(), 4);
        assert_eq!(net.schedule(), original);
    }

    #[test]
    fn test_add_action_with_links() {
        let mut net = sample();
        let index = net.add_action(4.0, &[1], &[3]).unwrap();
        // 1 ends at 12, new action runs 12..16, then 3 runs 16..19
        assert_eq!(net.times(index), Some((12.0, 16.0)));
        assert_eq!(net.times(3), Some((16.0, 19.0)));
    }

    #[test]
    fn test_unknown_action_fails_fast() {
        let mut net = sample();
        assert_eq!(net.add_ordering(0, 9), Err(ScheduleError::UnknownAction(9)));
        assert_eq!(
            net.increase_duration(7, 1.0),
            Err(ScheduleError::UnknownAction(7))
        );
        assert!(TemporalNetwork::from_orderings(&[1.0], &orderings(&[(0, 2)])).is_err());
    }

    #[test]
    fn test_invalid_duration() {
        assert!(matches!(
            TemporalNetwork::from_orderings(&[1.0, -2.0], &[]),
            Err(ScheduleError::InvalidDuration { action: 1, .. })
        ));
        let mut net = sample();
        assert!(net.increase_duration(0, f64::NAN).is_err());
    }

    #[test]
    fn test_disjunct_switch_and_probe() {
        // Two independent actions sharing a resource.
        let mut net = TemporalNetwork::new();
        net.build_with_disjuncts(
            &[4.0, 6.0],
            &[],
            vec![Disjunct::new(0, 1)],
            DisjunctId::zeros(1),
        )
        .unwrap();
        assert_eq!(net.times(1), Some((4.0, 10.0)));
        assert_eq!(net.action_state(0), ActionState::TimeBounded);

        assert_eq!(net.try_switch(0), Ok(Some(10.0)));
        // probing leaves the network untouched
        assert_eq!(net.disjunct_id(), &DisjunctId::zeros(1));

        net.switch(0).unwrap();
        assert_eq!(net.disjunct_id().to_string(), "1");
        assert_eq!(net.times(0), Some((6.0, 10.0)));
        assert_eq!(net.times(1), Some((0.0, 6.0)));

        net.mark_resolved();
        assert_eq!(net.action_state(1), ActionState::Resolved);
        assert_eq!(net.try_switch(3), Err(ScheduleError::UnknownDisjunct(3)));
    }

    #[test]
    fn test_disjunct_against_precedence_is_infeasible() {
        let mut net = TemporalNetwork::new();
        net.build_with_disjuncts(
            &[1.0, 1.0],
            &orderings(&[(0, 1)]),
            vec![Disjunct::new(0, 1)],
            DisjunctId::zeros(1),
        )
        .unwrap();
        assert_eq!(net.try_switch(0), Ok(None));
        assert_eq!(net.switch(0), Ok(false));
        assert_eq!(net.revert_last_edit(), Ok(true));
        assert_eq!(net.makespan(), Some(2.0));
    }

    #[test]
    fn test_set_disjunct_id_length_checked() {
        let mut net = sample();
        assert_eq!(
            net.set_disjunct_id(DisjunctId::zeros(2)),
            Err(ScheduleError::DisjunctLength {
                expected: 0,
                actual: 2
            })
        );
    }

    #[test]
    fn test_latest_times_and_critical_path() {
        let net = sample();
        // 1 may start as late as 11, so 2 may end as late as 11
        assert_eq!(net.slack(2), Some(6.0));
        assert_eq!(net.slack(0), Some(0.0));
        // 1 ends at 12 but the makespan is 13
        assert_eq!(net.slack(1), Some(1.0));
        assert_eq!(net.critical_actions(), vec![0, 3]);
    }

    #[test]
    fn test_precedence_reaches_and_topological_order() {
        let net = sample();
        assert!(net.precedence_reaches(0, 1));
        assert!(!net.precedence_reaches(1, 0));
        assert!(!net.precedence_reaches(2, 3));
        let order = net.topological_order().unwrap();
        let pos = |a: usize| order.iter().position(|v| *v == a).unwrap();
        assert!(pos(0) < pos(3));
        assert!(pos(2) < pos(1));
    }

    #[test]
    fn test_empty_and_unbuilt() {
        let net = TemporalNetwork::new();
        assert_eq!(net.makespan(), None);
        let built = TemporalNetwork::from_orderings(&[], &[]).unwrap();
        assert_eq!(built.makespan(), Some(0.0));
        let mut grown = TemporalNetwork::new();
        grown.add_action(3.0, &[], &[]).unwrap();
        assert_eq!(grown.makespan(), Some(3.0));
    }
}
