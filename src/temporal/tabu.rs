//! Tabu search over disjunct orientations.
//!
//! Each round restarts from a random feasible orientation and walks the
//! single-flip neighborhood, always moving to the best admissible neighbor.
//! A neighbor is admissible if its orientation is not tabu, or if it beats
//! the best score of the round (aspiration). Committed orientations stay
//! tabu for `tabu_length` steps. Tabu memory is cleared between rounds; the
//! makespan cache is kept for the whole search.
//!
//! The search stops when
//! - all rounds are used,
//! - a round sees `time_try` consecutive non-improving steps (round ends),
//! - the best makespan is within `quality_threshold` of the incoming one,
//! - or the deadline passes.
//!
//! # Reference
//! Glover (1989), "Tabu Search - Part I", ORSA Journal on Computing 1(3)

use std::collections::HashMap;
use std::time::Instant;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::network::{DisjunctId, TemporalNetwork};

/// Tabu search parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TabuConfig {
    /// Number of random restarts.
    pub num_candidates: usize,
    /// Maximum neighborhood steps per restart.
    pub num_iterations: usize,
    /// Steps a committed orientation stays tabu.
    pub tabu_length: usize,
    /// Consecutive non-improving steps before a restart ends early.
    pub time_try: usize,
    /// Stop once `best <= quality_threshold * incoming makespan`; 0 disables.
    pub quality_threshold: f64,
    /// Random seed; `None` seeds from the thread RNG.
    pub seed: Option<u64>,
}

impl Default for TabuConfig {
    fn default() -> Self {
        Self {
            num_candidates: 10,
            num_iterations: 25,
            tabu_length: 200,
            time_try: 10,
            quality_threshold: 1.3,
            seed: None,
        }
    }
}

impl TabuConfig {
    /// Sets the number of restarts.
    pub fn with_candidates(mut self, n: usize) -> Self {
        self.num_candidates = n;
        self
    }

    /// Sets the steps per restart.
    pub fn with_iterations(mut self, n: usize) -> Self {
        self.num_iterations = n;
        self
    }

    /// Sets the tabu tenure.
    pub fn with_tabu_length(mut self, n: usize) -> Self {
        self.tabu_length = n;
        self
    }

    /// Sets the early-stop quality threshold.
    pub fn with_quality_threshold(mut self, threshold: f64) -> Self {
        self.quality_threshold = threshold;
        self
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Result of a tabu resolution.
#[derive(Debug, Clone)]
pub struct TabuOutcome {
    /// Best network found (never worse than the incoming one when that was feasible).
    pub network: TemporalNetwork,
    /// Makespan of `network`; `None` if no feasible orientation was found.
    pub makespan: Option<f64>,
    /// Restarts started.
    pub rounds: usize,
    /// Neighborhood steps taken across all rounds.
    pub iterations: usize,
    /// Best makespan after each step; non-increasing.
    pub best_trace: Vec<f64>,
}

/// Tabu search resolver for disjunctive constraints.
///
/// # Example
///
/// ```
/// use u_allocation::temporal::{Disjunct, DisjunctId, TabuConfig, TabuSearch, TemporalNetwork};
///
/// let mut net = TemporalNetwork::new();
/// net.build_with_disjuncts(&[3.0, 4.0], &[], vec![Disjunct::new(0, 1)], DisjunctId::zeros(1))
///     .unwrap();
///
/// let mut tabu = TabuSearch::new(TabuConfig::default().with_seed(1));
/// let outcome = tabu.resolve(&net);
/// assert_eq!(outcome.makespan, Some(7.0));
/// ```
#[derive(Debug, Clone)]
pub struct TabuSearch {
    config: TabuConfig,
    rng: SmallRng,
    tabu: HashMap<DisjunctId, usize>,
    cache: HashMap<DisjunctId, Option<f64>>,
    best_solver_score: f64,
    best_solution_score: f64,
}

impl TabuSearch {
    /// Creates a resolver.
    pub fn new(config: TabuConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_rng(&mut rand::rng()),
        };
        Self {
            config,
            rng,
            tabu: HashMap::new(),
            cache: HashMap::new(),
            best_solver_score: f64::INFINITY,
            best_solution_score: f64::INFINITY,
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &TabuConfig {
        &self.config
    }

    /// Best makespan of the current round.
    pub fn best_solver_score(&self) -> f64 {
        self.best_solver_score
    }

    /// Best makespan over all rounds.
    pub fn best_solution_score(&self) -> f64 {
        self.best_solution_score
    }

    /// Number of orientations whose makespan has been probed.
    pub fn cached_probes(&self) -> usize {
        self.cache.len()
    }

    /// Resolves disjuncts without a deadline.
    pub fn resolve(&mut self, network: &TemporalNetwork) -> TabuOutcome {
        self.resolve_until(network, None)
    }

    /// Resolves disjuncts, stopping between steps once `deadline` passes.
    pub fn resolve_until(
        &mut self,
        network: &TemporalNetwork,
        deadline: Option<Instant>,
    ) -> TabuOutcome {
        let optimal = network.makespan();
        let mut outcome = TabuOutcome {
            network: network.clone(),
            makespan: optimal,
            rounds: 0,
            iterations: 0,
            best_trace: Vec::new(),
        };
        if network.disjunct_count() == 0 {
            outcome.network.mark_resolved();
            return outcome;
        }

        self.cache.clear();
        self.best_solution_score = f64::INFINITY;
        let mut best_found: Option<TemporalNetwork> = None;
        let target = match optimal {
            Some(m) if self.config.quality_threshold > 0.0 => m * self.config.quality_threshold,
            _ => f64::NEG_INFINITY,
        };
        let expired = |deadline: Option<Instant>| deadline.is_some_and(|d| Instant::now() >= d);

        'rounds: for round in 0..self.config.num_candidates {
            if self.best_solution_score <= target || expired(deadline) {
                break;
            }
            outcome.rounds += 1;
            self.tabu.clear();
            self.best_solver_score = f64::INFINITY;
            let mut current = self.random_start(network);
            let mut stale = 0;
            if let Some(score) = current.makespan() {
                self.record(score, &current, &mut best_found);
            }

            for iteration in 0..self.config.num_iterations {
                if expired(deadline) {
                    break 'rounds;
                }
                outcome.iterations += 1;
                let improved = match self.step(&mut current, iteration) {
                    Some(score) => self.record(score, &current, &mut best_found),
                    None => false,
                };
                if self.best_solution_score.is_finite() {
                    outcome.best_trace.push(self.best_solution_score);
                }
                if improved {
                    stale = 0;
                } else {
                    stale += 1;
                    if stale > self.config.time_try || self.best_solution_score <= target {
                        break;
                    }
                }
            }
            debug!(
                event = "tabu_round",
                round,
                round_best = self.best_solver_score,
                best = self.best_solution_score,
            );
        }

        if let Some(found) = best_found {
            let found_makespan = found.makespan();
            let keep_incoming = matches!(
                (optimal, found_makespan),
                (Some(incoming), Some(candidate)) if incoming <= candidate
            );
            if !keep_incoming {
                outcome.network = found;
                outcome.makespan = found_makespan;
            }
        }
        outcome.network.mark_resolved();
        outcome
    }

    /// Moves `current` to its best admissible single-flip neighbor.
    ///
    /// Returns the new makespan, or `None` if every neighbor is infeasible
    /// or tabu without aspiration (then `current` is unchanged).
    pub fn step(&mut self, current: &mut TemporalNetwork, iteration: usize) -> Option<f64> {
        let (k, score) = self.best_neighbor(current, iteration)?;
        // `k` comes from the network's own disjunct range.
        current.switch(k).ok()?;
        self.tabu
            .insert(current.disjunct_id().clone(), iteration + self.config.tabu_length);
        Some(score)
    }

    /// Finds the best admissible flip without committing it.
    ///
    /// A tabu flip is admitted when it beats the best of the current round
    /// ([`best_solver_score`](Self::best_solver_score)), not the best over
    /// all rounds.
    pub fn best_neighbor(
        &mut self,
        current: &TemporalNetwork,
        iteration: usize,
    ) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for k in 0..current.disjunct_count() {
            let id = current.disjunct_id().flipped(k);
            let Some(score) = self.probe(current, k, &id) else {
                continue;
            };
            let is_tabu = self.tabu.get(&id).is_some_and(|&until| until > iteration);
            let aspires = score < self.best_solver_score;
            if is_tabu && !aspires {
                continue;
            }
            if best.map_or(true, |(_, b)| score < b) {
                best = Some((k, score));
            }
        }
        best
    }

    fn probe(&mut self, current: &TemporalNetwork, k: usize, id: &DisjunctId) -> Option<f64> {
        if let Some(score) = self.cache.get(id) {
            return *score;
        }
        let score = current.probe_switch(k);
        self.cache.insert(id.clone(), score);
        score
    }

    /// Random feasible orientation, falling back to the incoming one.
    fn random_start(&mut self, network: &TemporalNetwork) -> TemporalNetwork {
        let len = network.disjunct_count();
        for _ in 0..self.config.time_try.max(1) {
            let bits: Vec<bool> = (0..len).map(|_| self.rng.random_bool(0.5)).collect();
            let id = DisjunctId::new(bits);
            if let Some(None) = self.cache.get(&id) {
                continue;
            }
            let mut candidate = network.clone();
            if let Ok(true) = candidate.set_disjunct_id(id.clone()) {
                self.cache.insert(id, candidate.makespan());
                return candidate;
            }
            self.cache.insert(id, None);
        }
        network.clone()
    }

    /// Updates round and global bests; returns whether the round improved.
    fn record(
        &mut self,
        score: f64,
        current: &TemporalNetwork,
        best_found: &mut Option<TemporalNetwork>,
    ) -> bool {
        if score >= self.best_solver_score {
            return false;
        }
        self.best_solver_score = score;
        if score < self.best_solution_score {
            self.best_solution_score = score;
            *best_found = Some(current.clone());
        }
        true
    }
}
