//! Solver configuration.
//!
//! Load tuning parameters from TOML to control search mode, heuristic
//! blending, tabu resolution, and motion query budgets without code
//! changes. Every section and field is optional; missing values fall back
//! to defaults.
//!
//! # Example
//!
//! ```
//! use u_allocation::config::{SearchMode, SolverConfig};
//!
//! let config = SolverConfig::from_toml_str(r#"
//!     [search]
//!     mode = "sequential"
//!     alpha = 0.25
//!     time_limit_ms = 5000
//!
//!     [tabu]
//!     num_candidates = 4
//!     quality_threshold = 1.1
//! "#).unwrap();
//!
//! assert_eq!(config.search.mode, SearchMode::Sequential);
//! assert_eq!(config.tabu.num_candidates, 4);
//! assert_eq!(config.tabu.tabu_length, 200);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::temporal::TabuConfig;

/// Main solver configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Allocation search settings.
    pub search: SearchConfig,
    /// Disjunct resolution settings.
    pub tabu: TabuConfig,
    /// Motion planner query settings.
    pub motion: MotionConfig,
}

impl SolverConfig {
    /// Creates a default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file can't be read, contains invalid TOML, or
    /// fails [`validate`](Self::validate).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the search mode.
    pub fn with_mode(mut self, mode: SearchMode) -> Self {
        self.search.mode = mode;
        self
    }

    /// Sets the heuristic blend factor.
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.search.alpha = alpha;
        self
    }

    /// Sets the overall time limit.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.search.time_limit_ms = Some(limit.as_millis() as u64);
        self
    }

    /// Sets the maximum number of node expansions.
    pub fn with_max_expansions(mut self, max: u64) -> Self {
        self.search.max_expansions = Some(max);
        self
    }

    /// Replaces the tabu settings.
    pub fn with_tabu(mut self, tabu: TabuConfig) -> Self {
        self.tabu = tabu;
        self
    }

    /// Sets the tabu random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.tabu.seed = Some(seed);
        self
    }

    /// Returns the overall time limit, if configured.
    pub fn time_limit(&self) -> Option<Duration> {
        self.search.time_limit_ms.map(Duration::from_millis)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.search.alpha) {
            return Err(ConfigError::Invalid(format!(
                "search.alpha must be in [0, 1], got {}",
                self.search.alpha
            )));
        }
        if self.tabu.num_candidates == 0 {
            return Err(ConfigError::Invalid(
                "tabu.num_candidates must be at least 1".into(),
            ));
        }
        if !(self.tabu.quality_threshold.is_finite() && self.tabu.quality_threshold >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "tabu.quality_threshold must be finite and >= 0, got {}",
                self.tabu.quality_threshold
            )));
        }
        Ok(())
    }
}

/// How the solver treats temporally infeasible goal allocations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Stop at the first complete allocation; report its schedule as-is.
    #[default]
    OneShot,
    /// Keep searching until a complete allocation has a feasible schedule.
    Sequential,
}

/// Allocation search settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchConfig {
    /// One-shot or sequential solving.
    pub mode: SearchMode,
    /// Heuristic blend: 0 = pure trait distance, 1 = pure schedule quality.
    pub alpha: f64,
    /// Stop after this many node expansions.
    pub max_expansions: Option<u64>,
    /// Stop after this many milliseconds.
    pub time_limit_ms: Option<u64>,
    /// Schedule every child during expansion (otherwise unit step costs).
    pub schedule_partial: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            mode: SearchMode::OneShot,
            alpha: 0.0,
            max_expansions: None,
            time_limit_ms: None,
            schedule_partial: true,
        }
    }
}

/// Motion planner query settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Time budget for a single query (ms).
    pub query_budget_ms: u64,
}

impl MotionConfig {
    /// Query budget as a duration.
    pub fn query_budget(&self) -> Duration {
        Duration::from_millis(self.query_budget_ms)
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            query_budget_ms: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SolverConfig::default();
        assert_eq!(config.search.mode, SearchMode::OneShot);
        assert_eq!(config.search.alpha, 0.0);
        assert!(config.search.schedule_partial);
        assert_eq!(config.tabu.num_candidates, 10);
        assert_eq!(config.tabu.time_try, 10);
        assert_eq!(config.motion.query_budget(), Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = SolverConfig::from_toml_str("").unwrap();
        assert_eq!(config, SolverConfig::default());
    }

    #[test]
    fn test_toml_sections() {
        let config = SolverConfig::from_toml_str(
            r#"
            [search]
            mode = "sequential"
            max_expansions = 500

            [tabu]
            tabu_length = 7
            seed = 42

            [motion]
            query_budget_ms = 250
            "#,
        )
        .unwrap();
        assert_eq!(config.search.mode, SearchMode::Sequential);
        assert_eq!(config.search.max_expansions, Some(500));
        assert_eq!(config.tabu.tabu_length, 7);
        assert_eq!(config.tabu.seed, Some(42));
        assert_eq!(config.motion.query_budget_ms, 250);
    }

    #[test]
    fn test_invalid_alpha_rejected() {
        let err = SolverConfig::from_toml_str("[search]\nalpha = 1.5").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_invalid_tabu_rejected() {
        let err = SolverConfig::from_toml_str("[tabu]\nnum_candidates = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        let err = SolverConfig::from_toml_str("[tabu]\nquality_threshold = -1.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_invalid_toml_rejected() {
        let err = SolverConfig::from_toml_str("[search\nalpha = ").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = SolverConfig::load("/nonexistent/u-allocation.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_builders() {
        let config = SolverConfig::new()
            .with_mode(SearchMode::Sequential)
            .with_alpha(0.5)
            .with_time_limit(Duration::from_secs(3))
            .with_max_expansions(10)
            .with_seed(7);
        assert_eq!(config.time_limit(), Some(Duration::from_secs(3)));
        assert_eq!(config.search.max_expansions, Some(10));
        assert_eq!(config.tabu.seed, Some(7));
    }
}
