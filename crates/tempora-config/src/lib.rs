//! Configuration system for Tempora.
//!
//! Load solver configuration from TOML or YAML to control the swap
//! resolver budgets, the local search, the feasibility checker and criterion
//! weights without code changes.
//!
//! # Examples
//!
//! ```
//! use tempora_config::{AcceptorKind, SolverConfig};
//! use std::time::Duration;
//!
//! let config = SolverConfig::from_toml_str(r#"
//!     random_seed = 7
//!
//!     [resolver]
//!     max_attempts = 10
//!     time_limit_ms = 250
//!
//!     [search]
//!     max_iterations = 5000
//!     acceptor = "late_acceptance"
//!
//!     [[criteria]]
//!     name = "TimePreferences"
//!     weight = 2.5
//! "#).unwrap();
//!
//! assert_eq!(config.resolver.time_limit(), Duration::from_millis(250));
//! assert_eq!(config.search.acceptor, AcceptorKind::LateAcceptance);
//! assert_eq!(config.criteria[0].weight, Some(2.5));
//! ```
//!
//! Use default config when file is missing:
//!
//! ```
//! use tempora_config::SolverConfig;
//!
//! let config = SolverConfig::load("tempora.toml").unwrap_or_default();
//! assert!(config.resolver.hill_climbing);
//! ```

mod properties;

#[cfg(test)]
mod tests;

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

pub use properties::Properties;
pub use tempora_core::criterion::ValueUpdate;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main solver configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SolverConfig {
    /// Random seed for reproducible results.
    #[serde(default)]
    pub random_seed: Option<u64>,

    /// Swap resolver budgets.
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Local search driver.
    #[serde(default)]
    pub search: SearchConfig,

    /// Branch-and-bound feasibility checker budgets.
    #[serde(default)]
    pub feasibility: FeasibilityConfig,

    /// Criteria to instantiate, by name.
    #[serde(default)]
    pub criteria: Vec<CriterionConfig>,
}

impl SolverConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist or contains invalid TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(s)?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yaml::from_str(s)?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Replaces unusable sizes with their defaults, logging each fallback.
    ///
    /// The loaders call this before [`validate`](Self::validate).
    pub fn normalize(&mut self) {
        self.search.normalize();
    }

    /// Rejects values that have no sensible fallback.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.criteria.iter().any(|c| c.name.is_empty()) {
            return Err(ConfigError::Invalid("criterion name must not be empty".into()));
        }
        Ok(())
    }

    /// Sets the random seed.
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Sets the resolver configuration.
    pub fn with_resolver(mut self, resolver: ResolverConfig) -> Self {
        self.resolver = resolver;
        self
    }

    /// Adds a criterion entry.
    pub fn with_criterion(mut self, criterion: CriterionConfig) -> Self {
        self.criteria.push(criterion);
        self
    }

    /// Looks a criterion entry up by name.
    pub fn criterion(&self, name: &str) -> Option<&CriterionConfig> {
        self.criteria.iter().find(|c| c.name == name)
    }
}

/// Swap resolver configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", default)]
pub struct ResolverConfig {
    /// Maximum number of cascaded conflict expansions per invocation.
    pub max_attempts: usize,

    /// Wall-clock budget per invocation, in milliseconds.
    pub time_limit_ms: u64,

    /// Only accept cascades that do not worsen the objective.
    pub hill_climbing: bool,

    /// Alternatives with a larger static preference are skipped.
    pub max_preference: Option<f64>,
}

impl ResolverConfig {
    pub const DEFAULT_MAX_ATTEMPTS: usize = 3;
    pub const DEFAULT_TIME_LIMIT_MS: u64 = 10;

    /// Returns the time limit as a Duration.
    pub fn time_limit(&self) -> Duration {
        Duration::from_millis(self.time_limit_ms)
    }

    /// Reads `Swap.*` properties, falling back to defaults on missing or
    /// unparsable entries.
    ///
    /// ```
    /// use tempora_config::{Properties, ResolverConfig};
    ///
    /// let mut properties = Properties::new();
    /// properties.set("Swap.MaxAttempts", "12");
    /// properties.set("Swap.HillClimbing", "false");
    /// properties.set("Swap.TimeLimit", "soon");
    ///
    /// let config = ResolverConfig::from_properties(&properties);
    /// assert_eq!(config.max_attempts, 12);
    /// assert!(!config.hill_climbing);
    /// assert_eq!(config.time_limit_ms, ResolverConfig::DEFAULT_TIME_LIMIT_MS);
    /// ```
    pub fn from_properties(properties: &Properties) -> Self {
        let defaults = Self::default();
        Self {
            max_attempts: properties.get_usize("Swap.MaxAttempts", defaults.max_attempts),
            time_limit_ms: properties.get_u64("Swap.TimeLimit", defaults.time_limit_ms),
            hill_climbing: properties.get_bool("Swap.HillClimbing", defaults.hill_climbing),
            max_preference: properties.get_opt_f64("Swap.MaxPreference"),
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            time_limit_ms: Self::DEFAULT_TIME_LIMIT_MS,
            hill_climbing: true,
            max_preference: None,
        }
    }
}

/// Acceptor used by the local search driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AcceptorKind {
    /// Accept non-worsening moves only.
    #[default]
    HillClimbing,

    /// Accept moves no worse than the objective some steps ago.
    LateAcceptance,
}

/// Local search configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", default)]
pub struct SearchConfig {
    /// Maximum number of iterations.
    pub max_iterations: Option<u64>,

    /// Maximum wall-clock time, in milliseconds.
    pub time_limit_ms: Option<u64>,

    pub acceptor: AcceptorKind,

    /// Size of the late acceptance history.
    pub late_acceptance_size: usize,

    /// Number of independent trials run in parallel.
    pub threads: usize,
}

impl SearchConfig {
    pub const DEFAULT_LATE_ACCEPTANCE_SIZE: usize = 400;
    pub const DEFAULT_THREADS: usize = 1;

    /// Zero thread counts and history sizes fall back to the defaults.
    pub fn normalize(&mut self) {
        if self.threads == 0 {
            warn!(
                event = "config_fallback",
                key = "search.threads",
                value = 0,
                default = Self::DEFAULT_THREADS,
            );
            self.threads = Self::DEFAULT_THREADS;
        }
        if self.late_acceptance_size == 0 {
            warn!(
                event = "config_fallback",
                key = "search.late_acceptance_size",
                value = 0,
                default = Self::DEFAULT_LATE_ACCEPTANCE_SIZE,
            );
            self.late_acceptance_size = Self::DEFAULT_LATE_ACCEPTANCE_SIZE;
        }
    }

    /// Returns the time limit as a Duration, if any.
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_iterations: None,
            time_limit_ms: None,
            acceptor: AcceptorKind::default(),
            late_acceptance_size: Self::DEFAULT_LATE_ACCEPTANCE_SIZE,
            threads: Self::DEFAULT_THREADS,
        }
    }
}

/// Feasibility checker configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", default)]
pub struct FeasibilityConfig {
    /// Maximum number of search nodes.
    pub node_limit: Option<u64>,

    /// Maximum wall-clock time, in milliseconds.
    pub time_limit_ms: Option<u64>,
}

impl FeasibilityConfig {
    /// Returns the time limit as a Duration, if any.
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }
}

/// One criterion to instantiate.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CriterionConfig {
    /// Registered name of the criterion.
    pub name: String,

    /// Weight override; the criterion's default when absent.
    #[serde(default)]
    pub weight: Option<f64>,

    /// Update ordering override.
    #[serde(default)]
    pub update: Option<ValueUpdate>,
}

impl CriterionConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            weight: None,
            update: None,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn with_update(mut self, update: ValueUpdate) -> Self {
        self.update = Some(update);
        self
    }
}
