//! Configuration for interval estimation and simulation.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Configuration options shared by every estimator.
///
/// All fields have defaults; a partial JSON document can be loaded with
/// [`Config::from_json`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base number of schedule-simulation trials (default: 1,000).
    pub monte_carlo_trials: usize,

    /// Number of Studentized bootstrap replicates for the lognormal
    /// bootstrap interval (default: 2,000).
    pub bootstrap_samples: usize,

    /// Two-sided probability above which a lognormal bootstrap interval that
    /// only reaches the naive ratio forecast is flagged (default: 0.5).
    pub lognormal_cutoff: f64,

    /// Two-sided probability above which a regression interval that only
    /// reaches the naive ratio forecast is flagged (default: 0.3).
    pub regression_cutoff: f64,

    /// Convergence tolerance on the Monte Carlo reference quantile
    /// (default: 0.001).
    pub acceptable_error: f64,

    /// Adaptive sampling policy for the Monte Carlo engine.
    pub simulation: SimulationSettings,

    /// Seed for every random draw made by the crate (default: 42).
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            monte_carlo_trials: 1_000,
            bootstrap_samples: 2_000,
            lognormal_cutoff: 0.5,
            regression_cutoff: 0.3,
            acceptable_error: 0.001,
            simulation: SimulationSettings::default(),
            seed: 42,
        }
    }
}

impl Config {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every option is within its meaningful range.
    pub fn validate(&self) -> Result<()> {
        if self.monte_carlo_trials == 0 {
            return Err(Error::InvalidConfig("monte_carlo_trials must be positive".into()));
        }
        if self.bootstrap_samples == 0 {
            return Err(Error::InvalidConfig("bootstrap_samples must be positive".into()));
        }
        for (name, value) in [
            ("lognormal_cutoff", self.lognormal_cutoff),
            ("regression_cutoff", self.regression_cutoff),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidConfig(format!("{} must be in [0, 1], got {}", name, value)));
            }
        }
        if !(self.acceptable_error.is_finite() && self.acceptable_error >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "acceptable_error must be finite and non-negative, got {}",
                self.acceptable_error
            )));
        }
        self.simulation.validate()
    }

    /// Monte Carlo settings with this configuration's tolerance applied.
    pub fn monte_carlo_settings(&self) -> SimulationSettings {
        SimulationSettings {
            acceptable_error: self.acceptable_error,
            ..self.simulation.clone()
        }
    }
}

/// Largest Monte Carlo pool a configuration may request.
pub const MAX_POOL_SIZE: usize = 10_000_000;

/// Adaptive sampling policy for [`MonteCarlo::run_simulation`](crate::MonteCarlo).
///
/// The pool starts at `base_size` and grows by
/// `floor(size * growth_multiplier) + growth_increment` per iteration until
/// the reference quantile stops moving or `max_size` is reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Initial pool size (default: 100).
    pub base_size: usize,
    /// Hard cap on the pool size (default: 20,000).
    pub max_size: usize,
    /// Additive growth per iteration (default: 100).
    pub growth_increment: usize,
    /// Multiplicative growth per iteration (default: 1.0, i.e. additive only).
    pub growth_multiplier: f64,
    /// Quantile watched for convergence (default: 0.15, the 70% lower bound).
    pub reference_quantile: f64,
    /// Largest change in the reference quantile that counts as stable
    /// (default: 0.001).
    pub acceptable_error: f64,
    /// Consecutive stable iterations required to stop (default: 2).
    pub stable_iterations: usize,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            base_size: 100,
            max_size: 20_000,
            growth_increment: 100,
            growth_multiplier: 1.0,
            reference_quantile: 0.15,
            acceptable_error: 0.001,
            stable_iterations: 2,
        }
    }
}

impl SimulationSettings {
    /// Pool size for the next iteration.
    pub fn next_size(&self, size: usize) -> usize {
        let grown = (size as f64 * self.growth_multiplier).floor() as usize + self.growth_increment;
        grown.max(size + 1).min(self.max_size)
    }

    /// Check that the policy terminates and watches a valid quantile.
    pub fn validate(&self) -> Result<()> {
        if self.base_size == 0 || self.max_size < self.base_size {
            return Err(Error::InvalidConfig(format!(
                "pool sizes must satisfy 0 < base_size <= max_size, got {} and {}",
                self.base_size, self.max_size
            )));
        }
        if self.max_size > MAX_POOL_SIZE {
            return Err(Error::InvalidConfig(format!(
                "max_size must be at most {}, got {}",
                MAX_POOL_SIZE, self.max_size
            )));
        }
        if !(self.growth_multiplier.is_finite() && self.growth_multiplier >= 1.0) {
            return Err(Error::InvalidConfig("growth_multiplier must be >= 1.0".into()));
        }
        if !(0.0..=1.0).contains(&self.reference_quantile) {
            return Err(Error::InvalidConfig("reference_quantile must be in [0, 1]".into()));
        }
        if self.stable_iterations == 0 {
            return Err(Error::InvalidConfig("stable_iterations must be positive".into()));
        }
        Ok(())
    }
}
