//! Distribution of a sum of independent forecasts.

use crate::config::{Config, SimulationSettings};
use crate::interval::ConfidenceInterval;
use crate::types::SimRng;

use super::{MonteCarlo, MonteCarloInterval};

/// Approximates the distribution of `Σ Xᵢ` by simulated convolution.
///
/// Each sample draws one random value from every registered interval and
/// adds them up. The intervals are borrowed, never mutated.
pub struct IntervalSum<'a> {
    intervals: Vec<&'a dyn ConfidenceInterval>,
    engine: MonteCarlo,
}

impl<'a> IntervalSum<'a> {
    /// Create an empty sum with the given sampling policy.
    pub fn new(settings: SimulationSettings) -> Self {
        Self {
            intervals: Vec::new(),
            engine: MonteCarlo::new(settings),
        }
    }

    /// Create an empty sum using the configured sampling policy.
    pub fn with_config(config: &Config) -> Self {
        Self::new(config.monte_carlo_settings())
    }

    /// Register one term of the sum.
    pub fn add_interval(&mut self, interval: &'a dyn ConfidenceInterval) {
        self.intervals.push(interval);
    }

    /// Override the convergence tolerance, in units of the summed value.
    pub fn set_acceptable_error(&mut self, acceptable_error: f64) {
        self.engine.set_acceptable_error(acceptable_error);
    }

    /// Number of registered terms.
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// True when no terms have been registered.
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Run the simulation over every registered term.
    pub fn intervals_complete(self, rng: &mut SimRng) -> MonteCarloInterval {
        let IntervalSum { intervals, engine } = self;
        tracing::debug!(terms = intervals.len(), "simulating interval sum");
        let mut sampler = |rng: &mut SimRng| {
            let mut total = 0.0;
            for interval in &intervals {
                total += interval.random_value(rng);
            }
            total
        };
        engine.run_simulation(&mut sampler, rng)
    }
}

impl std::fmt::Debug for IntervalSum<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntervalSum")
            .field("terms", &self.intervals.len())
            .field("engine", &self.engine)
            .finish()
    }
}
