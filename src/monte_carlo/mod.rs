//! Adaptive Monte Carlo engine.
//!
//! A [`MonteCarlo`] pool is filled either with externally collected samples
//! ([`MonteCarlo::add_sample`]) or by an adaptive simulation loop
//! ([`MonteCarlo::run_simulation`]) that keeps generating samples until a
//! reference quantile stops moving. Both paths end by freezing the pool
//! into a sorted, read-only [`MonteCarloInterval`].

mod sum;

pub use sum::IntervalSum;

use crate::config::SimulationSettings;
use crate::interval::{outside_interval, ConfidenceInterval, TargetedInterval};
use crate::statistics::{interpolated_quantile, SampleBuffer};
use crate::types::{SimRng, Viability};

/// Source of simulated samples.
pub trait Sampler {
    /// Generate one sample.
    fn sample(&mut self, rng: &mut SimRng) -> f64;
}

impl<F> Sampler for F
where
    F: FnMut(&mut SimRng) -> f64,
{
    fn sample(&mut self, rng: &mut SimRng) -> f64 {
        self(rng)
    }
}

/// Mutable sample pool, before it is frozen.
#[derive(Debug, Clone)]
pub struct MonteCarlo {
    pool: SampleBuffer,
    settings: SimulationSettings,
}

impl Default for MonteCarlo {
    fn default() -> Self {
        Self::new(SimulationSettings::default())
    }
}

impl MonteCarlo {
    /// Create an empty engine with the given sampling policy.
    pub fn new(settings: SimulationSettings) -> Self {
        Self {
            pool: SampleBuffer::with_capacity(settings.base_size.min(settings.max_size)),
            settings,
        }
    }

    /// Sampling policy in effect.
    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    /// Override the convergence tolerance.
    pub fn set_acceptable_error(&mut self, acceptable_error: f64) {
        self.settings.acceptable_error = acceptable_error;
    }

    /// Append an externally generated sample.
    pub fn add_sample(&mut self, value: f64) {
        self.pool.push(value);
    }

    /// Number of samples collected so far.
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    /// True when no samples have been collected.
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// Sort and freeze the collected samples.
    pub fn samples_done(mut self) -> MonteCarloInterval {
        self.pool.sort();
        MonteCarloInterval::from_sorted(self.pool)
    }

    /// Grow the pool until the reference quantile converges, then freeze it.
    ///
    /// Each iteration tops the pool up to the next size, re-sorts it and
    /// recomputes the reference quantile. The loop stops after
    /// `stable_iterations` consecutive changes within `acceptable_error`, or
    /// once the pool reaches `max_size`.
    pub fn run_simulation<S>(mut self, sampler: &mut S, rng: &mut SimRng) -> MonteCarloInterval
    where
        S: Sampler + ?Sized,
    {
        let settings = self.settings.clone();
        let mut target = settings.base_size.min(settings.max_size);
        let mut previous: Option<f64> = None;
        let mut stable = 0;
        let mut iteration = 0;

        loop {
            iteration += 1;
            while self.pool.len() < target {
                self.pool.push(sampler.sample(rng));
            }
            self.pool.sort();

            let reference = interpolated_quantile(self.pool.as_slice(), settings.reference_quantile);
            let change = previous.map(|p| (reference - p).abs());
            match change {
                Some(c) if c <= settings.acceptable_error => stable += 1,
                Some(_) => stable = 0,
                None => {}
            }
            tracing::debug!(
                iteration,
                size = self.pool.len(),
                reference,
                change = change.unwrap_or(f64::NAN),
                stable,
                "monte carlo iteration"
            );

            if stable >= settings.stable_iterations {
                break;
            }
            if self.pool.len() >= settings.max_size {
                tracing::debug!(size = self.pool.len(), "monte carlo pool reached maximum size");
                break;
            }
            previous = Some(reference);
            target = settings.next_size(self.pool.len());
        }

        MonteCarloInterval::from_sorted(self.pool)
    }
}

/// Frozen empirical distribution of Monte Carlo samples.
///
/// Quantiles interpolate linearly between order statistics. The input is
/// recorded but does not move the distribution.
#[derive(Debug, Clone)]
pub struct MonteCarloInterval {
    samples: SampleBuffer,
    input: f64,
    base_viability: Viability,
    viability: Viability,
}

impl MonteCarloInterval {
    fn from_sorted(samples: SampleBuffer) -> Self {
        let slice = samples.as_slice();
        let finite = match (slice.first(), slice.last()) {
            (Some(lo), Some(hi)) => lo.is_finite() && hi.is_finite(),
            _ => false,
        };
        let viability = if finite {
            Viability::NOMINAL
        } else {
            tracing::debug!(size = slice.len(), "monte carlo pool is empty or not finite");
            Viability::CANNOT_CALCULATE
        };
        Self {
            samples,
            input: f64::NAN,
            base_viability: viability,
            viability,
        }
    }

    /// Empirical `P(X <= value)`.
    pub fn probability(&self, value: f64) -> f64 {
        self.samples.probability(value)
    }

    /// Sorted samples.
    pub fn samples(&self) -> &[f64] {
        self.samples.as_slice()
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when the pool holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl ConfidenceInterval for MonteCarloInterval {
    fn set_input(&mut self, input: f64) {
        self.input = input;
    }

    fn input(&self) -> f64 {
        self.input
    }

    fn quantile(&self, p: f64) -> f64 {
        if self.base_viability == Viability::CANNOT_CALCULATE {
            return f64::NAN;
        }
        interpolated_quantile(self.samples.as_slice(), p)
    }

    fn viability(&self) -> Viability {
        self.viability
    }
}

impl TargetedInterval for MonteCarloInterval {
    /// Score the target by the two-sided probability `|1 - 2F(target)|` at
    /// which the pool first includes it.
    fn calc_viability(&mut self, target: f64, minimum_prob: f64) {
        if !self.base_viability.is_usable() {
            return;
        }
        if outside_interval(self, target, minimum_prob) {
            self.viability = Viability::SERIOUS_PROBLEM;
            return;
        }
        let q = (1.0 - 2.0 * self.probability(target)).abs();
        self.viability = Viability::from_inclusion(q, minimum_prob);
    }
}
