//! Prediction-interval estimators.
//!
//! Every estimator implements [`ConfidenceInterval`]. Estimators that can
//! check a caller-supplied forecast against their bounds also implement
//! [`TargetedInterval`].
//!
//! Estimators fitted from historical data go through an
//! [`IntervalBuilder`]: points are collected first, then
//! [`IntervalBuilder::complete`] consumes the builder and returns a frozen
//! [`Interval`].

mod linear;
mod lognormal;

pub use linear::{LinearFit, RatioInterval, RegressionInterval};
pub use lognormal::{LogBootstrapInterval, LogCenteredInterval, LogFit};

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::dataset::{DataSet, ZeroHandling};
use crate::monte_carlo::MonteCarloInterval;
use crate::types::{DataPoint, Viability};

/// A fitted distribution that forecasts a value from an input.
///
/// Queries never fail. An estimator that cannot be used reports it through
/// [`viability`](ConfidenceInterval::viability) and returns NaN.
pub trait ConfidenceInterval {
    /// Record the value to be corrected or forecast.
    fn set_input(&mut self, input: f64);

    /// Current input.
    fn input(&self) -> f64;

    /// Value at cumulative probability `p` of the forecast distribution.
    fn quantile(&self, p: f64) -> f64;

    /// Trust score for this estimator.
    fn viability(&self) -> Viability;

    /// Point forecast for the current input, or NaN when not usable.
    fn prediction(&self) -> f64 {
        if self.viability().is_usable() {
            self.quantile(0.5)
        } else {
            f64::NAN
        }
    }

    /// Lower bound of the central interval covering fraction `p`.
    fn lpi(&self, p: f64) -> f64 {
        self.quantile((1.0 - p) / 2.0)
    }

    /// Upper bound of the central interval covering fraction `p`.
    fn upi(&self, p: f64) -> f64 {
        self.quantile((1.0 + p) / 2.0)
    }

    /// Draw one value from the forecast distribution.
    fn random_value(&self, rng: &mut dyn RngCore) -> f64 {
        self.quantile(rng.random::<f64>())
    }
}

/// An estimator that can be checked against an independent forecast.
pub trait TargetedInterval: ConfidenceInterval {
    /// Downgrade viability to [`Viability::SERIOUS_PROBLEM`] when `target`
    /// falls outside the central interval at `minimum_prob`.
    fn calc_viability(&mut self, target: f64, minimum_prob: f64);
}

/// True when `target` is not finite or lies outside `[lpi, upi]` at `minimum_prob`.
pub(crate) fn outside_interval<C>(ci: &C, target: f64, minimum_prob: f64) -> bool
where
    C: ConfidenceInterval + ?Sized,
{
    !target.is_finite() || target < ci.lpi(minimum_prob) || target > ci.upi(minimum_prob)
}

/// Estimator families that can be fitted from historical data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalKind {
    /// Ratio through the origin.
    Ratio,
    /// Ordinary least squares.
    Regression,
    /// Lognormal with Student-t bounds.
    LogCentered,
    /// Lognormal with bootstrap-calibrated bounds.
    LogBootstrap,
}

impl IntervalKind {
    /// Every fittable kind.
    pub const ALL: [IntervalKind; 4] = [
        IntervalKind::Ratio,
        IntervalKind::Regression,
        IntervalKind::LogCentered,
        IntervalKind::LogBootstrap,
    ];

    /// Discriminator used in persisted records.
    pub fn name(self) -> &'static str {
        match self {
            IntervalKind::Ratio => "ratio",
            IntervalKind::Regression => "regression",
            IntervalKind::LogCentered => "log_centered",
            IntervalKind::LogBootstrap => "log_bootstrap",
        }
    }

    /// Zero handling the kind's fit requires.
    pub fn zero_handling(self) -> ZeroHandling {
        match self {
            IntervalKind::Ratio | IntervalKind::Regression => ZeroHandling::Keep,
            IntervalKind::LogCentered | IntervalKind::LogBootstrap => ZeroHandling::MergeIntoPrevious,
        }
    }
}

impl std::fmt::Display for IntervalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Collects historical points for one estimator kind.
///
/// ```
/// use forecast_interval::{Config, ConfidenceInterval, IntervalBuilder, IntervalKind};
///
/// let mut builder = IntervalBuilder::new(IntervalKind::Ratio, &Config::default());
/// builder.add_data_point(1.0, 1.0);
/// builder.add_data_point(2.0, 2.0);
/// builder.add_data_point(3.0, 3.0);
///
/// let mut interval = builder.complete();
/// interval.set_input(4.0);
/// assert!((interval.prediction() - 4.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct IntervalBuilder {
    kind: IntervalKind,
    data: DataSet,
    config: Config,
}

impl IntervalBuilder {
    /// Start collecting points for `kind`.
    pub fn new(kind: IntervalKind, config: &Config) -> Self {
        Self {
            kind,
            data: DataSet::with_zero_handling(kind.zero_handling()),
            config: config.clone(),
        }
    }

    /// Kind being collected.
    pub fn kind(&self) -> IntervalKind {
        self.kind
    }

    /// Add one historical point.
    pub fn add_data_point(&mut self, plan: f64, actual: f64) {
        self.data.add_data_point(plan, actual);
    }

    /// Add one historical point.
    pub fn add(&mut self, point: DataPoint) {
        self.data.add(point);
    }

    /// Points collected so far, after any zero merging.
    pub fn data(&self) -> &DataSet {
        &self.data
    }

    /// Fit the estimator. The collected data cannot change afterwards.
    pub fn complete(self) -> Interval {
        let points = self.data.points();
        let interval = match self.kind {
            IntervalKind::Ratio => Interval::Ratio(RatioInterval::fit(points)),
            IntervalKind::Regression => {
                Interval::Regression(RegressionInterval::fit(points, self.config.regression_cutoff))
            }
            IntervalKind::LogCentered => Interval::LogCentered(LogCenteredInterval::fit(points)),
            IntervalKind::LogBootstrap => Interval::LogBootstrap(LogBootstrapInterval::fit(
                points,
                self.config.bootstrap_samples,
                self.config.lognormal_cutoff,
                self.config.seed,
            )),
        };
        tracing::debug!(
            kind = %self.kind,
            points = points.len(),
            viability = %interval.viability(),
            "interval fitted"
        );
        interval
    }
}

impl Extend<DataPoint> for IntervalBuilder {
    fn extend<I: IntoIterator<Item = DataPoint>>(&mut self, iter: I) {
        self.data.extend(iter);
    }
}

/// Any fitted estimator.
#[derive(Debug, Clone)]
pub enum Interval {
    /// Ratio through the origin.
    Ratio(RatioInterval),
    /// Ordinary least squares.
    Regression(RegressionInterval),
    /// Lognormal with Student-t bounds.
    LogCentered(LogCenteredInterval),
    /// Lognormal with bootstrap-calibrated bounds.
    LogBootstrap(LogBootstrapInterval),
    /// Empirical distribution of simulated or collected samples.
    MonteCarlo(MonteCarloInterval),
}

impl Interval {
    /// Fittable kind, or `None` for Monte Carlo results.
    pub fn kind(&self) -> Option<IntervalKind> {
        match self {
            Interval::Ratio(_) => Some(IntervalKind::Ratio),
            Interval::Regression(_) => Some(IntervalKind::Regression),
            Interval::LogCentered(_) => Some(IntervalKind::LogCentered),
            Interval::LogBootstrap(_) => Some(IntervalKind::LogBootstrap),
            Interval::MonteCarlo(_) => None,
        }
    }

    /// Borrow as a targeted estimator, if this kind supports target checks.
    pub fn as_targeted_mut(&mut self) -> Option<&mut dyn TargetedInterval> {
        match self {
            Interval::Ratio(ci) => Some(ci),
            Interval::Regression(ci) => Some(ci),
            Interval::MonteCarlo(ci) => Some(ci),
            Interval::LogCentered(_) | Interval::LogBootstrap(_) => None,
        }
    }

    fn inner(&self) -> &dyn ConfidenceInterval {
        match self {
            Interval::Ratio(ci) => ci,
            Interval::Regression(ci) => ci,
            Interval::LogCentered(ci) => ci,
            Interval::LogBootstrap(ci) => ci,
            Interval::MonteCarlo(ci) => ci,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn ConfidenceInterval {
        match self {
            Interval::Ratio(ci) => ci,
            Interval::Regression(ci) => ci,
            Interval::LogCentered(ci) => ci,
            Interval::LogBootstrap(ci) => ci,
            Interval::MonteCarlo(ci) => ci,
        }
    }
}

impl ConfidenceInterval for Interval {
    fn set_input(&mut self, input: f64) {
        self.inner_mut().set_input(input);
    }

    fn input(&self) -> f64 {
        self.inner().input()
    }

    fn quantile(&self, p: f64) -> f64 {
        self.inner().quantile(p)
    }

    fn viability(&self) -> Viability {
        self.inner().viability()
    }

    fn prediction(&self) -> f64 {
        self.inner().prediction()
    }
}

impl From<MonteCarloInterval> for Interval {
    fn from(ci: MonteCarloInterval) -> Self {
        Interval::MonteCarlo(ci)
    }
}
