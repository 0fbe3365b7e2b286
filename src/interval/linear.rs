//! Linear prediction intervals: ratio-through-origin and least squares.
//!
//! Both variants fit `actual = beta0 + beta1 * plan` and build a classical
//! Student-t prediction interval around the fitted line:
//!
//! ```text
//! range(p) = t_{0.5 + r/2, n-2} · s · sqrt(1 + 1/n + (x - x̄)² / Sxx),   r = 2·|0.5 - p|
//! ```
//!
//! where `s` is the residual standard deviation.

use std::cell::Cell;

use serde::{Deserialize, Serialize};

use crate::statistics::{t_quantile, t_two_sided_probability};
use crate::types::{DataPoint, Viability};

use super::{outside_interval, ConfidenceInterval, TargetedInterval};

/// Fitted parameters of a straight-line model.
///
/// These are exactly the quantities that are persisted; everything else is
/// derived from them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    /// Intercept.
    #[serde(with = "crate::persist::non_finite")]
    pub beta0: f64,
    /// Slope.
    #[serde(with = "crate::persist::non_finite")]
    pub beta1: f64,
    /// Number of points fitted.
    pub n: usize,
    /// Mean plan value.
    #[serde(with = "crate::persist::non_finite")]
    pub x_avg: f64,
    /// `Σ(x - x̄)²`.
    #[serde(with = "crate::persist::non_finite")]
    pub sxx: f64,
    /// Residual variance `Σ(y - beta0 - beta1·x)² / (n - 2)`.
    #[serde(with = "crate::persist::non_finite")]
    pub variance: f64,
}

impl LinearFit {
    /// Fit `actual = beta1 * plan` with `beta1 = Σy / Σx`.
    pub fn ratio_through_origin(points: &[DataPoint]) -> Self {
        let sum_x: f64 = points.iter().map(|p| p.plan).sum();
        let sum_y: f64 = points.iter().map(|p| p.actual).sum();
        Self::with_coefficients(points, 0.0, sum_y / sum_x)
    }

    /// Ordinary least squares fit.
    pub fn least_squares(points: &[DataPoint]) -> Self {
        let n = points.len() as f64;
        let x_avg = points.iter().map(|p| p.plan).sum::<f64>() / n;
        let y_avg = points.iter().map(|p| p.actual).sum::<f64>() / n;
        let sum_xy: f64 = points.iter().map(|p| p.plan * p.actual).sum();
        let sum_xx: f64 = points.iter().map(|p| p.plan * p.plan).sum();

        let beta1 = (sum_xy - n * x_avg * y_avg) / (sum_xx - n * x_avg * x_avg);
        let beta0 = y_avg - beta1 * x_avg;
        Self::with_coefficients(points, beta0, beta1)
    }

    fn with_coefficients(points: &[DataPoint], beta0: f64, beta1: f64) -> Self {
        let n = points.len();
        let x_avg = points.iter().map(|p| p.plan).sum::<f64>() / n as f64;
        let sxx = points.iter().map(|p| (p.plan - x_avg).powi(2)).sum();
        let variance = if n > 2 {
            points
                .iter()
                .map(|p| (p.actual - beta0 - beta1 * p.plan).powi(2))
                .sum::<f64>()
                / (n - 2) as f64
        } else {
            f64::NAN
        };

        Self {
            beta0,
            beta1,
            n,
            x_avg,
            sxx,
            variance,
        }
    }

    /// Residual standard deviation.
    pub fn stddev(&self) -> f64 {
        self.variance.sqrt()
    }

    /// Degrees of freedom of the prediction interval.
    pub fn degrees_of_freedom(&self) -> f64 {
        self.n as f64 - 2.0
    }

    /// Whether enough data was fitted and the statistics are finite.
    pub fn is_valid(&self) -> bool {
        self.n >= 3
            && self.beta0.is_finite()
            && self.beta1.is_finite()
            && self.stddev().is_finite()
    }

    /// Point on the fitted line at `x`.
    pub fn projection(&self, x: f64) -> f64 {
        self.beta0 + self.beta1 * x
    }

    /// `sqrt(1 + 1/n + (x - x̄)² / Sxx)`.
    pub fn radical(&self, x: f64) -> f64 {
        let dx = x - self.x_avg;
        let leverage = if dx == 0.0 { 0.0 } else { dx * dx / self.sxx };
        (1.0 + 1.0 / self.n as f64 + leverage).sqrt()
    }

    /// Ratio `Σy / Σx` of the fitted data, recovered from the line through
    /// the centroid.
    pub fn naive_ratio(&self) -> f64 {
        self.projection(self.x_avg) / self.x_avg
    }

    fn base_viability(&self) -> Viability {
        if self.is_valid() {
            Viability::NOMINAL
        } else {
            Viability::CANNOT_CALCULATE
        }
    }
}

/// Input-dependent state shared by both linear variants.
#[derive(Debug, Clone)]
struct LinearState {
    fit: LinearFit,
    input: f64,
    projection: f64,
    radical: f64,
    /// Last `(r, range)` pair; cleared when the input changes.
    range_cache: Cell<Option<(f64, f64)>>,
}

impl LinearState {
    fn new(fit: LinearFit) -> Self {
        let mut state = Self {
            fit,
            input: f64::NAN,
            projection: f64::NAN,
            radical: f64::NAN,
            range_cache: Cell::new(None),
        };
        state.set_input(fit.x_avg);
        state
    }

    fn set_input(&mut self, x: f64) {
        self.input = x;
        self.projection = self.fit.projection(x);
        self.radical = self.fit.radical(x);
        self.range_cache.set(None);
    }

    fn range(&self, r: f64) -> f64 {
        if let Some((cached_r, range)) = self.range_cache.get() {
            if cached_r == r {
                return range;
            }
        }
        let t = t_quantile(0.5 + r / 2.0, self.fit.degrees_of_freedom());
        let range = t * self.fit.stddev() * self.radical;
        self.range_cache.set(Some((r, range)));
        range
    }

    fn quantile(&self, p: f64) -> f64 {
        let r = 2.0 * (0.5 - p).abs();
        if r == 0.0 {
            return self.projection;
        }
        let range = self.range(r);
        if p > 0.5 {
            self.projection + range
        } else {
            self.projection - range
        }
    }

    /// Two-sided probability at which the interval first includes `value`.
    fn inclusion_probability(&self, value: f64) -> f64 {
        let diff = value - self.projection;
        if diff == 0.0 {
            return 0.0;
        }
        let scale = self.fit.stddev() * self.radical;
        if scale == 0.0 {
            return 1.0;
        }
        t_two_sided_probability(diff / scale, self.fit.degrees_of_freedom())
    }
}

/// Prediction interval for a strictly proportional relationship.
///
/// Viability is [`Viability::NOMINAL`] whenever at least three points were
/// fitted and the residual spread is finite.
#[derive(Debug, Clone)]
pub struct RatioInterval {
    state: LinearState,
    base_viability: Viability,
    viability: Viability,
}

impl RatioInterval {
    /// Fit the ratio model to a completed data set.
    pub fn fit(points: &[DataPoint]) -> Self {
        Self::from_fit(LinearFit::ratio_through_origin(points))
    }

    /// Rebuild from previously fitted parameters.
    pub fn from_fit(fit: LinearFit) -> Self {
        let viability = fit.base_viability();
        if !viability.is_usable() {
            tracing::debug!(n = fit.n, variance = fit.variance, "ratio interval cannot be calculated");
        }
        Self {
            state: LinearState::new(fit),
            base_viability: viability,
            viability,
        }
    }

    /// Fitted parameters.
    pub fn parameters(&self) -> &LinearFit {
        &self.state.fit
    }
}

impl ConfidenceInterval for RatioInterval {
    fn set_input(&mut self, input: f64) {
        self.state.set_input(input);
        self.viability = self.base_viability;
    }

    fn input(&self) -> f64 {
        self.state.input
    }

    fn prediction(&self) -> f64 {
        if self.viability.is_usable() {
            self.state.projection
        } else {
            f64::NAN
        }
    }

    fn quantile(&self, p: f64) -> f64 {
        if self.base_viability == Viability::CANNOT_CALCULATE {
            return f64::NAN;
        }
        self.state.quantile(p)
    }

    fn viability(&self) -> Viability {
        self.viability
    }
}

impl TargetedInterval for RatioInterval {
    fn calc_viability(&mut self, target: f64, minimum_prob: f64) {
        if self.viability.is_usable() && outside_interval(self, target, minimum_prob) {
            self.viability = Viability::SERIOUS_PROBLEM;
        }
    }
}

/// Prediction interval around an ordinary least-squares line.
///
/// Viability is re-derived for every input: the interval is compared with
/// the naive forecast `input · Σy/Σx`, and the two-sided probability `q` at
/// which the interval first includes that forecast must not exceed the
/// configured cutoff.
#[derive(Debug, Clone)]
pub struct RegressionInterval {
    state: LinearState,
    cutoff: f64,
    viability: Viability,
}

impl RegressionInterval {
    /// Fit the least-squares model to a completed data set.
    pub fn fit(points: &[DataPoint], cutoff: f64) -> Self {
        Self::from_fit(LinearFit::least_squares(points), cutoff)
    }

    /// Rebuild from previously fitted parameters.
    pub fn from_fit(fit: LinearFit, cutoff: f64) -> Self {
        let mut interval = Self {
            state: LinearState::new(fit),
            cutoff,
            viability: Viability::CANNOT_CALCULATE,
        };
        interval.recalc_viability();
        interval
    }

    /// Fitted parameters.
    pub fn parameters(&self) -> &LinearFit {
        &self.state.fit
    }

    /// Viability cutoff probability in effect.
    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    fn recalc_viability(&mut self) {
        let fit = &self.state.fit;
        if !fit.is_valid() {
            tracing::debug!(n = fit.n, variance = fit.variance, "regression interval cannot be calculated");
            self.viability = Viability::CANNOT_CALCULATE;
            return;
        }
        let naive = fit.naive_ratio() * self.state.input;
        let q = self.state.inclusion_probability(naive);
        self.viability = Viability::from_inclusion(q, self.cutoff);
        if !self.viability.is_usable() {
            tracing::debug!(
                input = self.state.input,
                naive_forecast = naive,
                q,
                cutoff = self.cutoff,
                "regression interval disagrees with ratio forecast"
            );
        }
    }
}

impl ConfidenceInterval for RegressionInterval {
    fn set_input(&mut self, input: f64) {
        self.state.set_input(input);
        self.recalc_viability();
    }

    fn input(&self) -> f64 {
        self.state.input
    }

    fn prediction(&self) -> f64 {
        if self.viability.is_usable() {
            self.state.projection
        } else {
            f64::NAN
        }
    }

    fn quantile(&self, p: f64) -> f64 {
        if self.viability == Viability::CANNOT_CALCULATE {
            return f64::NAN;
        }
        self.state.quantile(p)
    }

    fn viability(&self) -> Viability {
        self.viability
    }
}

impl TargetedInterval for RegressionInterval {
    fn calc_viability(&mut self, target: f64, minimum_prob: f64) {
        if self.viability.is_usable() && outside_interval(self, target, minimum_prob) {
            self.viability = Viability::SERIOUS_PROBLEM;
        }
    }
}
