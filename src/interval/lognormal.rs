//! Lognormal prediction intervals for `actual / plan` ratios.
//!
//! Both variants fit a plan-weighted mean and standard deviation of
//! `log(actual / plan)`:
//!
//! - [`LogCenteredInterval`] reads bounds straight off a Student-t
//!   distribution on the log scale. Wider, but centered on the median ratio.
//! - [`LogBootstrapInterval`] calibrates the bounds with a parametric
//!   bootstrap of the Studentized log-mean statistic. Tighter, and centered
//!   on the mean ratio `exp(μ + σ²/2)`.

use serde::{Deserialize, Serialize};

use crate::statistics::{descending_index, insertion_index, studentized_bootstrap, t_quantile};
use crate::types::{DataPoint, Viability};

use super::ConfidenceInterval;

/// Fitted parameters of a lognormal ratio model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogFit {
    /// Plan-weighted mean of `log(actual / plan)`.
    #[serde(with = "crate::persist::non_finite")]
    pub logmean: f64,
    /// Plan-weighted standard deviation of `log(actual / plan)`.
    #[serde(with = "crate::persist::non_finite")]
    pub logstd: f64,
    /// `Σactual / Σplan`.
    #[serde(with = "crate::persist::non_finite")]
    pub ratio: f64,
    /// Number of points fitted.
    pub n: usize,
}

impl LogFit {
    /// Fit a completed data set.
    ///
    /// Weights are the plan values; the variance uses `n - 1` degrees of
    /// freedom.
    pub fn fit(points: &[DataPoint]) -> Self {
        let n = points.len();
        let total_plan: f64 = points.iter().map(|p| p.plan).sum();
        let total_actual: f64 = points.iter().map(|p| p.actual).sum();

        let logmean = points
            .iter()
            .map(|p| p.plan * (p.actual / p.plan).ln())
            .sum::<f64>()
            / total_plan;

        let logstd = if n > 1 {
            let weighted_ss: f64 = points
                .iter()
                .map(|p| p.plan * ((p.actual / p.plan).ln() - logmean).powi(2))
                .sum();
            (weighted_ss / total_plan * n as f64 / (n - 1) as f64).sqrt()
        } else {
            f64::NAN
        };

        Self {
            logmean,
            logstd,
            ratio: total_actual / total_plan,
            n,
        }
    }

    /// Whether enough data was fitted and the statistics are finite.
    pub fn is_valid(&self) -> bool {
        self.n >= 3 && self.logmean.is_finite() && self.logstd.is_finite()
    }

    fn base_viability(&self) -> Viability {
        if self.is_valid() {
            Viability::NOMINAL
        } else {
            tracing::debug!(
                n = self.n,
                logmean = self.logmean,
                logstd = self.logstd,
                "lognormal interval cannot be calculated"
            );
            Viability::CANNOT_CALCULATE
        }
    }
}

/// Lognormal interval with Student-t bounds on the log scale.
///
/// `quantile(p) = input · exp(μ + t_{p, n-2} · σ)`.
#[derive(Debug, Clone)]
pub struct LogCenteredInterval {
    fit: LogFit,
    input: f64,
    viability: Viability,
}

impl LogCenteredInterval {
    /// Fit a completed data set.
    pub fn fit(points: &[DataPoint]) -> Self {
        Self::from_fit(LogFit::fit(points))
    }

    /// Rebuild from previously fitted parameters.
    pub fn from_fit(fit: LogFit) -> Self {
        Self {
            viability: fit.base_viability(),
            fit,
            input: 1.0,
        }
    }

    /// Fitted parameters.
    pub fn parameters(&self) -> &LogFit {
        &self.fit
    }

    /// Historical ratio `Σactual / Σplan`.
    pub fn ratio(&self) -> f64 {
        self.fit.ratio
    }

    /// Re-center the interval on a new ratio, keeping its spread.
    ///
    /// Non-positive or non-finite ratios are ignored.
    pub fn recenter(&mut self, ratio: f64) {
        if ratio.is_finite() && ratio > 0.0 {
            self.fit.logmean = ratio.ln();
        }
    }
}

impl ConfidenceInterval for LogCenteredInterval {
    fn set_input(&mut self, input: f64) {
        self.input = input;
    }

    fn input(&self) -> f64 {
        self.input
    }

    fn quantile(&self, p: f64) -> f64 {
        if !self.viability.is_usable() {
            return f64::NAN;
        }
        let df = self.fit.n as f64 - 2.0;
        let log_range = t_quantile(p, df) * self.fit.logstd;
        self.input * (self.fit.logmean + log_range).exp()
    }

    fn viability(&self) -> Viability {
        self.viability
    }
}

/// Lognormal interval calibrated by a parametric bootstrap.
///
/// With `base = μ + σ²/2` and `rational = sqrt(σ²(1 + σ²/2) / n)`, the
/// quantile at `p` is `input · exp(base - t · rational)` where `t` is the
/// sorted bootstrap replicate at position `round((1 - p) · len)`.
#[derive(Debug, Clone)]
pub struct LogBootstrapInterval {
    fit: LogFit,
    input: f64,
    bootstrap: Vec<f64>,
    base: f64,
    rational: f64,
    cutoff: f64,
    viability: Viability,
}

impl LogBootstrapInterval {
    /// Fit a completed data set.
    ///
    /// # Arguments
    ///
    /// * `points` - Completed data set
    /// * `samples` - Number of bootstrap replicates
    /// * `cutoff` - Viability cutoff probability
    /// * `seed` - Bootstrap seed
    pub fn fit(points: &[DataPoint], samples: usize, cutoff: f64, seed: u64) -> Self {
        Self::from_fit(LogFit::fit(points), samples, cutoff, seed)
    }

    /// Rebuild from previously fitted parameters, regenerating the bootstrap.
    pub fn from_fit(fit: LogFit, samples: usize, cutoff: f64, seed: u64) -> Self {
        let sigma_sq = fit.logstd * fit.logstd;
        let mut interval = Self {
            fit,
            input: 1.0,
            bootstrap: Vec::new(),
            base: fit.logmean + sigma_sq / 2.0,
            rational: (sigma_sq * (1.0 + sigma_sq / 2.0) / fit.n as f64).sqrt(),
            cutoff,
            viability: fit.base_viability(),
        };
        if interval.viability.is_usable() {
            interval.bootstrap = studentized_bootstrap(fit.n, fit.logstd, samples, seed);
            interval.viability = interval.ratio_viability();
        }
        interval
    }

    /// Fitted parameters.
    pub fn parameters(&self) -> &LogFit {
        &self.fit
    }

    /// Historical ratio `Σactual / Σplan`.
    pub fn ratio(&self) -> f64 {
        self.fit.ratio
    }

    /// Sorted bootstrap replicates.
    pub fn bootstrap_samples(&self) -> &[f64] {
        &self.bootstrap
    }

    /// Score how far into the interval the naive ratio forecast sits.
    fn ratio_viability(&self) -> Viability {
        if self.bootstrap.is_empty() {
            return Viability::CANNOT_CALCULATE;
        }
        let offset = self.base - self.fit.ratio.ln();
        let q = if self.rational == 0.0 {
            if offset.abs() <= 1e-12 {
                0.0
            } else {
                1.0
            }
        } else {
            // Invert input · exp(base - t · rational) = input · ratio
            let t = offset / self.rational;
            let below = insertion_index(&self.bootstrap, t) as f64 / self.bootstrap.len() as f64;
            (1.0 - 2.0 * below).abs()
        };
        let viability = Viability::from_inclusion(q, self.cutoff);
        if !viability.is_usable() {
            tracing::debug!(
                ratio = self.fit.ratio,
                q,
                cutoff = self.cutoff,
                "bootstrap interval excludes the ratio forecast"
            );
        }
        viability
    }
}

impl ConfidenceInterval for LogBootstrapInterval {
    fn set_input(&mut self, input: f64) {
        self.input = input;
    }

    fn input(&self) -> f64 {
        self.input
    }

    fn quantile(&self, p: f64) -> f64 {
        if self.viability == Viability::CANNOT_CALCULATE {
            return f64::NAN;
        }
        match descending_index(self.bootstrap.len(), p) {
            Some(pos) => self.input * (self.base - self.bootstrap[pos] * self.rational).exp(),
            None => f64::NAN,
        }
    }

    fn viability(&self) -> Viability {
        self.viability
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history() -> Vec<DataPoint> {
        [
            (10.0, 12.0),
            (20.0, 18.0),
            (15.0, 19.0),
            (30.0, 33.0),
            (12.0, 14.0),
            (25.0, 24.0),
            (8.0, 11.0),
            (40.0, 46.0),
        ]
        .into_iter()
        .map(DataPoint::from)
        .collect()
    }

    #[test]
    fn test_log_fit_uniform_ratio() {
        let points: Vec<DataPoint> = [(1.0, 2.0), (3.0, 6.0), (5.0, 10.0)]
            .into_iter()
            .map(DataPoint::from)
            .collect();
        let fit = LogFit::fit(&points);
        assert!((fit.logmean - 2.0_f64.ln()).abs() < 1e-12);
        assert!(fit.logstd.abs() < 1e-12);
        assert!((fit.ratio - 2.0).abs() < 1e-12);
        assert!(fit.is_valid());
    }

    #[test]
    fn test_log_fit_weights_by_plan() {
        // ratios 1 and e, plan weights 3 and 1
        let points = vec![DataPoint::new(3.0, 3.0), DataPoint::new(1.0, std::f64::consts::E)];
        let fit = LogFit::fit(&points);
        assert!((fit.logmean - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_log_fit_weighted_spread() {
        // logs 0 and 1 with weights 1 and 3: m = 0.75, Σw(l-m)² = 0.75
        let points = vec![DataPoint::new(1.0, 1.0), DataPoint::new(3.0, 3.0 * std::f64::consts::E)];
        let fit = LogFit::fit(&points);
        assert!((fit.logmean - 0.75).abs() < 1e-12);
        // 0.75 / 4 * 2 / 1
        assert!((fit.logstd - 0.375_f64.sqrt()).abs() < 1e-12);
        assert!((fit.ratio - (1.0 + 3.0 * std::f64::consts::E) / 4.0).abs() < 1e-12);
        assert_eq!(fit.n, 2);
        assert!(!fit.is_valid());
    }

    #[test]
    fn test_centered_quantiles() {
        let mut ci = LogCenteredInterval::fit(&history());
        ci.set_input(100.0);
        let fit = *ci.parameters();
        assert!((ci.prediction() - 100.0 * fit.logmean.exp()).abs() < 1e-9);

        let expected_upi = 100.0 * (fit.logmean + t_quantile(0.85, 6.0) * fit.logstd).exp();
        assert!((ci.upi(0.7) - expected_upi).abs() < 1e-9);
        assert!(ci.lpi(0.7) < ci.prediction());
        assert!(ci.upi(0.7) > ci.prediction());
    }

    #[test]
    fn test_centered_too_few_points() {
        let ci = LogCenteredInterval::fit(&history()[..2]);
        assert_eq!(ci.viability(), Viability::CANNOT_CALCULATE);
        assert!(ci.prediction().is_nan());
        assert!(ci.quantile(0.9).is_nan());
    }

    #[test]
    fn test_recenter() {
        let mut ci = LogCenteredInterval::fit(&history());
        ci.set_input(10.0);
        let width = ci.upi(0.7) / ci.lpi(0.7);
        ci.recenter(2.0);
        assert!((ci.prediction() - 20.0).abs() < 1e-9);
        assert!((ci.upi(0.7) / ci.lpi(0.7) - width).abs() < 1e-9);
        ci.recenter(-1.0);
        assert!((ci.prediction() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_bootstrap_brackets_prediction() {
        let mut ci = LogBootstrapInterval::fit(&history(), 2000, 0.5, 7);
        assert!(ci.viability().is_usable(), "viability = {}", ci.viability());
        ci.set_input(50.0);
        let pred = ci.prediction();
        for p in [0.0, 0.3, 0.7, 0.9, 1.0] {
            assert!(ci.lpi(p) <= pred);
            assert!(ci.upi(p) >= pred);
        }
        assert!(ci.upi(0.9) - ci.lpi(0.9) > ci.upi(0.5) - ci.lpi(0.5));
    }

    #[test]
    fn test_bootstrap_is_tighter_than_centered() {
        let mut centered = LogCenteredInterval::fit(&history());
        let mut boot = LogBootstrapInterval::fit(&history(), 2000, 0.5, 7);
        centered.set_input(50.0);
        boot.set_input(50.0);
        let centered_width = centered.upi(0.7) - centered.lpi(0.7);
        let boot_width = boot.upi(0.7) - boot.lpi(0.7);
        assert!(boot_width < centered_width);
    }

    #[test]
    fn test_bootstrap_zero_spread_is_nominal() {
        let points: Vec<DataPoint> = [(1.0, 2.0), (3.0, 6.0), (5.0, 10.0)]
            .into_iter()
            .map(DataPoint::from)
            .collect();
        let mut ci = LogBootstrapInterval::fit(&points, 200, 0.5, 1);
        assert_eq!(ci.viability(), Viability::NOMINAL);
        ci.set_input(4.0);
        assert!((ci.prediction() - 8.0).abs() < 1e-9);
        assert!((ci.upi(0.9) - 8.0).abs() < 1e-9);
    }

    fn inclusion(ci: &LogBootstrapInterval) -> f64 {
        let fit = ci.parameters();
        let sigma_sq = fit.logstd * fit.logstd;
        let base = fit.logmean + sigma_sq / 2.0;
        let rational = (sigma_sq * (1.0 + sigma_sq / 2.0) / fit.n as f64).sqrt();
        let t = (base - fit.ratio.ln()) / rational;
        let samples = ci.bootstrap_samples();
        let below = insertion_index(samples, t) as f64 / samples.len() as f64;
        (1.0 - 2.0 * below).abs()
    }

    #[test]
    fn test_bootstrap_viability_scales_with_inclusion() {
        let ci = LogBootstrapInterval::fit(&history(), 2000, 0.5, 7);
        let q = inclusion(&ci);
        assert!(q <= 0.5, "q = {q}");
        let expected = Viability::NOMINAL.value() * (1.0 - q);
        assert!((ci.viability().value() - expected).abs() < 1e-12);
        assert!(ci.viability().value() > 0.0);
        assert!(ci.viability().value() <= Viability::NOMINAL.value());
    }

    #[test]
    fn test_bootstrap_mean_far_from_ratio_is_serious() {
        // ratio of sums is exactly 1 while exp(μ + σ²/2) is far above it
        let points: Vec<DataPoint> = (0..40)
            .map(|i| DataPoint::new(1.0, if i % 2 == 0 { 0.01 } else { 1.99 }))
            .collect();
        let mut ci = LogBootstrapInterval::fit(&points, 2000, 0.5, 11);
        assert!((ci.ratio() - 1.0).abs() < 1e-12);
        let q = inclusion(&ci);
        assert!(q > 0.5, "q = {q}");
        assert_eq!(ci.viability(), Viability::SERIOUS_PROBLEM);

        // bounds stay available for a serious problem
        ci.set_input(10.0);
        assert!(ci.upi(0.7).is_finite());
        assert!(ci.prediction().is_nan());
    }

    #[test]
    fn test_bootstrap_too_few_points() {
        let ci = LogBootstrapInterval::fit(&history()[..2], 200, 0.5, 1);
        assert_eq!(ci.viability(), Viability::CANNOT_CALCULATE);
        assert!(ci.bootstrap_samples().is_empty());
        assert!(ci.upi(0.7).is_nan());
    }
}
