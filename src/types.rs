//! Type aliases and common types.

use serde::{Deserialize, Serialize};

/// Random number generator used by every simulation entry point.
///
/// Seeded explicitly from [`Config::seed`](crate::Config) so that runs are
/// reproducible.
pub type SimRng = rand_xoshiro::Xoshiro256PlusPlus;

/// One historical unit of work: what was planned and what actually happened.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    /// Planned (estimated) value.
    pub plan: f64,
    /// Observed value.
    pub actual: f64,
}

impl DataPoint {
    /// Create a new data point.
    pub fn new(plan: f64, actual: f64) -> Self {
        Self { plan, actual }
    }

    /// True when either component is exactly zero.
    ///
    /// Such points cannot contribute a finite `log(actual / plan)` term.
    pub fn has_zero(&self) -> bool {
        self.plan == 0.0 || self.actual == 0.0
    }

    /// Component-wise sum of two points.
    pub fn merged(self, other: DataPoint) -> DataPoint {
        DataPoint {
            plan: self.plan + other.plan,
            actual: self.actual + other.actual,
        }
    }
}

impl From<(f64, f64)> for DataPoint {
    fn from((plan, actual): (f64, f64)) -> Self {
        Self::new(plan, actual)
    }
}

/// Heuristic trust score for a fitted interval.
///
/// This is not a p-value. Anything below [`Viability::ACCEPTABLE`] must not be
/// used for planning.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Viability(pub f64);

impl Viability {
    /// Not enough data, or the fitted statistics are not finite.
    pub const CANNOT_CALCULATE: Viability = Viability(-100.0);
    /// The fit succeeded but failed a sanity check.
    pub const SERIOUS_PROBLEM: Viability = Viability(-10.0);
    /// Lowest usable score.
    pub const ACCEPTABLE: Viability = Viability(0.0);
    /// Fully usable.
    pub const NOMINAL: Viability = Viability(5.0);

    /// Raw score.
    pub fn value(self) -> f64 {
        self.0
    }

    /// Whether an interval with this score may be used for planning.
    pub fn is_usable(self) -> bool {
        self.0 >= Self::ACCEPTABLE.0
    }

    /// Score a naive-forecast inclusion check.
    ///
    /// `q` is the two-sided probability at which the interval first includes
    /// the naive forecast. Values above `cutoff` are a serious problem;
    /// otherwise nominal is scaled down by `1 - q`.
    pub fn from_inclusion(q: f64, cutoff: f64) -> Viability {
        if !q.is_finite() {
            Self::CANNOT_CALCULATE
        } else if q > cutoff {
            Self::SERIOUS_PROBLEM
        } else {
            Viability(Self::NOMINAL.0 * (1.0 - q))
        }
    }
}

impl Default for Viability {
    fn default() -> Self {
        Self::CANNOT_CALCULATE
    }
}

impl std::fmt::Display for Viability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viability_ordering() {
        assert!(Viability::CANNOT_CALCULATE < Viability::SERIOUS_PROBLEM);
        assert!(Viability::SERIOUS_PROBLEM < Viability::ACCEPTABLE);
        assert!(Viability::ACCEPTABLE < Viability::NOMINAL);
        assert!(Viability::ACCEPTABLE.is_usable());
        assert!(!Viability::SERIOUS_PROBLEM.is_usable());
    }

    #[test]
    fn test_from_inclusion() {
        assert_eq!(Viability::from_inclusion(0.0, 0.3), Viability::NOMINAL);
        assert_eq!(Viability::from_inclusion(0.31, 0.3), Viability::SERIOUS_PROBLEM);
        assert!((Viability::from_inclusion(0.2, 0.3).value() - 4.0).abs() < 1e-12);
        assert_eq!(Viability::from_inclusion(f64::NAN, 0.3), Viability::CANNOT_CALCULATE);
    }

    #[test]
    fn test_point_merge() {
        let p = DataPoint::new(0.0, 3.0).merged(DataPoint::new(2.0, 1.0));
        assert_eq!(p, DataPoint::new(2.0, 4.0));
        assert!(DataPoint::new(0.0, 1.0).has_zero());
        assert!(!DataPoint::new(1.0, 1.0).has_zero());
    }
}
