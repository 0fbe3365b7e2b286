//! # forecast-interval
//!
//! Prediction intervals for plan-versus-actual forecasting.
//!
//! Given historical `(plan, actual)` pairs, this crate fits a family of
//! estimators that correct a new plan into a forecast with lower and upper
//! bounds:
//! - Ratio-through-origin and least-squares linear models with Student-t bounds
//! - Lognormal ratio models, either Student-t or bootstrap calibrated
//! - Monte Carlo pools, sums of independent forecasts, and whole-schedule
//!   rollup simulations
//!
//! Every estimator carries a [`Viability`] score. Queries on an estimator that
//! cannot be used return NaN rather than failing.
//!
//! ## Quick Start
//!
//! ```
//! use forecast_interval::{Config, ConfidenceInterval, IntervalBuilder, IntervalKind};
//!
//! let config = Config::default();
//! let mut builder = IntervalBuilder::new(IntervalKind::LogBootstrap, &config);
//! for (plan, actual) in [(10.0, 12.0), (20.0, 18.0), (15.0, 19.0), (30.0, 33.0), (12.0, 14.0)] {
//!     builder.add_data_point(plan, actual);
//! }
//!
//! let mut interval = builder.complete();
//! interval.set_input(40.0);
//! if interval.viability().is_usable() {
//!     println!(
//!         "forecast {:.1} (70% range {:.1} to {:.1})",
//!         interval.prediction(),
//!         interval.lpi(0.7),
//!         interval.upi(0.7),
//!     );
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
mod config;
mod dataset;
mod error;
mod thread_pool;
mod types;

// Functional modules
pub mod interval;
pub mod monte_carlo;
pub mod persist;
pub mod schedule;
pub mod statistics;

// Re-exports for public API
pub use config::{Config, SimulationSettings, MAX_POOL_SIZE};
pub use dataset::{DataSet, ZeroHandling};
pub use error::{Error, Result};
pub use interval::{
    ConfidenceInterval, Interval, IntervalBuilder, IntervalKind, LinearFit, LogBootstrapInterval,
    LogCenteredInterval, LogFit, RatioInterval, RegressionInterval, TargetedInterval,
};
pub use monte_carlo::{IntervalSum, MonteCarlo, MonteCarloInterval, Sampler};
pub use persist::PersistedRecord;
pub use schedule::{
    BalancedRollup, MemberSchedule, RandomizedSchedule, RollupMetrics, ScheduleIntervals, ScheduleSimulation,
};
pub use types::{DataPoint, SimRng, Viability};
