//! Statistical building blocks shared by the interval estimators.
//!
//! - Sorted sample pools with empirical CDF lookup
//! - Interpolated and descending-index quantiles
//! - Student-t quantiles and probabilities
//! - Parametric bootstrap of Studentized lognormal statistics

mod bootstrap;
mod buffer;
mod distribution;
mod quantile;

pub use bootstrap::{counter_rng_seed, studentized_bootstrap};
pub use buffer::{insertion_index, SampleBuffer};
pub use distribution::{t_cdf, t_quantile, t_two_sided_probability};
pub use quantile::{descending_index, interpolated_quantile};
