//! Student-t helpers built on `statrs`.

use statrs::distribution::{ContinuousCDF, StudentsT};

fn standard_t(df: f64) -> Option<StudentsT> {
    if !(df.is_finite() && df > 0.0) {
        return None;
    }
    StudentsT::new(0.0, 1.0, df).ok()
}

/// Quantile (inverse CDF) of the standard Student-t distribution.
///
/// Returns NaN for invalid degrees of freedom or `p` outside `[0, 1]`.
pub fn t_quantile(p: f64, df: f64) -> f64 {
    if !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if p == 0.5 {
        return 0.0;
    }
    match standard_t(df) {
        Some(dist) => dist.inverse_cdf(p),
        None => f64::NAN,
    }
}

/// Cumulative distribution function of the standard Student-t distribution.
pub fn t_cdf(x: f64, df: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    match standard_t(df) {
        Some(dist) => dist.cdf(x),
        None => f64::NAN,
    }
}

/// Two-sided probability at which a central t interval first reaches `t`.
///
/// This is `2 * cdf(|t|) - 1`: the confidence fraction whose interval
/// boundary sits exactly `|t|` standard errors from the centre.
pub fn t_two_sided_probability(t: f64, df: f64) -> f64 {
    2.0 * t_cdf(t.abs(), df) - 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_t_quantile_known_values() {
        // t_{0.975, 10} = 2.228
        assert!((t_quantile(0.975, 10.0) - 2.228).abs() < 1e-3);
        // t_{0.95, 1} = 6.314
        assert!((t_quantile(0.95, 1.0) - 6.314).abs() < 1e-3);
        assert_eq!(t_quantile(0.5, 4.0), 0.0);
    }

    #[test]
    fn test_t_quantile_symmetric() {
        let lo = t_quantile(0.1, 5.0);
        let hi = t_quantile(0.9, 5.0);
        assert!((lo + hi).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(t_quantile(0.9, 0.0).is_nan());
        assert!(t_quantile(1.5, 3.0).is_nan());
        assert!(t_cdf(1.0, -1.0).is_nan());
    }

    #[test]
    fn test_two_sided_inverts_quantile() {
        let df = 7.0;
        let t = t_quantile(0.5 + 0.7 / 2.0, df);
        assert!((t_two_sided_probability(t, df) - 0.7).abs() < 1e-6);
        assert!((t_two_sided_probability(-t, df) - 0.7).abs() < 1e-6);
    }
}
