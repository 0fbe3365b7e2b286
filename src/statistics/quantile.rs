//! Quantiles of sorted sample pools.
//!
//! All pools in this crate are sorted once and then queried repeatedly, so
//! quantiles are read directly from sorted order rather than by selection.

/// Quantile of an ascending slice using linear interpolation (R-7).
///
/// The position is `h = p * (n - 1)`. When `h` lands exactly on an index that
/// sample is returned; otherwise the result interpolates between the floor
/// and ceiling neighbours.
///
/// # Returns
///
/// NaN when `sorted` is empty or `p` is NaN. `p` is clamped to `[0, 1]`.
pub fn interpolated_quantile(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 || p.is_nan() {
        return f64::NAN;
    }
    if n == 1 {
        return sorted[0];
    }

    let h = (n - 1) as f64 * p.clamp(0.0, 1.0);
    let h_floor = h.floor() as usize;
    let h_frac = h - h.floor();

    if h_floor >= n - 1 {
        sorted[n - 1]
    } else if h_frac == 0.0 {
        sorted[h_floor]
    } else {
        sorted[h_floor] + h_frac * (sorted[h_floor + 1] - sorted[h_floor])
    }
}

/// Index into a sorted pool of `len` values for a "top-down" position.
///
/// Returns `round((1 - p) * len)` clamped to a valid index. Used by the
/// bootstrap interval, whose value decreases as the index grows.
pub fn descending_index(len: usize, p: f64) -> Option<usize> {
    if len == 0 || p.is_nan() {
        return None;
    }
    let pos = ((1.0 - p.clamp(0.0, 1.0)) * len as f64).round() as usize;
    Some(pos.min(len - 1))
}
