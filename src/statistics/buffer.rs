//! Growable, sortable buffer of floating-point samples.
//!
//! Monte Carlo pools are built by appending thousands of draws and are then
//! sorted once and queried by position. The buffer doubles its backing
//! storage when full and never shrinks.

/// Initial backing capacity for an empty buffer.
const MIN_CAPACITY: usize = 16;

/// A growable buffer of `f64` samples with order-statistic lookups.
#[derive(Debug, Clone, Default)]
pub struct SampleBuffer {
    values: Vec<f64>,
    sorted: bool,
}

impl SampleBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty buffer with room for `capacity` samples.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
            sorted: false,
        }
    }

    /// Append a sample.
    pub fn push(&mut self, value: f64) {
        if self.values.len() == self.values.capacity() {
            // Double the backing size.
            let extra = self.values.capacity().max(MIN_CAPACITY);
            self.values.reserve_exact(extra);
        }
        self.values.push(value);
        self.sorted = false;
    }

    /// Number of samples held.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when no samples have been added.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Current backing capacity.
    pub fn capacity(&self) -> usize {
        self.values.capacity()
    }

    /// Sample at position `i`, or NaN when out of range.
    pub fn get(&self, i: usize) -> f64 {
        self.values.get(i).copied().unwrap_or(f64::NAN)
    }

    /// Sort ascending using IEEE 754 total order.
    pub fn sort(&mut self) {
        if !self.sorted {
            self.values.sort_unstable_by(|a, b| a.total_cmp(b));
            self.sorted = true;
        }
    }

    /// Whether the buffer is known to be in ascending order.
    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    /// Insertion position of `value` in a sorted buffer.
    ///
    /// Returns the index of the first sample that is not less than `value`:
    /// the position of an exact match when present, otherwise the position
    /// where `value` would be inserted. The result is monotone in `value`.
    pub fn find(&self, value: f64) -> usize {
        debug_assert!(self.sorted, "find() requires a sorted buffer");
        insertion_index(&self.values, value)
    }

    /// Empirical probability `P(X <= value)` estimated as `find(value) / len`.
    pub fn probability(&self, value: f64) -> f64 {
        if self.values.is_empty() {
            return f64::NAN;
        }
        self.find(value) as f64 / self.values.len() as f64
    }

    /// Borrow the samples.
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}

impl From<Vec<f64>> for SampleBuffer {
    fn from(values: Vec<f64>) -> Self {
        Self {
            values,
            sorted: false,
        }
    }
}

impl Extend<f64> for SampleBuffer {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for value in iter {
            self.push(value);
        }
    }
}

/// Binary search for the insertion position of `value` in an ascending slice.
pub fn insertion_index(sorted: &[f64], value: f64) -> usize {
    sorted.partition_point(|x| x.total_cmp(&value).is_lt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted_buffer(values: &[f64]) -> SampleBuffer {
        let mut buf: SampleBuffer = values.to_vec().into();
        buf.sort();
        buf
    }

    #[test]
    fn test_find_exact_and_insertion() {
        let buf = sorted_buffer(&[1.0, 3.0, 5.0, 7.0]);
        assert_eq!(buf.find(5.0), 2);
        assert_eq!(buf.find(4.0), 2);
        assert_eq!(buf.find(0.0), 0);
        assert_eq!(buf.find(8.0), 4);
    }

    #[test]
    fn test_find_monotone() {
        let buf = sorted_buffer(&[1.0, 3.0, 5.0, 7.0]);
        let mut last = 0;
        for i in 0..90 {
            let pos = buf.find(i as f64 * 0.1);
            assert!(pos >= last);
            last = pos;
        }
    }

    #[test]
    fn test_get_out_of_range_is_nan() {
        let buf = sorted_buffer(&[1.0]);
        assert_eq!(buf.get(0), 1.0);
        assert!(buf.get(1).is_nan());
    }

    #[test]
    fn test_capacity_doubles() {
        let mut buf = SampleBuffer::new();
        buf.push(1.0);
        let first = buf.capacity();
        assert!(first >= MIN_CAPACITY);
        for i in 0..first {
            buf.push(i as f64);
        }
        assert!(buf.capacity() >= first * 2);
    }

    #[test]
    fn test_push_clears_sorted_flag() {
        let mut buf = sorted_buffer(&[2.0, 1.0]);
        assert!(buf.is_sorted());
        assert_eq!(buf.as_slice(), &[1.0, 2.0]);
        buf.push(0.5);
        assert!(!buf.is_sorted());
    }

    #[test]
    fn test_probability() {
        let buf = sorted_buffer(&[1.0, 2.0, 3.0, 4.0]);
        assert!((buf.probability(3.0) - 0.5).abs() < 1e-12);
        assert!(SampleBuffer::new().probability(1.0).is_nan());
    }
}
