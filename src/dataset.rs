//! Ordered collections of (plan, actual) pairs.

use serde::{Deserialize, Serialize};

use crate::types::DataPoint;

/// How a [`DataSet`] treats points with a zero component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ZeroHandling {
    /// Keep every point as added.
    #[default]
    Keep,
    /// Fold a point into its predecessor whenever either of the two has a
    /// zero plan or zero actual. Log-scale fits need this to avoid `log(0)`.
    MergeIntoPrevious,
}

/// An ordered sequence of [`DataPoint`]s collected incrementally.
///
/// A data set is owned by the estimator builder that collects it and is
/// consumed when the estimator is completed, after which it can no longer
/// change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSet {
    points: Vec<DataPoint>,
    zero_handling: ZeroHandling,
}

impl DataSet {
    /// Create an empty data set that keeps every point.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty data set with the given zero handling policy.
    pub fn with_zero_handling(zero_handling: ZeroHandling) -> Self {
        Self {
            points: Vec::new(),
            zero_handling,
        }
    }

    /// Add a point, merging it into the previous point if the policy says so.
    pub fn add(&mut self, point: DataPoint) {
        if self.zero_handling == ZeroHandling::MergeIntoPrevious {
            if let Some(last) = self.points.last_mut() {
                if point.has_zero() || last.has_zero() {
                    *last = last.merged(point);
                    return;
                }
            }
        }
        self.points.push(point);
    }

    /// Convenience wrapper around [`DataSet::add`].
    pub fn add_data_point(&mut self, plan: f64, actual: f64) {
        self.add(DataPoint::new(plan, actual));
    }

    /// Number of retained points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when no points have been retained.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Borrow the retained points in insertion order.
    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    /// Zero handling policy in effect.
    pub fn zero_handling(&self) -> ZeroHandling {
        self.zero_handling
    }

    /// Sum of plan values.
    pub fn total_plan(&self) -> f64 {
        self.points.iter().map(|p| p.plan).sum()
    }

    /// Sum of actual values.
    pub fn total_actual(&self) -> f64 {
        self.points.iter().map(|p| p.actual).sum()
    }
}

impl FromIterator<DataPoint> for DataSet {
    fn from_iter<I: IntoIterator<Item = DataPoint>>(iter: I) -> Self {
        let mut set = DataSet::new();
        set.extend(iter);
        set
    }
}

impl Extend<DataPoint> for DataSet {
    fn extend<I: IntoIterator<Item = DataPoint>>(&mut self, iter: I) {
        for point in iter {
            self.add(point);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keep_retains_zero_points() {
        let mut set = DataSet::new();
        set.add_data_point(1.0, 1.0);
        set.add_data_point(0.0, 2.0);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_merge_zero_into_previous() {
        let mut set = DataSet::with_zero_handling(ZeroHandling::MergeIntoPrevious);
        set.add_data_point(2.0, 3.0);
        set.add_data_point(0.0, 1.5);
        assert_eq!(set.len(), 1);
        assert_eq!(set.points()[0], DataPoint::new(2.0, 4.5));
    }

    #[test]
    fn test_merge_consecutive_zeros() {
        let mut set = DataSet::with_zero_handling(ZeroHandling::MergeIntoPrevious);
        set.add_data_point(0.0, 1.0);
        set.add_data_point(2.0, 0.0);
        set.add_data_point(4.0, 4.0);
        set.add_data_point(5.0, 6.0);
        // (0,1) and (2,0) collapse into one finite point
        assert_eq!(
            set.points(),
            &[
                DataPoint::new(2.0, 1.0),
                DataPoint::new(4.0, 4.0),
                DataPoint::new(5.0, 6.0)
            ]
        );
    }

    #[test]
    fn test_leading_zero_waits_for_next_point() {
        let mut set = DataSet::with_zero_handling(ZeroHandling::MergeIntoPrevious);
        set.add_data_point(0.0, 2.0);
        assert_eq!(set.len(), 1);
        set.add_data_point(3.0, 1.0);
        assert_eq!(set.points(), &[DataPoint::new(3.0, 3.0)]);
    }

    #[test]
    fn test_totals() {
        let set: DataSet = [(1.0, 2.0), (3.0, 4.0)].into_iter().map(DataPoint::from).collect();
        assert_eq!(set.total_plan(), 4.0);
        assert_eq!(set.total_actual(), 6.0);
    }
}
