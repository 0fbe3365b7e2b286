//! Property tests for interval ordering and order-statistic lookups.

use forecast_interval::statistics::{interpolated_quantile, SampleBuffer};
use forecast_interval::{Config, ConfidenceInterval, DataPoint, IntervalBuilder, IntervalKind};
use proptest::prelude::*;
use proptest::test_runner::Config as ProptestConfig;

fn history() -> impl Strategy<Value = Vec<DataPoint>> {
    prop::collection::vec((0.5f64..100.0, 0.5f64..150.0), 3..20)
        .prop_map(|pairs| pairs.into_iter().map(DataPoint::from).collect())
}

fn config() -> Config {
    Config {
        bootstrap_samples: 200,
        ..Config::default()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn bounds_bracket_prediction(points in history(), input in 1.0f64..200.0, p in 0.0f64..0.99) {
        for kind in IntervalKind::ALL {
            let mut builder = IntervalBuilder::new(kind, &config());
            builder.extend(points.iter().copied());
            let mut interval = builder.complete();
            interval.set_input(input);
            if !interval.viability().is_usable() {
                continue;
            }
            let prediction = interval.prediction();
            let slack = 1e-9 * prediction.abs().max(1.0);
            prop_assert!(interval.lpi(p) <= prediction + slack, "{kind}: lpi {} > {}", interval.lpi(p), prediction);
            prop_assert!(interval.upi(p) >= prediction - slack, "{kind}: upi {} < {}", interval.upi(p), prediction);
        }
    }

    #[test]
    fn wider_confidence_gives_wider_interval(points in history(), input in 1.0f64..200.0) {
        let mut builder = IntervalBuilder::new(IntervalKind::LogCentered, &config());
        builder.extend(points.iter().copied());
        let mut interval = builder.complete();
        interval.set_input(input);
        prop_assume!(interval.viability().is_usable());
        prop_assert!(interval.lpi(0.9) <= interval.lpi(0.5));
        prop_assert!(interval.upi(0.9) >= interval.upi(0.5));
    }

    #[test]
    fn find_is_monotone(mut values in prop::collection::vec(-1e6f64..1e6, 0..200), a in -1e6f64..1e6, b in -1e6f64..1e6) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let mut buffer = SampleBuffer::new();
        buffer.extend(values.drain(..));
        buffer.sort();
        prop_assert!(buffer.find(lo) <= buffer.find(hi));
        prop_assert!(buffer.find(hi) <= buffer.len());
    }

    #[test]
    fn interpolated_quantile_is_monotone(mut values in prop::collection::vec(-1e6f64..1e6, 1..200), p in 0.0f64..=1.0, q in 0.0f64..=1.0) {
        values.sort_by(|a, b| a.total_cmp(b));
        let (lo, hi) = if p <= q { (p, q) } else { (q, p) };
        let at_lo = interpolated_quantile(&values, lo);
        let at_hi = interpolated_quantile(&values, hi);
        // interpolation may overshoot a neighbour by an ulp
        let slack = 1e-6;
        prop_assert!(at_lo <= at_hi + slack);
        prop_assert!(at_lo >= values[0] - slack);
        prop_assert!(at_hi <= values[values.len() - 1] + slack);
    }
}
