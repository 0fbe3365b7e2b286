//! End-to-end integration tests.

use forecast_interval::{
    BalancedRollup, Config, ConfidenceInterval, DataPoint, Interval, IntervalBuilder, IntervalKind, IntervalSum,
    MemberSchedule, MonteCarlo, ScheduleSimulation, SimRng, TargetedInterval, Viability,
};
use rand::SeedableRng;

fn build(kind: IntervalKind, config: &Config, points: &[(f64, f64)]) -> Interval {
    let mut builder = IntervalBuilder::new(kind, config);
    for &(plan, actual) in points {
        builder.add_data_point(plan, actual);
    }
    builder.complete()
}

const HISTORY: [(f64, f64); 8] = [
    (10.0, 12.0),
    (20.0, 18.0),
    (15.0, 19.0),
    (30.0, 33.0),
    (12.0, 14.0),
    (25.0, 24.0),
    (8.0, 11.0),
    (40.0, 46.0),
];

/// Perfectly proportional history fits the ratio model exactly.
#[test]
fn ratio_model_on_identity_data() {
    let mut interval = build(IntervalKind::Ratio, &Config::default(), &[(1.0, 1.0), (2.0, 2.0), (3.0, 3.0)]);
    let Interval::Ratio(ratio) = &interval else {
        panic!("expected a ratio interval");
    };
    assert_eq!(ratio.parameters().beta0, 0.0);
    assert!((ratio.parameters().beta1 - 1.0).abs() < 1e-12);

    interval.set_input(4.0);
    assert!((interval.prediction() - 4.0).abs() < 1e-12);
    assert_eq!(interval.viability(), Viability::NOMINAL);
}

#[test]
fn linear_models_need_three_points() {
    for kind in [IntervalKind::Ratio, IntervalKind::Regression] {
        let mut interval = build(kind, &Config::default(), &[(1.0, 1.1), (2.0, 2.3)]);
        interval.set_input(3.0);
        assert_eq!(interval.viability(), Viability::CANNOT_CALCULATE);
        assert!(interval.prediction().is_nan());
    }
}

#[test]
fn monte_carlo_fixed_samples() {
    let mut engine = MonteCarlo::default();
    for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
        engine.add_sample(v);
    }
    let ci = engine.samples_done();
    assert_eq!(ci.quantile(0.5), 3.0);
    assert_eq!(ci.lpi(0.5), 2.0);
    assert_eq!(ci.upi(0.5), 4.0);
}

#[test]
fn lognormal_merges_zero_points() {
    let mut builder = IntervalBuilder::new(IntervalKind::LogBootstrap, &Config::default());
    builder.add_data_point(5.0, 6.0);
    builder.add_data_point(0.0, 2.0);
    assert_eq!(builder.data().points(), &[DataPoint::new(5.0, 8.0)]);
}

#[test]
fn lognormal_intervals_are_usable_on_realistic_history() {
    let config = Config::default();
    for kind in [IntervalKind::LogCentered, IntervalKind::LogBootstrap] {
        let mut interval = build(kind, &config, &HISTORY);
        interval.set_input(50.0);
        assert!(interval.viability().is_usable(), "{kind}: {}", interval.viability());
        let prediction = interval.prediction();
        assert!(prediction > 50.0 && prediction < 65.0, "{kind}: {prediction}");
        assert!(interval.lpi(0.7) < prediction && prediction < interval.upi(0.7));
    }
}

#[test]
fn config_from_json_drives_estimators() {
    let config = Config::from_json(r#"{"bootstrap_samples": 300, "seed": 9}"#).unwrap();
    let interval = build(IntervalKind::LogBootstrap, &config, &HISTORY);
    let Interval::LogBootstrap(boot) = &interval else {
        panic!("expected a bootstrap interval");
    };
    assert_eq!(boot.bootstrap_samples().len(), 300);
}

#[test]
fn sum_of_fitted_intervals() {
    let config = Config::default();
    let mut a = build(IntervalKind::LogCentered, &config, &HISTORY);
    let mut b = build(IntervalKind::Ratio, &config, &HISTORY);
    a.set_input(20.0);
    b.set_input(30.0);

    let mut sum = IntervalSum::with_config(&config);
    sum.add_interval(&a);
    sum.add_interval(&b);
    let mut rng = SimRng::seed_from_u64(config.seed);
    let mut total = sum.intervals_complete(&mut rng);

    let expected = a.prediction() + b.prediction();
    assert!((total.prediction() - expected).abs() < 0.05 * expected);
    assert!(total.lpi(0.7) < expected && expected < total.upi(0.7));

    total.calc_viability(expected, 0.7);
    assert!(total.viability().is_usable());
    total.calc_viability(expected * 3.0, 0.7);
    assert_eq!(total.viability(), Viability::SERIOUS_PROBLEM);
}

#[test]
fn balanced_schedule_simulation() {
    let config = Config::default();
    let cost = build(IntervalKind::LogCentered, &config, &HISTORY);
    let members = vec![
        MemberSchedule::new("alice", 40.0, cost.clone(), 0.0, 4.0),
        MemberSchedule::new("bob", 10.0, cost.clone(), 0.0, 4.0),
        MemberSchedule::new("carol", 25.0, cost, 2.0, 5.0),
    ];

    let mut sim = ScheduleSimulation::new(members, BalancedRollup, &config).with_member_results(true);
    let results = sim.run();

    let members = results.member_dates.as_ref().unwrap();
    assert_eq!(members.len(), 3);
    let optimized = results.optimized_date.as_ref().unwrap();
    // rebalancing never finishes later than the slowest member
    assert!(optimized.prediction() <= results.forecast_date.prediction());
    // the independent date is the latest member date
    assert!(results.forecast_date.prediction() >= members[0].prediction() - 1e-9);
}
