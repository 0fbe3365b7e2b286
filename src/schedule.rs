//! Monte Carlo simulation of rolled-up schedules.
//!
//! A rollup is made of member schedules, each able to randomize itself and
//! report its own forecast. Every trial randomizes all members and records
//! the aggregate cost and completion date; after all trials the pools are
//! frozen into [`MonteCarloInterval`]s.
//!
//! Dates are plain `f64` day numbers on whatever calendar the caller uses.

use rand::SeedableRng;

use crate::config::{Config, SimulationSettings};
use crate::interval::{ConfidenceInterval, Interval, TargetedInterval};
use crate::monte_carlo::{MonteCarlo, MonteCarloInterval};
use crate::types::SimRng;

/// Minimum probability used when checking results against an independent forecast.
pub const RETARGET_PROBABILITY: f64 = 0.7;

/// Smallest number of trials run when member results are not requested.
pub const MIN_TRIALS: usize = 100;

/// A member schedule that can be perturbed once per trial.
pub trait RandomizedSchedule {
    /// Draw a new random state for this trial.
    fn randomize(&mut self, rng: &mut SimRng);

    /// Cost forecast in the current state.
    fn forecast_cost(&self) -> f64;

    /// Completion date forecast in the current state.
    fn forecast_date(&self) -> f64;
}

/// How member forecasts combine into a rollup forecast.
pub trait RollupMetrics<S> {
    /// Aggregate cost when members work independently.
    fn independent_cost(&self, members: &[S]) -> f64;

    /// Aggregate completion date when members work independently.
    fn independent_date(&self, members: &[S]) -> f64;

    /// Completion date if work were rebalanced across members.
    ///
    /// `None` when the rollup does not support rebalancing.
    fn optimized_date(&self, _members: &[S]) -> Option<f64> {
        None
    }
}

/// One person's remaining work.
///
/// The cost interval corrects the remaining planned cost; the optional time
/// error interval scales calendar time per unit of cost.
#[derive(Debug, Clone)]
pub struct MemberSchedule {
    name: String,
    remaining_cost: f64,
    cost_interval: Interval,
    time_error: Option<Interval>,
    start: f64,
    capacity_per_day: f64,
    cost: f64,
    time_factor: f64,
}

impl MemberSchedule {
    /// Create a member schedule.
    ///
    /// # Arguments
    ///
    /// * `name` - Member name, used in diagnostics
    /// * `remaining_cost` - Planned cost of the remaining work
    /// * `cost_interval` - Estimator correcting planned cost
    /// * `start` - Date work starts
    /// * `capacity_per_day` - Cost the member completes per day
    pub fn new(
        name: impl Into<String>,
        remaining_cost: f64,
        mut cost_interval: Interval,
        start: f64,
        capacity_per_day: f64,
    ) -> Self {
        cost_interval.set_input(remaining_cost);
        let mut member = Self {
            name: name.into(),
            remaining_cost,
            cost_interval,
            time_error: None,
            start,
            capacity_per_day,
            cost: remaining_cost,
            time_factor: 1.0,
        };
        member.reset();
        member
    }

    /// Attach an estimator of the ratio between actual and planned time.
    pub fn with_time_error(mut self, mut time_error: Interval) -> Self {
        time_error.set_input(1.0);
        self.time_error = Some(time_error);
        self.reset();
        self
    }

    /// Member name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Planned cost of the remaining work.
    pub fn remaining_cost(&self) -> f64 {
        self.remaining_cost
    }

    /// Date work starts.
    pub fn start(&self) -> f64 {
        self.start
    }

    /// Cost completed per day.
    pub fn capacity_per_day(&self) -> f64 {
        self.capacity_per_day
    }

    /// Calendar time multiplier in the current state.
    pub fn time_factor(&self) -> f64 {
        self.time_factor
    }

    /// Return to the deterministic forecast.
    ///
    /// Unusable estimators fall back to the plan.
    pub fn reset(&mut self) {
        self.cost = usable_or(self.cost_interval.prediction(), self.remaining_cost);
        self.time_factor = self
            .time_error
            .as_ref()
            .map_or(1.0, |ci| usable_or(ci.prediction(), 1.0));
    }
}

fn usable_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

impl RandomizedSchedule for MemberSchedule {
    fn randomize(&mut self, rng: &mut SimRng) {
        self.cost = usable_or(self.cost_interval.random_value(rng), self.remaining_cost);
        if let Some(ci) = &self.time_error {
            self.time_factor = usable_or(ci.random_value(rng), 1.0);
        }
    }

    fn forecast_cost(&self) -> f64 {
        self.cost
    }

    fn forecast_date(&self) -> f64 {
        self.start + self.cost * self.time_factor / self.capacity_per_day
    }
}

/// Rollup of [`MemberSchedule`]s whose work can be rebalanced.
///
/// - independent cost: `Σ cost`
/// - independent date: `max date`
/// - optimized date: `earliest start + Σ(cost · time factor) / Σ capacity`
#[derive(Debug, Clone, Copy, Default)]
pub struct BalancedRollup;

impl RollupMetrics<MemberSchedule> for BalancedRollup {
    fn independent_cost(&self, members: &[MemberSchedule]) -> f64 {
        members.iter().map(|m| m.forecast_cost()).sum()
    }

    fn independent_date(&self, members: &[MemberSchedule]) -> f64 {
        members
            .iter()
            .map(|m| m.forecast_date())
            .fold(f64::NEG_INFINITY, f64::max)
    }

    fn optimized_date(&self, members: &[MemberSchedule]) -> Option<f64> {
        let start = members.iter().map(|m| m.start).fold(f64::INFINITY, f64::min);
        let work: f64 = members.iter().map(|m| m.cost * m.time_factor).sum();
        let capacity: f64 = members.iter().map(|m| m.capacity_per_day).sum();
        if members.is_empty() || capacity <= 0.0 {
            return None;
        }
        Some(start + work / capacity)
    }
}

/// Frozen results of a schedule simulation.
#[derive(Debug, Clone)]
pub struct ScheduleIntervals {
    /// Aggregate cost.
    pub cost: MonteCarloInterval,
    /// Aggregate completion date with members working independently.
    pub forecast_date: MonteCarloInterval,
    /// Completion date after rebalancing, if the rollup supports it.
    pub optimized_date: Option<MonteCarloInterval>,
    /// Each member's own completion date, if requested.
    pub member_dates: Option<Vec<MonteCarloInterval>>,
}

impl ScheduleIntervals {
    /// Check the aggregate intervals against an independent forecast at
    /// [`RETARGET_PROBABILITY`].
    pub fn retarget(&mut self, cost: f64, date: f64) {
        self.cost.calc_viability(cost, RETARGET_PROBABILITY);
        self.forecast_date.calc_viability(date, RETARGET_PROBABILITY);
    }
}

/// Runs Monte Carlo trials over a rollup.
#[derive(Debug, Clone)]
pub struct ScheduleSimulation<S, M> {
    members: Vec<S>,
    metrics: M,
    base_trials: usize,
    settings: SimulationSettings,
    seed: u64,
    member_results: bool,
}

impl<S, M> ScheduleSimulation<S, M>
where
    S: RandomizedSchedule,
    M: RollupMetrics<S>,
{
    /// Create a simulation over `members`, combined by `metrics`.
    pub fn new(members: Vec<S>, metrics: M, config: &Config) -> Self {
        Self {
            members,
            metrics,
            base_trials: config.monte_carlo_trials,
            settings: config.monte_carlo_settings(),
            seed: config.seed,
            member_results: false,
        }
    }

    /// Also collect each member's completion date distribution.
    pub fn with_member_results(mut self, member_results: bool) -> Self {
        self.member_results = member_results;
        self
    }

    /// Override the seed taken from the configuration.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Member schedules, in their state after the last trial.
    pub fn members(&self) -> &[S] {
        &self.members
    }

    /// Number of trials a run performs.
    ///
    /// Aggregate-only runs need fewer trials as the rollup grows:
    /// `max(100, N / size^0.75)`.
    pub fn trial_count(&self) -> usize {
        if self.member_results {
            return self.base_trials;
        }
        let size = self.members.len().max(1) as f64;
        ((self.base_trials as f64 / size.powf(0.75)) as usize).max(MIN_TRIALS)
    }

    /// Run every trial and freeze the result pools.
    pub fn run(&mut self) -> ScheduleIntervals {
        let trials = self.trial_count();
        let mut rng = SimRng::seed_from_u64(self.seed);

        let mut cost = MonteCarlo::new(self.settings.clone());
        let mut date = MonteCarlo::new(self.settings.clone());
        let mut optimized: Option<MonteCarlo> = None;
        let mut member_dates: Option<Vec<MonteCarlo>> = self.member_results.then(|| {
            (0..self.members.len())
                .map(|_| MonteCarlo::new(self.settings.clone()))
                .collect()
        });

        for _ in 0..trials {
            for member in &mut self.members {
                member.randomize(&mut rng);
            }
            if let Some(pools) = member_dates.as_mut() {
                for (pool, member) in pools.iter_mut().zip(&self.members) {
                    pool.add_sample(member.forecast_date());
                }
            }
            cost.add_sample(self.metrics.independent_cost(&self.members));
            date.add_sample(self.metrics.independent_date(&self.members));
            if let Some(value) = self.metrics.optimized_date(&self.members) {
                optimized
                    .get_or_insert_with(|| MonteCarlo::new(self.settings.clone()))
                    .add_sample(value);
            }
        }

        let results = ScheduleIntervals {
            cost: cost.samples_done(),
            forecast_date: date.samples_done(),
            optimized_date: optimized.map(MonteCarlo::samples_done),
            member_dates: member_dates.map(|pools| pools.into_iter().map(MonteCarlo::samples_done).collect()),
        };
        tracing::info!(
            trials,
            members = self.members.len(),
            cost = results.cost.prediction(),
            forecast_date = results.forecast_date.prediction(),
            optimized_date = results.optimized_date.as_ref().map_or(f64::NAN, |ci| ci.prediction()),
            "schedule simulation complete"
        );
        results
    }

    /// Run every trial, then check the aggregate intervals against an
    /// independent `(cost, date)` forecast when one is given.
    pub fn run_targeted(&mut self, independent: Option<(f64, f64)>) -> ScheduleIntervals {
        let mut results = self.run();
        if let Some((cost, date)) = independent {
            results.retarget(cost, date);
        }
        results
    }
}
