//! Persisted interval records.
//!
//! A record is a kind discriminator plus the fitted parameters of that kind:
//!
//! ```json
//! {"kind": "regression", "params": {"beta0": 1.25, "beta1": 1.9, "n": 4, "x_avg": 2.5, "sxx": 5.0, "variance": 0.2}}
//! ```
//!
//! Non-finite parameters, such as the variance of a fit with too few points,
//! are written as `null` and read back as NaN, so an interval that cannot be
//! calculated still reloads as one that cannot be calculated.
//!
//! Derived quantities are not stored. Standard deviations are recomputed
//! from the variance and bootstrap replicates are regenerated from
//! [`Config::seed`], so a record read back under the same configuration
//! gives the same answers as the interval it was written from.
//!
//! Reading goes through an explicit registry of readers keyed by kind.
//! [`read_record`] never fails: unreadable records are logged and reported
//! as absent.

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::interval::{
    Interval, IntervalKind, LinearFit, LogBootstrapInterval, LogCenteredInterval, LogFit, RatioInterval,
    RegressionInterval,
};

/// Tagged, serializable form of a fitted interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedRecord {
    /// Interval kind discriminator.
    pub kind: String,
    /// Kind-specific fitted parameters.
    pub params: serde_json::Value,
}

/// Serde adapter writing non-finite floats as `null` and reading `null` as NaN.
pub(crate) mod non_finite {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
    }
}

type Reader = fn(&serde_json::Value, &Config) -> Result<Interval>;

/// Known kinds and how to rebuild them.
const READERS: &[(&str, Reader)] = &[
    ("ratio", read_ratio),
    ("regression", read_regression),
    ("log_centered", read_log_centered),
    ("log_bootstrap", read_log_bootstrap),
];

fn linear_fit(params: &serde_json::Value) -> Result<LinearFit> {
    let fit = LinearFit::deserialize(params)?;
    if fit.variance < 0.0 {
        return Err(Error::InvalidField {
            field: "variance",
            reason: format!("must be non-negative, got {}", fit.variance),
        });
    }
    if fit.sxx < 0.0 {
        return Err(Error::InvalidField {
            field: "sxx",
            reason: format!("must be non-negative, got {}", fit.sxx),
        });
    }
    Ok(fit)
}

fn log_fit(params: &serde_json::Value) -> Result<LogFit> {
    let fit = LogFit::deserialize(params)?;
    if fit.logstd < 0.0 {
        return Err(Error::InvalidField {
            field: "logstd",
            reason: format!("must be non-negative, got {}", fit.logstd),
        });
    }
    if fit.ratio <= 0.0 {
        return Err(Error::InvalidField {
            field: "ratio",
            reason: format!("must be positive, got {}", fit.ratio),
        });
    }
    Ok(fit)
}

fn read_ratio(params: &serde_json::Value, _config: &Config) -> Result<Interval> {
    Ok(Interval::Ratio(RatioInterval::from_fit(linear_fit(params)?)))
}

fn read_regression(params: &serde_json::Value, config: &Config) -> Result<Interval> {
    let fit = linear_fit(params)?;
    Ok(Interval::Regression(RegressionInterval::from_fit(fit, config.regression_cutoff)))
}

fn read_log_centered(params: &serde_json::Value, _config: &Config) -> Result<Interval> {
    Ok(Interval::LogCentered(LogCenteredInterval::from_fit(log_fit(params)?)))
}

fn read_log_bootstrap(params: &serde_json::Value, config: &Config) -> Result<Interval> {
    let fit = log_fit(params)?;
    Ok(Interval::LogBootstrap(LogBootstrapInterval::from_fit(
        fit,
        config.bootstrap_samples,
        config.lognormal_cutoff,
        config.seed,
    )))
}

/// Build the persisted form of an interval.
///
/// Returns `None` for Monte Carlo intervals, whose sample pools are not
/// persisted.
pub fn to_record(interval: &Interval) -> Option<PersistedRecord> {
    let (kind, params) = match interval {
        Interval::Ratio(ci) => (IntervalKind::Ratio, serde_json::to_value(ci.parameters())),
        Interval::Regression(ci) => (IntervalKind::Regression, serde_json::to_value(ci.parameters())),
        Interval::LogCentered(ci) => (IntervalKind::LogCentered, serde_json::to_value(ci.parameters())),
        Interval::LogBootstrap(ci) => (IntervalKind::LogBootstrap, serde_json::to_value(ci.parameters())),
        Interval::MonteCarlo(_) => return None,
    };
    match params {
        Ok(params) => Some(PersistedRecord {
            kind: kind.name().to_string(),
            params,
        }),
        Err(e) => {
            tracing::warn!(%kind, error = %e, "failed to encode interval parameters");
            None
        }
    }
}

/// Rebuild an interval, reporting why a record could not be read.
pub fn try_read_record(record: &PersistedRecord, config: &Config) -> Result<Interval> {
    let reader = READERS
        .iter()
        .find(|(kind, _)| *kind == record.kind)
        .map(|(_, reader)| *reader)
        .ok_or_else(|| Error::UnknownKind(record.kind.clone()))?;
    reader(&record.params, config)
}

/// Rebuild an interval, or `None` if the record is unusable.
pub fn read_record(record: &PersistedRecord, config: &Config) -> Option<Interval> {
    match try_read_record(record, config) {
        Ok(interval) => Some(interval),
        Err(e) => {
            tracing::warn!(kind = %record.kind, error = %e, "discarding unreadable interval record");
            None
        }
    }
}

/// Encode an interval as a JSON record. `None` for Monte Carlo intervals.
pub fn to_json(interval: &Interval) -> Option<String> {
    let record = to_record(interval)?;
    serde_json::to_string(&record).ok()
}

/// Decode a JSON record, reporting why it could not be read.
pub fn try_from_json(json: &str, config: &Config) -> Result<Interval> {
    let record: PersistedRecord = serde_json::from_str(json)?;
    try_read_record(&record, config)
}

/// Decode a JSON record, or `None` if it is unusable.
pub fn from_json(json: &str, config: &Config) -> Option<Interval> {
    match try_from_json(json, config) {
        Ok(interval) => Some(interval),
        Err(e) => {
            tracing::warn!(error = %e, "discarding unreadable interval record");
            None
        }
    }
}
