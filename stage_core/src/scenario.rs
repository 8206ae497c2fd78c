//! Scenario catalog: the fixed degradation profiles the engine can play.
//!
//! Each scenario is immutable and describes how the error rate and latency
//! move from a start value to an end value over a fixed duration. A zero
//! duration means the value is constant. Error rate interpolates linearly;
//! latency follows a quadratic curve so that late-stage degradation reads as
//! an accelerating spike.

use crate::metrics::MetricValues;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScenarioKind {
    /// Minimal errors, low latency, nothing moves
    Healthy,

    /// Error rate climbs from 5% to 25% over five minutes
    HighErrors,

    /// Latency spikes from 150ms to 2s over three minutes
    LatencySpike,

    /// Errors and latency both degrade over ten minutes
    GradualDegradation,
}

impl ScenarioKind {
    /// Returns a list of all scenarios, in catalog order.
    pub fn all() -> Vec<ScenarioKind> {
        vec![
            ScenarioKind::Healthy,
            ScenarioKind::HighErrors,
            ScenarioKind::LatencySpike,
            ScenarioKind::GradualDegradation,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioKind::Healthy => "healthy",
            ScenarioKind::HighErrors => "high-errors",
            ScenarioKind::LatencySpike => "latency-spike",
            ScenarioKind::GradualDegradation => "gradual-degradation",
        }
    }

    /// Returns the catalog entry for this identifier.
    pub fn scenario(&self) -> &'static Scenario {
        match self {
            ScenarioKind::Healthy => &CATALOG[0],
            ScenarioKind::HighErrors => &CATALOG[1],
            ScenarioKind::LatencySpike => &CATALOG[2],
            ScenarioKind::GradualDegradation => &CATALOG[3],
        }
    }
}

impl std::fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioKind {
    type Err = ScenarioError;

    /// Strict parse: only the exact catalog names are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScenarioKind::all()
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| ScenarioError::InvalidScenarioName {
                name: s.to_string(),
                valid: valid_names().join(", "),
            })
    }
}

/// Errors raised when validating scenario names at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScenarioError {
    /// The name is not one of the catalog entries
    #[error("invalid scenario type: {name} (valid: {valid})")]
    InvalidScenarioName { name: String, valid: String },
}

/// A named, immutable degradation profile.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    /// Catalog identity
    pub kind: ScenarioKind,

    /// Human-readable summary
    pub description: &'static str,

    /// Error rate at activation, percent
    pub error_rate_start: f64,
    /// Error rate once `error_rate_duration` has elapsed, percent
    pub error_rate_end: f64,
    /// Ramp length for the error rate; zero means constant
    pub error_rate_duration: Duration,

    /// Latency at activation, milliseconds
    pub latency_start: f64,
    /// Latency once `latency_duration` has elapsed, milliseconds
    pub latency_end: f64,
    /// Ramp length for latency; zero means constant
    pub latency_duration: Duration,

    /// Liveness (0 or 1)
    pub up: f64,
}

static CATALOG: [Scenario; 4] = [
    Scenario {
        kind: ScenarioKind::Healthy,
        description: "Healthy application with minimal errors and low latency",
        error_rate_start: 0.1,
        error_rate_end: 0.1,
        error_rate_duration: Duration::ZERO,
        latency_start: 100.0,
        latency_end: 100.0,
        latency_duration: Duration::ZERO,
        up: 1.0,
    },
    Scenario {
        kind: ScenarioKind::HighErrors,
        description: "High error rate that progressively increases",
        error_rate_start: 5.0,
        error_rate_end: 25.0,
        error_rate_duration: Duration::from_secs(5 * 60),
        latency_start: 200.0,
        latency_end: 200.0,
        latency_duration: Duration::ZERO,
        up: 1.0,
    },
    Scenario {
        kind: ScenarioKind::LatencySpike,
        description: "Latency spike with gradual increase",
        error_rate_start: 0.5,
        error_rate_end: 0.5,
        error_rate_duration: Duration::ZERO,
        latency_start: 150.0,
        latency_end: 2000.0,
        latency_duration: Duration::from_secs(3 * 60),
        up: 1.0,
    },
    Scenario {
        kind: ScenarioKind::GradualDegradation,
        description: "Both errors and latency degrade over time",
        error_rate_start: 0.5,
        error_rate_end: 15.0,
        error_rate_duration: Duration::from_secs(10 * 60),
        latency_start: 120.0,
        latency_end: 800.0,
        latency_duration: Duration::from_secs(10 * 60),
        up: 1.0,
    },
];

/// Fraction of `duration` covered by `elapsed`, or `None` for a constant.
fn progress(elapsed: Duration, duration: Duration) -> Option<f64> {
    if duration.is_zero() {
        return None;
    }
    Some(elapsed.as_secs_f64() / duration.as_secs_f64())
}

impl Scenario {
    /// Error rate after `elapsed`, interpolated linearly and clamped to the
    /// end value.
    pub fn calculate_error_rate(&self, elapsed: Duration) -> f64 {
        match progress(elapsed, self.error_rate_duration) {
            None => self.error_rate_start,
            Some(p) if p >= 1.0 => self.error_rate_end,
            Some(p) => self.error_rate_start + (self.error_rate_end - self.error_rate_start) * p,
        }
    }

    /// Latency after `elapsed`, following `start + (end - start) * p²` and
    /// clamped to the end value.
    pub fn calculate_latency(&self, elapsed: Duration) -> f64 {
        match progress(elapsed, self.latency_duration) {
            None => self.latency_start,
            Some(p) if p >= 1.0 => self.latency_end,
            Some(p) => self.latency_start + (self.latency_end - self.latency_start) * p.powi(2),
        }
    }

    /// Liveness; constant for the life of the scenario.
    pub fn calculate_up(&self) -> f64 {
        self.up
    }

    /// All three values at once.
    pub fn metrics_at(&self, elapsed: Duration) -> MetricValues {
        MetricValues {
            error_rate: self.calculate_error_rate(elapsed),
            latency: self.calculate_latency(elapsed),
            up: self.calculate_up(),
        }
    }

    /// Name and description, for listings.
    pub fn summary(&self) -> ScenarioSummary {
        ScenarioSummary {
            name: self.kind,
            description: self.description.to_string(),
        }
    }
}

/// Listing entry for discovery endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSummary {
    pub name: ScenarioKind,
    pub description: String,
}

/// Looks up a scenario by name, falling back to `healthy` for unknown names.
pub fn lookup(name: &str) -> &'static Scenario {
    name.parse::<ScenarioKind>()
        .unwrap_or(ScenarioKind::Healthy)
        .scenario()
}

/// Every scenario, in catalog order.
pub fn list_all() -> &'static [Scenario] {
    &CATALOG
}

/// Names accepted by strict validation.
pub fn valid_names() -> Vec<&'static str> {
    ScenarioKind::all().iter().map(|k| k.name()).collect()
}

/// Name/description pairs, in catalog order.
pub fn list_scenarios() -> Vec<ScenarioSummary> {
    CATALOG.iter().map(Scenario::summary).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    const MINUTE: Duration = Duration::from_secs(60);

    #[test]
    fn test_catalog_matches_kinds() {
        for kind in ScenarioKind::all() {
            assert_eq!(kind.scenario().kind, kind);
        }
        assert_eq!(list_all().len(), 4);
    }

    #[test]
    fn test_healthy_at_start() {
        let healthy = ScenarioKind::Healthy.scenario();
        let metrics = healthy.metrics_at(Duration::ZERO);
        assert_relative_eq!(metrics.error_rate, 0.1);
        assert_relative_eq!(metrics.latency, 100.0);
        assert_relative_eq!(metrics.up, 1.0);
    }

    #[test]
    fn test_high_errors_clamps_at_duration() {
        let scenario = ScenarioKind::HighErrors.scenario();
        assert_relative_eq!(scenario.calculate_error_rate(5 * MINUTE), 25.0);
        assert_relative_eq!(scenario.calculate_error_rate(60 * MINUTE), 25.0);
    }

    #[test]
    fn test_high_errors_linear_midpoint() {
        let scenario = ScenarioKind::HighErrors.scenario();
        let halfway = Duration::from_secs(150);
        assert_relative_eq!(scenario.calculate_error_rate(halfway), 15.0);
    }

    #[test]
    fn test_latency_spike_quadratic_midpoint() {
        let scenario = ScenarioKind::LatencySpike.scenario();
        let halfway = Duration::from_secs(90);
        // 150 + 1850 * 0.25
        assert_relative_eq!(scenario.calculate_latency(halfway), 612.5);
        assert_relative_eq!(scenario.calculate_latency(3 * MINUTE), 2000.0);
    }

    #[test]
    fn test_gradual_degradation_moves_both() {
        let scenario = ScenarioKind::GradualDegradation.scenario();
        let start = scenario.metrics_at(Duration::ZERO);
        let end = scenario.metrics_at(10 * MINUTE);
        assert_relative_eq!(start.error_rate, 0.5);
        assert_relative_eq!(start.latency, 120.0);
        assert_relative_eq!(end.error_rate, 15.0);
        assert_relative_eq!(end.latency, 800.0);
    }

    #[test]
    fn test_lookup_falls_back_to_healthy() {
        assert_eq!(lookup("high-errors").kind, ScenarioKind::HighErrors);
        assert_eq!(lookup("meltdown").kind, ScenarioKind::Healthy);
        assert_eq!(lookup("").kind, ScenarioKind::Healthy);
    }

    #[test]
    fn test_from_str_is_strict() {
        assert_eq!(
            "latency-spike".parse::<ScenarioKind>(),
            Ok(ScenarioKind::LatencySpike)
        );
        let err = "Latency-Spike".parse::<ScenarioKind>().unwrap_err();
        assert!(err.to_string().contains("Latency-Spike"));
        assert!(err.to_string().contains("gradual-degradation"));
    }

    #[test]
    fn test_valid_names_in_catalog_order() {
        assert_eq!(
            valid_names(),
            vec!["healthy", "high-errors", "latency-spike", "gradual-degradation"]
        );
    }

    #[test]
    fn test_summary_serializes_kebab_case() {
        let summaries = list_scenarios();
        let json = serde_json::to_value(&summaries[3]).unwrap();
        assert_eq!(json["name"], "gradual-degradation");
        assert_eq!(json["description"], "Both errors and latency degrade over time");
    }

    fn any_scenario() -> impl Strategy<Value = &'static Scenario> {
        (0..4usize).prop_map(|i| &list_all()[i])
    }

    proptest! {
        #[test]
        fn prop_constant_ramps_ignore_elapsed(scenario in any_scenario(), secs in 0u64..10_000_000) {
            let elapsed = Duration::from_secs(secs);
            if scenario.error_rate_duration.is_zero() {
                prop_assert_eq!(scenario.calculate_error_rate(elapsed), scenario.error_rate_start);
            }
            if scenario.latency_duration.is_zero() {
                prop_assert_eq!(scenario.calculate_latency(elapsed), scenario.latency_start);
            }
            prop_assert_eq!(scenario.calculate_up(), scenario.up);
        }

        #[test]
        fn prop_ramps_hit_start_and_clamp_to_end(scenario in any_scenario(), extra in 0u64..1_000_000) {
            if !scenario.error_rate_duration.is_zero() {
                let d = scenario.error_rate_duration;
                prop_assert_eq!(scenario.calculate_error_rate(Duration::ZERO), scenario.error_rate_start);
                prop_assert_eq!(scenario.calculate_error_rate(d), scenario.error_rate_end);
                prop_assert_eq!(scenario.calculate_error_rate(d + Duration::from_secs(extra)), scenario.error_rate_end);
            }
            if !scenario.latency_duration.is_zero() {
                let d = scenario.latency_duration;
                prop_assert_eq!(scenario.calculate_latency(Duration::ZERO), scenario.latency_start);
                prop_assert_eq!(scenario.calculate_latency(d), scenario.latency_end);
                prop_assert_eq!(scenario.calculate_latency(d + Duration::from_secs(extra)), scenario.latency_end);
            }
        }

        #[test]
        fn prop_latency_non_decreasing(scenario in any_scenario(), a in 0u64..1_000_000, b in 0u64..1_000_000) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let earlier = scenario.calculate_latency(Duration::from_millis(lo));
            let later = scenario.calculate_latency(Duration::from_millis(hi));
            prop_assert!(later >= earlier);
            prop_assert!(later <= scenario.latency_end.max(scenario.latency_start));
        }
    }
}
