//! Timeline runner - plays a scenario on a virtual clock.

use serde::{Deserialize, Serialize};
use stage_core::exposition::LatencyHistogram;
use stage_core::query;
use stage_core::{format_elapsed, MetricValues, ScenarioEngine, ScenarioKind};
use stage_env::ManualClock;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Quantiles whose estimates must never decrease as `q` grows.
const CHECKED_QUANTILES: [f64; 5] = [0.50, 0.75, 0.90, 0.95, 0.99];

/// Result of evaluating one query at one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryOutcome {
    pub query: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Engine state observed at one step of the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineSample {
    /// Virtual time since the scenario started, in seconds
    pub elapsed_secs: f64,

    /// Same, as the status endpoint would render it
    pub elapsed: String,

    /// Metric values at this step
    pub metrics: MetricValues,

    /// Configured queries evaluated at this step
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub queries: Vec<QueryOutcome>,
}

/// Results from running a timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineResult {
    /// Scenario that was played
    pub scenario: ScenarioKind,

    /// Step size in seconds
    pub step_secs: f64,

    /// Total virtual duration in seconds
    pub duration_secs: f64,

    /// One sample per step, starting at elapsed zero
    pub samples: Vec<TimelineSample>,

    /// Invariant violations, empty on a clean run
    pub violations: Vec<String>,
}

impl TimelineResult {
    /// Whether every step satisfied every invariant.
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Plays a scenario from activation to a configured horizon.
pub struct TimelineRunner {
    /// Scenario to play
    scenario: ScenarioKind,

    /// Virtual time between samples
    step: Duration,

    /// Total virtual time to cover
    duration: Duration,

    /// Queries evaluated at every step
    queries: Vec<String>,
}

impl TimelineRunner {
    /// Creates a runner that covers the scenario's longest ramp plus one
    /// minute, in 30-second steps.
    pub fn new(scenario: ScenarioKind) -> Self {
        let profile = scenario.scenario();
        let ramp = profile.error_rate_duration.max(profile.latency_duration);

        Self {
            scenario,
            step: Duration::from_secs(30),
            duration: ramp + Duration::from_secs(60),
            queries: Vec::new(),
        }
    }

    /// Sets the step size.
    pub fn with_step(mut self, step: Duration) -> Self {
        self.step = step;
        self
    }

    /// Sets the total duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Sets the queries evaluated at each step.
    pub fn with_queries(mut self, queries: Vec<String>) -> Self {
        self.queries = queries;
        self
    }

    /// Runs the timeline and returns every sample plus any violations.
    pub fn run(&self) -> TimelineResult {
        info!(
            "Starting timeline: {} (step={}s, duration={}s)",
            self.scenario,
            self.step.as_secs_f64(),
            self.duration.as_secs_f64()
        );

        let clock = ManualClock::new();
        let engine = ScenarioEngine::with_scenario(Arc::new(clock.clone()), self.scenario);

        let mut samples = Vec::new();
        let mut violations = Vec::new();
        let mut previous: Option<MetricValues> = None;
        let mut elapsed = Duration::ZERO;

        loop {
            clock.set(elapsed);
            let metrics = engine.current_metrics();

            violations.extend(self.check_step(elapsed, &metrics, previous.as_ref()));

            let queries = self
                .queries
                .iter()
                .map(|q| match engine.evaluate_query(q) {
                    Ok(sample) => QueryOutcome {
                        query: q.clone(),
                        value: Some(sample.value),
                        error: None,
                    },
                    Err(e) => QueryOutcome {
                        query: q.clone(),
                        value: None,
                        error: Some(e.to_string()),
                    },
                })
                .collect();

            debug!(
                "  t={} | error_rate={:.3}% | latency={:.1}ms",
                format_elapsed(elapsed),
                metrics.error_rate,
                metrics.latency
            );

            samples.push(TimelineSample {
                elapsed_secs: elapsed.as_secs_f64(),
                elapsed: format_elapsed(elapsed),
                metrics,
                queries,
            });
            previous = Some(metrics);

            if self.step.is_zero() || elapsed >= self.duration {
                break;
            }
            elapsed = elapsed.saturating_add(self.step).min(self.duration);
        }

        for violation in &violations {
            warn!("Timeline {}: {}", self.scenario, violation);
        }
        info!(
            "Finished timeline: {} ({} samples, {} violations)",
            self.scenario,
            samples.len(),
            violations.len()
        );

        engine.shutdown();

        TimelineResult {
            scenario: self.scenario,
            step_secs: self.step.as_secs_f64(),
            duration_secs: self.duration.as_secs_f64(),
            samples,
            violations,
        }
    }

    fn check_step(
        &self,
        elapsed: Duration,
        metrics: &MetricValues,
        previous: Option<&MetricValues>,
    ) -> Vec<String> {
        let profile = self.scenario.scenario();
        let at = format_elapsed(elapsed);
        let mut violations = Vec::new();

        let within = |v: f64, a: f64, b: f64| v >= a.min(b) && v <= a.max(b);
        if !within(metrics.error_rate, profile.error_rate_start, profile.error_rate_end) {
            violations.push(format!("error rate {} outside ramp at {}", metrics.error_rate, at));
        }
        if !within(metrics.latency, profile.latency_start, profile.latency_end) {
            violations.push(format!("latency {} outside ramp at {}", metrics.latency, at));
        }

        if let Some(prev) = previous {
            if profile.latency_end >= profile.latency_start && metrics.latency < prev.latency {
                violations.push(format!(
                    "latency fell from {} to {} at {}",
                    prev.latency, metrics.latency, at
                ));
            }
        }

        let histogram = LatencyHistogram::from_metrics(metrics);
        if histogram
            .buckets
            .windows(2)
            .any(|w| w[1].cumulative < w[0].cumulative)
        {
            violations.push(format!("histogram buckets decrease at {}", at));
        }

        let estimates: Vec<f64> = CHECKED_QUANTILES
            .iter()
            .filter_map(|q| query::evaluate(&format!("histogram_quantile({}, x)", q), metrics).ok())
            .collect();
        if estimates.len() != CHECKED_QUANTILES.len()
            || estimates.windows(2).any(|w| w[1] < w[0])
        {
            violations.push(format!("quantile estimates not monotonic at {}", at));
        }

        violations
    }
}
