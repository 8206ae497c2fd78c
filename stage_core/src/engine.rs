//! The Scenario Engine - the one piece of mutable state in the mock backend.
//!
//! Holds the active scenario together with the instant it became active and
//! derives live metric values from them on demand. Nothing runs in the
//! background: every value is computed when it is asked for.

use crate::exposition;
use crate::metrics::MetricValues;
use crate::query::{self, InstantSample, QueryError};
use crate::scenario::{self, Scenario, ScenarioKind, ScenarioSummary};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use stage_env::{SharedClock, StageClock};
use std::time::{Duration, SystemTime};
use tracing::{info, warn};

/// Point-in-time view of the engine, as served by status endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioStatus {
    /// Active scenario
    pub name: ScenarioKind,
    /// Its description
    pub description: String,
    /// Wall-clock time the scenario (or its timer) was last (re)started
    pub start_time: DateTime<Utc>,
    /// Human-readable elapsed time, e.g. `"1h 1m 5s"`
    pub elapsed: String,
    /// Values at the moment of the snapshot
    pub metrics: MetricValues,
}

/// The scenario/start-time pair. Always read and written as one unit.
#[derive(Debug, Clone, Copy)]
struct ActiveScenario {
    scenario: &'static Scenario,
    /// Monotonic clock reading at activation
    started: Duration,
    /// Wall-clock reading at activation
    started_at: SystemTime,
}

impl ActiveScenario {
    fn start(scenario: &'static Scenario, clock: &SharedClock) -> Self {
        Self {
            scenario,
            started: clock.now(),
            started_at: clock.system_time(),
        }
    }

    fn elapsed(&self, now: Duration) -> Duration {
        now.saturating_sub(self.started)
    }

    fn metrics(&self, now: Duration) -> MetricValues {
        self.scenario.metrics_at(self.elapsed(now))
    }

    fn status(&self, now: Duration) -> ScenarioStatus {
        ScenarioStatus {
            name: self.scenario.kind,
            description: self.scenario.description.to_string(),
            start_time: DateTime::<Utc>::from(self.started_at),
            elapsed: format_elapsed(self.elapsed(now)),
            metrics: self.metrics(now),
        }
    }
}

/// Owns the active scenario and answers every metric question against it.
///
/// One instance is created at process start and shared by handle (usually an
/// `Arc`) with whatever serves requests. All access to the scenario and its
/// start time goes through a single reader/writer lock, so a reader always
/// sees a pair that some writer actually stored.
pub struct ScenarioEngine {
    clock: SharedClock,
    state: RwLock<ActiveScenario>,
}

impl ScenarioEngine {
    /// Creates an engine running the named scenario.
    ///
    /// Unknown names fall back to `healthy` with a warning.
    pub fn new(clock: SharedClock, initial_scenario: &str) -> Self {
        let kind = match initial_scenario.parse::<ScenarioKind>() {
            Ok(kind) => kind,
            Err(e) => {
                warn!("{}; falling back to {}", e, ScenarioKind::Healthy);
                ScenarioKind::Healthy
            }
        };
        Self::with_scenario(clock, kind)
    }

    /// Creates an engine running a known scenario.
    pub fn with_scenario(clock: SharedClock, kind: ScenarioKind) -> Self {
        let scenario = kind.scenario();
        let state = ActiveScenario::start(scenario, &clock);

        info!(
            "Mock Prometheus engine initialized: scenario={} ({})",
            scenario.kind, scenario.description
        );

        Self {
            clock,
            state: RwLock::new(state),
        }
    }

    /// Current metric values for the active scenario.
    pub fn current_metrics(&self) -> MetricValues {
        let state = self.state.read();
        state.metrics(self.clock.now())
    }

    /// Current scenario, start time, elapsed time and metric values.
    pub fn status(&self) -> ScenarioStatus {
        let state = self.state.read();
        state.status(self.clock.now())
    }

    /// Switches to the named scenario and restarts its timer.
    ///
    /// Unknown names silently select `healthy`; strict validation belongs to
    /// the caller (see [`scenario::valid_names`]).
    pub fn set_scenario(&self, name: &str) -> ScenarioStatus {
        self.activate(scenario::lookup(name))
    }

    /// Switches to a known scenario and restarts its timer.
    pub fn set_scenario_kind(&self, kind: ScenarioKind) -> ScenarioStatus {
        self.activate(kind.scenario())
    }

    fn activate(&self, scenario: &'static Scenario) -> ScenarioStatus {
        let mut state = self.state.write();
        *state = ActiveScenario::start(scenario, &self.clock);
        let status = state.status(self.clock.now());
        drop(state);

        info!(
            "Scenario changed: scenario={} ({})",
            scenario.kind, scenario.description
        );
        status
    }

    /// Restarts the active scenario's timer without changing the scenario.
    pub fn reset_timer(&self) -> ScenarioStatus {
        let mut state = self.state.write();
        let scenario = state.scenario;
        *state = ActiveScenario::start(scenario, &self.clock);
        let status = state.status(self.clock.now());
        drop(state);

        info!("Scenario timer reset: scenario={}", status.name);
        status
    }

    /// Catalog listing for discovery endpoints.
    pub fn list_scenarios(&self) -> Vec<ScenarioSummary> {
        scenario::list_scenarios()
    }

    /// Evaluates a query against the current values.
    pub fn evaluate_query(&self, raw: &str) -> Result<InstantSample, QueryError> {
        let metrics = self.current_metrics();
        query::evaluate_at(raw, &metrics, self.clock.system_time())
    }

    /// Renders the current values in the text exposition format.
    pub fn render_exposition(&self) -> String {
        exposition::render(&self.current_metrics())
    }

    /// Releases held resources. Nothing is spawned, so this only logs.
    pub fn shutdown(&self) {
        let state = self.state.read();
        info!(
            "Mock Prometheus engine stopped: scenario={}",
            state.scenario.kind
        );
    }
}

/// Formats a duration as `"Ns"`, `"Nm Ns"` or `"Nh Nm Ns"`, after rounding to
/// the nearest second.
pub fn format_elapsed(d: Duration) -> String {
    let total = (d.as_millis() + 500) / 1000;
    let h = total / 3600;
    let m = (total / 60) % 60;
    let s = total % 60;

    if h > 0 {
        format!("{}h {}m {}s", h, m, s)
    } else if m > 0 {
        format!("{}m {}s", m, s)
    } else {
        format!("{}s", s)
    }
}
