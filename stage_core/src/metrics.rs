//! Stage Metrics Vocabulary
//! ========================
//!
//! The three series the mock backend emulates, and the instantaneous values
//! they are all derived from:
//! - **Error counter** `http_requests_errors_total`: errors per second at a
//!   fixed baseline traffic volume
//! - **Latency histogram** `http_request_duration_seconds`: mean request
//!   latency, in seconds on the wire
//! - **Gauge** `up`: service liveness

use serde::{Deserialize, Serialize};

/// Label value attached to every emitted sample (`job="demo-app"`).
pub const JOB_LABEL: &str = "demo-app";

/// Assumed traffic volume used to turn an error percentage into a rate.
pub const BASELINE_REQUESTS_PER_SECOND: f64 = 100.0;

/// Instantaneous metric values for the active scenario.
///
/// Never stored: always recomputed from the scenario and the elapsed time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricValues {
    /// Error rate as a percentage [0, 100]
    pub error_rate: f64,
    /// Mean request latency in milliseconds
    pub latency: f64,
    /// Liveness, 0 or 1
    pub up: f64,
}

impl MetricValues {
    /// Errors per second at the baseline traffic volume.
    pub fn errors_per_second(&self) -> f64 {
        (self.error_rate / 100.0) * BASELINE_REQUESTS_PER_SECOND
    }

    /// Latency converted to seconds.
    pub fn latency_seconds(&self) -> f64 {
        self.latency / 1000.0
    }
}

/// A series known to the mock backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Series {
    /// `http_requests_errors_total` (counter)
    ErrorCount,
    /// `http_request_duration_seconds` (histogram)
    RequestDuration,
    /// `up` (gauge)
    Up,
}

impl Series {
    /// All series, in the order raw queries are matched against them.
    pub const ALL: [Series; 3] = [Series::ErrorCount, Series::RequestDuration, Series::Up];

    /// Returns the exposed metric name.
    pub fn name(&self) -> &'static str {
        match self {
            Series::ErrorCount => "http_requests_errors_total",
            Series::RequestDuration => "http_request_duration_seconds",
            Series::Up => "up",
        }
    }

    /// Returns the `# HELP` text.
    pub fn help(&self) -> &'static str {
        match self {
            Series::ErrorCount => "Total number of HTTP request errors",
            Series::RequestDuration => "HTTP request latency",
            Series::Up => "Service is up",
        }
    }

    /// Returns the `# TYPE` keyword.
    pub fn metric_type(&self) -> &'static str {
        match self {
            Series::ErrorCount => "counter",
            Series::RequestDuration => "histogram",
            Series::Up => "gauge",
        }
    }

    /// Whether `rate(...)` is meaningful for this series.
    pub fn is_rateable(&self) -> bool {
        !matches!(self, Series::Up)
    }

    /// Finds the first series whose name occurs in `text`.
    pub fn find_in(text: &str) -> Option<Series> {
        Series::ALL.into_iter().find(|s| text.contains(s.name()))
    }

    /// Scalar value of this series for the given metric snapshot.
    ///
    /// The latency histogram collapses to its mean in seconds.
    pub fn sample(&self, metrics: &MetricValues) -> f64 {
        match self {
            Series::ErrorCount => metrics.errors_per_second(),
            Series::RequestDuration => metrics.latency_seconds(),
            Series::Up => metrics.up,
        }
    }
}

impl std::fmt::Display for Series {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
