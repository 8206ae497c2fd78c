//! Query Evaluator for the restricted PromQL surface the mock understands.
//!
//! Three query shapes are recognized, tried in this order:
//! 1. `rate(<series>[<window>])`
//! 2. `histogram_quantile(<q>, ...)`
//! 3. a bare series name anywhere in the query text
//!
//! Anything else is an unknown metric. Windows, label matchers and nested
//! expressions are accepted syntactically but ignored: there is only one
//! series per metric and its value is already instantaneous.

use crate::metrics::{MetricValues, Series, JOB_LABEL};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::debug;

static RATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"rate\(([^\[]+)\[").expect("rate regex"));
static QUANTILE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"histogram_quantile\(([\d.]+),").expect("histogram_quantile regex")
});

/// Machine-readable error tag carried in error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryErrorKind {
    BadQuerySyntax,
    UnknownMetric,
    InvalidQuantile,
}

/// Query evaluation failures. All of them are reported, none are fatal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// The query starts like a known function but is malformed
    #[error("bad query syntax: {0}")]
    BadQuerySyntax(String),

    /// The query names no series the mock emits
    #[error("unsupported metric query: {0}")]
    UnknownMetric(String),

    /// The quantile argument is not a number in [0, 1]
    #[error("invalid quantile value: {value} ({reason})")]
    InvalidQuantile { value: String, reason: &'static str },
}

impl QueryError {
    /// Creates the error returned for an empty query.
    pub fn missing() -> Self {
        Self::BadQuerySyntax("query parameter is required".to_string())
    }

    /// Returns the error's kind tag.
    pub fn kind(&self) -> QueryErrorKind {
        match self {
            QueryError::BadQuerySyntax(_) => QueryErrorKind::BadQuerySyntax,
            QueryError::UnknownMetric(_) => QueryErrorKind::UnknownMetric,
            QueryError::InvalidQuantile { .. } => QueryErrorKind::InvalidQuantile,
        }
    }
}

/// A parsed query, one variant per recognized shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// `rate(series[window])`
    Rate { series: Series },
    /// `histogram_quantile(q, ...)`, with `q` already range-checked
    HistogramQuantile { quantile: f64 },
    /// A bare series reference
    Direct { series: Series },
    /// Nothing recognizable
    Unrecognized { raw: String },
}

impl Query {
    /// Classifies and validates a raw query string.
    pub fn parse(raw: &str) -> Result<Self, QueryError> {
        let query = raw.trim();

        if query.starts_with("rate(") {
            return Self::parse_rate(query);
        }
        if query.starts_with("histogram_quantile(") {
            return Self::parse_histogram_quantile(query);
        }
        Ok(Self::parse_direct(query))
    }

    fn parse_rate(query: &str) -> Result<Self, QueryError> {
        let name = RATE_PATTERN
            .captures(query)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
            .ok_or_else(|| QueryError::BadQuerySyntax("invalid rate query format".to_string()))?;

        match Series::find_in(name) {
            Some(series) if series.is_rateable() => Ok(Query::Rate { series }),
            _ => Err(QueryError::UnknownMetric(format!("rate of {}", name))),
        }
    }

    fn parse_histogram_quantile(query: &str) -> Result<Self, QueryError> {
        let arg = QUANTILE_PATTERN
            .captures(query)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .ok_or_else(|| {
                QueryError::BadQuerySyntax("invalid histogram_quantile format".to_string())
            })?;

        let quantile: f64 = arg.parse().map_err(|_| QueryError::InvalidQuantile {
            value: arg.to_string(),
            reason: "not a number",
        })?;

        if !(0.0..=1.0).contains(&quantile) {
            return Err(QueryError::InvalidQuantile {
                value: arg.to_string(),
                reason: "quantile must be between 0 and 1",
            });
        }

        Ok(Query::HistogramQuantile { quantile })
    }

    fn parse_direct(query: &str) -> Self {
        match Series::find_in(query) {
            Some(series) => Query::Direct { series },
            None => Query::Unrecognized {
                raw: query.to_string(),
            },
        }
    }

    /// Computes the scalar result against a metric snapshot.
    pub fn evaluate(&self, metrics: &MetricValues) -> Result<f64, QueryError> {
        match self {
            // rate() of the latency histogram is deliberately its mean in
            // seconds, not a derivative
            Query::Rate { series } | Query::Direct { series } => Ok(series.sample(metrics)),
            Query::HistogramQuantile { quantile } => {
                Ok(metrics.latency_seconds() * quantile_multiplier(*quantile))
            }
            Query::Unrecognized { raw } => Err(QueryError::UnknownMetric(raw.clone())),
        }
    }
}

/// Ratio of the estimated `q`-quantile latency to the mean latency.
///
/// Piecewise linear through (0, 0), (0.50, 0.8), (0.95, 1.5) and (0.99, 2.5),
/// flat at 2.5 above 0.99.
pub fn quantile_multiplier(q: f64) -> f64 {
    if q >= 0.99 {
        2.5
    } else if q >= 0.95 {
        1.5 + (q - 0.95) / (0.99 - 0.95) * (2.5 - 1.5)
    } else if q >= 0.50 {
        0.8 + (q - 0.50) / (0.95 - 0.50) * (1.5 - 0.8)
    } else {
        q / 0.50 * 0.8
    }
}

/// Parses and evaluates a query in one step.
pub fn evaluate(raw: &str, metrics: &MetricValues) -> Result<f64, QueryError> {
    Query::parse(raw)?.evaluate(metrics)
}

/// Evaluates a query and stamps the result with the evaluation time.
pub fn evaluate_at(
    raw: &str,
    metrics: &MetricValues,
    now: SystemTime,
) -> Result<InstantSample, QueryError> {
    let value = evaluate(raw, metrics)?;
    let timestamp = now
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as f64)
        .unwrap_or(0.0);

    debug!("Evaluated query {:?} = {}", raw, value);
    Ok(InstantSample { timestamp, value })
}

/// A single-element instant vector: one value for the fixed job label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstantSample {
    /// Evaluation time, whole seconds since the Unix epoch
    pub timestamp: f64,
    /// Scalar result
    pub value: f64,
}

impl InstantSample {
    /// The value as the wire carries it: a string with six decimals.
    pub fn formatted_value(&self) -> String {
        format!("{:.6}", self.value)
    }

    fn labels() -> BTreeMap<String, String> {
        BTreeMap::from([("job".to_string(), JOB_LABEL.to_string())])
    }
}

/// One element of a `vector` result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorResult {
    pub metric: BTreeMap<String, String>,
    /// `[timestamp, "value"]`
    pub value: (f64, String),
}

/// The `data` member of a successful response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryData {
    #[serde(rename = "resultType")]
    pub result_type: String,
    pub result: Vec<VectorResult>,
}

/// Query API response envelope in the Prometheus HTTP API shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    /// `"success"` or `"error"`
    pub status: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<QueryData>,

    /// Prometheus error class; always `bad_data` here
    #[serde(rename = "errorType", default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,

    #[serde(rename = "errorKind", default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<QueryErrorKind>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryResponse {
    /// Wraps a sample as a one-element vector result.
    pub fn success(sample: &InstantSample) -> Self {
        Self {
            status: "success".to_string(),
            data: Some(QueryData {
                result_type: "vector".to_string(),
                result: vec![VectorResult {
                    metric: InstantSample::labels(),
                    value: (sample.timestamp, sample.formatted_value()),
                }],
            }),
            error_type: None,
            error_kind: None,
            error: None,
        }
    }

    /// Converts an evaluation error into an error envelope.
    pub fn error(err: &QueryError) -> Self {
        Self {
            status: "error".to_string(),
            data: None,
            error_type: Some("bad_data".to_string()),
            error_kind: Some(err.kind()),
            error: Some(err.to_string()),
        }
    }

    pub fn from_result(result: Result<InstantSample, QueryError>) -> Self {
        match result {
            Ok(sample) => Self::success(&sample),
            Err(err) => Self::error(&err),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;
    use std::time::Duration;

    fn healthy() -> MetricValues {
        MetricValues {
            error_rate: 0.1,
            latency: 100.0,
            up: 1.0,
        }
    }

    #[test]
    fn test_parse_variants() {
        assert_eq!(
            Query::parse("rate(http_requests_errors_total[5m])"),
            Ok(Query::Rate {
                series: Series::ErrorCount
            })
        );
        assert_eq!(
            Query::parse("  histogram_quantile(0.95, rate(http_request_duration_seconds_bucket[5m]))"),
            Ok(Query::HistogramQuantile { quantile: 0.95 })
        );
        assert_eq!(
            Query::parse("http_request_duration_seconds_sum"),
            Ok(Query::Direct {
                series: Series::RequestDuration
            })
        );
        assert_eq!(
            Query::parse("node_load1"),
            Ok(Query::Unrecognized {
                raw: "node_load1".to_string()
            })
        );
    }

    #[test]
    fn test_rate_of_error_counter() {
        let metrics = MetricValues {
            error_rate: 25.0,
            ..healthy()
        };
        let value = evaluate("rate(http_requests_errors_total{job=\"demo-app\"}[5m])", &metrics).unwrap();
        assert_relative_eq!(value, 25.0);
    }

    #[test]
    fn test_rate_of_latency_is_seconds() {
        let value = evaluate("rate(http_request_duration_seconds_sum[1m])", &healthy()).unwrap();
        assert_relative_eq!(value, 0.1);
    }

    #[test]
    fn test_rate_of_unknown_metric() {
        let err = evaluate("rate(node_cpu_seconds_total[5m])", &healthy()).unwrap_err();
        assert_eq!(err.kind(), QueryErrorKind::UnknownMetric);
        assert!(err.to_string().contains("node_cpu_seconds_total"));

        let err = evaluate("rate(up[5m])", &healthy()).unwrap_err();
        assert_eq!(err.kind(), QueryErrorKind::UnknownMetric);
    }

    #[test]
    fn test_rate_without_window_is_bad_syntax() {
        let err = evaluate("rate(incomplete", &healthy()).unwrap_err();
        assert_eq!(err.kind(), QueryErrorKind::BadQuerySyntax);
    }

    #[test]
    fn test_histogram_quantile_without_comma_is_bad_syntax() {
        let err = evaluate("histogram_quantile(incomplete", &healthy()).unwrap_err();
        assert_eq!(err.kind(), QueryErrorKind::BadQuerySyntax);
    }

    #[test]
    fn test_histogram_quantile_out_of_range() {
        let err = evaluate("histogram_quantile(1.5, rate(x[5m]))", &healthy()).unwrap_err();
        assert_eq!(err.kind(), QueryErrorKind::InvalidQuantile);
        assert!(err.to_string().contains("1.5"));
    }

    #[test]
    fn test_histogram_quantile_not_a_number() {
        let err = evaluate("histogram_quantile(0.9.9, rate(x[5m]))", &healthy()).unwrap_err();
        assert_eq!(
            err,
            QueryError::InvalidQuantile {
                value: "0.9.9".to_string(),
                reason: "not a number"
            }
        );
    }

    #[test]
    fn test_histogram_quantile_bands() {
        let q = |q: f64| {
            evaluate(
                &format!("histogram_quantile({}, rate(http_request_duration_seconds_bucket[5m]))", q),
                &healthy(),
            )
            .unwrap()
        };
        assert_relative_eq!(q(0.99), 0.25, epsilon = 1e-12);
        assert_relative_eq!(q(1.0), 0.25, epsilon = 1e-12);
        assert_relative_eq!(q(0.95), 0.15, epsilon = 1e-12);
        assert_relative_eq!(q(0.97), 0.2, epsilon = 1e-12);
        assert_relative_eq!(q(0.5), 0.08, epsilon = 1e-12);
        assert_relative_eq!(q(0.25), 0.04, epsilon = 1e-12);
        assert_relative_eq!(q(0.0), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_quantile_monotonic_over_common_quantiles() {
        let metrics = MetricValues {
            latency: 640.0,
            ..healthy()
        };
        let values: Vec<f64> = [0.50, 0.75, 0.90, 0.95, 0.99]
            .iter()
            .map(|q| evaluate(&format!("histogram_quantile({}, x)", q), &metrics).unwrap())
            .collect();
        assert!(values.windows(2).all(|w| w[0] <= w[1]), "{:?}", values);
    }

    #[test]
    fn test_direct_queries() {
        let metrics = healthy();
        assert_relative_eq!(evaluate("up", &metrics).unwrap(), 1.0);
        assert_relative_eq!(evaluate("up{job=\"demo-app\"}", &metrics).unwrap(), 1.0);
        assert_relative_eq!(evaluate("http_requests_errors_total", &metrics).unwrap(), 0.1);
        assert_relative_eq!(evaluate("http_request_duration_seconds", &metrics).unwrap(), 0.1);
    }

    #[test]
    fn test_unknown_metric() {
        let err = evaluate("totally_invalid_metric", &healthy()).unwrap_err();
        assert_eq!(err.kind(), QueryErrorKind::UnknownMetric);
    }

    #[test]
    fn test_success_envelope() {
        let now = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let sample = evaluate_at("up", &healthy(), now).unwrap();
        let json = serde_json::to_value(QueryResponse::success(&sample)).unwrap();

        assert_eq!(json["status"], "success");
        assert_eq!(json["data"]["resultType"], "vector");
        assert_eq!(json["data"]["result"][0]["metric"]["job"], "demo-app");
        assert_eq!(json["data"]["result"][0]["value"][0], 1_700_000_000.0);
        assert_eq!(json["data"]["result"][0]["value"][1], "1.000000");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_error_envelope() {
        let response = QueryResponse::from_result(evaluate_at(
            "histogram_quantile(2, x)",
            &healthy(),
            SystemTime::now(),
        ));
        assert!(!response.is_success());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["errorType"], "bad_data");
        assert_eq!(json["errorKind"], "invalid_quantile");
        assert!(json["error"].as_str().unwrap().contains("between 0 and 1"));
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_missing_query_error() {
        let err = QueryError::missing();
        assert_eq!(err.kind(), QueryErrorKind::BadQuerySyntax);
        assert!(err.to_string().contains("query parameter is required"));
    }

    proptest! {
        #[test]
        fn prop_multiplier_non_decreasing(a in 0.0f64..=1.0, b in 0.0f64..=1.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(quantile_multiplier(lo) <= quantile_multiplier(hi) + 1e-12);
        }

        #[test]
        fn prop_valid_quantiles_always_evaluate(q in 0.0f64..=1.0, latency in 0.0f64..10_000.0) {
            let metrics = MetricValues { latency, ..healthy() };
            let value = Query::HistogramQuantile { quantile: q }.evaluate(&metrics).unwrap();
            prop_assert!(value >= 0.0);
            prop_assert!(value <= metrics.latency_seconds() * 2.5 + 1e-12);
        }
    }
}
