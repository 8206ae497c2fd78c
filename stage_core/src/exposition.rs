//! Prometheus text exposition of the current metric values.
//!
//! The mock has no observations to bucket, so the latency histogram is
//! synthesized from the mean: every bucket at or above the mean holds all
//! requests, and buckets below it fill along a square-root curve.

use crate::metrics::{MetricValues, Series, BASELINE_REQUESTS_PER_SECOND, JOB_LABEL};

/// Upper bounds of the latency histogram buckets, in seconds.
pub const LATENCY_BUCKETS: [f64; 11] = [
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Smallest latency used for bucket synthesis (1ms).
const LATENCY_FLOOR_SECONDS: f64 = 0.001;

/// One cumulative histogram bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bucket {
    /// Upper bound, seconds
    pub le: f64,
    /// Observations at or below `le`
    pub cumulative: f64,
}

/// Synthesized latency histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct LatencyHistogram {
    /// Finite buckets in ascending order; `+Inf` is implied by `count`
    pub buckets: Vec<Bucket>,
    pub sum: f64,
    pub count: f64,
}

impl LatencyHistogram {
    /// Builds the histogram for a mean latency given in milliseconds.
    pub fn from_metrics(metrics: &MetricValues) -> Self {
        let mean = metrics.latency_seconds().max(LATENCY_FLOOR_SECONDS);
        let count = BASELINE_REQUESTS_PER_SECOND;

        let buckets = LATENCY_BUCKETS
            .iter()
            .map(|&le| Bucket {
                le,
                cumulative: if le >= mean {
                    count
                } else {
                    count * (le / mean).sqrt()
                },
            })
            .collect();

        Self {
            buckets,
            sum: mean * count,
            count,
        }
    }
}

/// Renders the counter, histogram and gauge families.
pub fn render(metrics: &MetricValues) -> String {
    let mut out = String::new();

    let errors = Series::ErrorCount;
    push_header(&mut out, errors);
    out.push_str(&format!(
        "{}{{job=\"{}\"}} {:.2}\n\n",
        errors,
        JOB_LABEL,
        metrics.errors_per_second()
    ));

    let latency = Series::RequestDuration;
    push_header(&mut out, latency);
    let histogram = LatencyHistogram::from_metrics(metrics);
    for bucket in &histogram.buckets {
        out.push_str(&format!(
            "{}_bucket{{job=\"{}\",le=\"{:.3}\"}} {:.0}\n",
            latency, JOB_LABEL, bucket.le, bucket.cumulative
        ));
    }
    out.push_str(&format!(
        "{}_bucket{{job=\"{}\",le=\"+Inf\"}} {:.0}\n",
        latency, JOB_LABEL, histogram.count
    ));
    out.push_str(&format!(
        "{}_sum{{job=\"{}\"}} {:.3}\n",
        latency, JOB_LABEL, histogram.sum
    ));
    out.push_str(&format!(
        "{}_count{{job=\"{}\"}} {:.0}\n\n",
        latency, JOB_LABEL, histogram.count
    ));

    let up = Series::Up;
    push_header(&mut out, up);
    out.push_str(&format!("{}{{job=\"{}\"}} {:.0}\n", up, JOB_LABEL, metrics.up));

    out
}

fn push_header(out: &mut String, series: Series) {
    out.push_str(&format!("# HELP {} {}\n", series, series.help()));
    out.push_str(&format!("# TYPE {} {}\n", series, series.metric_type()));
}
