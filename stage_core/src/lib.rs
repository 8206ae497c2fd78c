//! Stage Core - Synthetic Prometheus Metrics Engine
//!
//! Emulates just enough of a Prometheus backend to drive dashboards and
//! continuous-verification checks during a demo:
//! 1. **Scenario Catalog**: four fixed degradation profiles, each a pure
//!    function of elapsed time
//! 2. **Scenario Engine**: the active scenario and its start time, switched
//!    and reset atomically under concurrent access
//! 3. **Query Evaluator**: `rate(...)`, `histogram_quantile(...)` and raw
//!    series lookups against the live values
//! 4. **Exposition Formatter**: the text format scraped from `/metrics`,
//!    with histogram buckets synthesized from a single latency value

pub mod engine;
pub mod exposition;
pub mod metrics;
pub mod query;
pub mod scenario;

// Re-export key types for convenience
pub use engine::{format_elapsed, ScenarioEngine, ScenarioStatus};
pub use metrics::{MetricValues, Series, BASELINE_REQUESTS_PER_SECOND, JOB_LABEL};
pub use query::{InstantSample, Query, QueryError, QueryErrorKind, QueryResponse};
pub use scenario::{Scenario, ScenarioError, ScenarioKind, ScenarioSummary};
