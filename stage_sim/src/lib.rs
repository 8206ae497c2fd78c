//! Stage Simulation Harness and Server
//!
//! Everything that sits around the metrics engine:
//! - **Timeline runner**: plays a scenario on a virtual clock and checks the
//!   engine's invariants at every step, no real sleeps involved
//! - **Exporter**: writes timeline results as JSON for plotting
//! - **Server**: the HTTP endpoints a dashboard or verification job talks to
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     stage-sim (CLI)                      │
//! │   serve ──────────────┐          timeline / query /      │
//! │                       │          metrics                 │
//! │  ┌────────────────────▼───┐    ┌──────────────────────┐  │
//! │  │ axum Router            │    │ TimelineRunner       │  │
//! │  │ (SystemClock)          │    │ (ManualClock)        │  │
//! │  └───────────┬────────────┘    └──────────┬───────────┘  │
//! │              │                            │              │
//! │         ┌────▼────────────────────────────▼───┐          │
//! │         │        stage_core::ScenarioEngine   │          │
//! │         └─────────────────────────────────────┘          │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use stage_core::ScenarioKind;
//! use stage_sim::TimelineRunner;
//! use std::time::Duration;
//!
//! let result = TimelineRunner::new(ScenarioKind::LatencySpike)
//!     .with_step(Duration::from_secs(10))
//!     .run();
//! assert!(result.passed());
//! ```

mod error;
mod exporter;
mod runner;
pub mod server;

pub use error::SimError;
pub use exporter::TimelineExport;
pub use runner::{QueryOutcome, TimelineResult, TimelineRunner, TimelineSample};
