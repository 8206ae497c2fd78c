//! Stage Environment Abstraction Layer
//!
//! This crate isolates everything the metrics engine needs from the outside
//! world so the engine itself stays a set of pure, testable functions:
//! - Time (`now()`, `system_time()`)
//! - Process configuration (`StageConfig`)
//!
//! # Core Concept: One Injection Point For "Now"
//!
//! Every elapsed-time calculation in `stage_core` reads the clock through the
//! [`StageClock`] trait. Production wiring passes a [`SystemClock`]; tests and
//! the timeline runner pass a [`ManualClock`] and move time explicitly, so a
//! ten-minute degradation curve can be checked without a single real sleep.
//!
//! # Example
//!
//! ```ignore
//! use stage_env::{ManualClock, StageClock};
//! use std::time::Duration;
//!
//! let clock = ManualClock::new();
//! let start = clock.now();
//! clock.advance(Duration::from_secs(300));
//! assert_eq!(clock.now() - start, Duration::from_secs(300));
//! ```

mod clock;
mod config;
mod error;
mod manual;
mod system;

pub use clock::{SharedClock, StageClock};
pub use config::StageConfig;
pub use error::EnvError;
pub use manual::ManualClock;
pub use system::SystemClock;
