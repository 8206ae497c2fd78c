//! Core clock trait for the Stage metrics engine.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// The single source of "now" for the metrics engine.
///
/// This trait abstracts the wall clock so that scenario progression can be
/// computed against real time in production and against a virtual clock in
/// tests and timeline runs.
///
/// # Implementations
///
/// - **Production**: `SystemClock` - wraps `Instant` and `SystemTime`
/// - **Simulation**: `ManualClock` - virtual time advanced by the caller
pub trait StageClock: Send + Sync + 'static {
    /// Returns the current monotonic time since clock creation.
    ///
    /// All elapsed-time arithmetic uses this value, so it must never go
    /// backwards.
    fn now(&self) -> Duration;

    /// Returns the wall-clock time.
    ///
    /// Used only for reported timestamps (scenario start time, query
    /// evaluation time), never for interpolation.
    fn system_time(&self) -> SystemTime;
}

/// Clock handle shared between the engine and its callers.
pub type SharedClock = Arc<dyn StageClock>;
