//! Wall-clock time source for the running server.

use crate::StageClock;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

/// Reads scenario elapsed time from `Instant` and status timestamps from
/// `SystemTime`.
///
/// `now()` counts from construction, so an engine built on this clock sees
/// its first scenario activate at zero. Adjusting the host clock moves
/// reported `start_time` values but never scenario progress.
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Handle suitable for `ScenarioEngine::new`.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl StageClock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn system_time(&self) -> SystemTime {
        SystemTime::now()
    }
}
