//! Manually driven clock for deterministic tests and timeline runs.

use crate::StageClock;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Largest virtual time reflected in wall-clock readings (about 10,000 years).
///
/// Keeps `system_time()` representable both as a `SystemTime` and as a
/// chrono `DateTime<Utc>`, whatever `now()` has been pushed to.
pub const MAX_WALL_OFFSET: Duration = Duration::from_secs(10_000 * 365 * 24 * 3600);

/// Virtual clock that only moves when told to.
///
/// This implements `StageClock` using:
/// - A virtual monotonic time that starts at zero
/// - A fixed epoch so that wall-clock timestamps are reproducible
///
/// Clones share the same underlying time, so a test can hand one clone to an
/// engine and keep another to advance it.
pub struct ManualClock {
    /// Current virtual time since clock creation
    virtual_time: Arc<Mutex<Duration>>,

    /// Epoch offset (virtual time 0 maps to this wall-clock time)
    epoch: SystemTime,
}

impl ManualClock {
    /// Creates a new ManualClock at virtual time zero.
    pub fn new() -> Self {
        Self {
            virtual_time: Arc::new(Mutex::new(Duration::ZERO)),
            epoch: UNIX_EPOCH + Duration::from_secs(1704067200), // 2024-01-01 00:00:00 UTC
        }
    }

    /// Creates an Arc-wrapped clock for sharing.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Advances virtual time by the given duration.
    pub fn advance(&self, duration: Duration) {
        let mut time = self.virtual_time.lock();
        *time = time.saturating_add(duration);
    }

    /// Sets the virtual time to a specific value.
    ///
    /// Moving time backwards is allowed here; the engine saturates elapsed
    /// time at zero.
    pub fn set(&self, time: Duration) {
        *self.virtual_time.lock() = time;
    }

    /// Returns the wall-clock time that virtual time zero maps to.
    pub fn epoch(&self) -> SystemTime {
        self.epoch
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for ManualClock {
    fn clone(&self) -> Self {
        Self {
            virtual_time: Arc::clone(&self.virtual_time),
            epoch: self.epoch,
        }
    }
}

impl StageClock for ManualClock {
    fn now(&self) -> Duration {
        *self.virtual_time.lock()
    }

    fn system_time(&self) -> SystemTime {
        let offset = self.now().min(MAX_WALL_OFFSET);
        self.epoch.checked_add(offset).unwrap_or(self.epoch)
    }
}
