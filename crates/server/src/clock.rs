//! Time source for presence timestamps and message labels.

use chrono::{Local, TimeZone, Utc};
use parking_lot::Mutex;

pub trait Clock: Send + Sync + 'static {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;

    /// `HH:MM:SS` label for a message created now.
    fn time_label(&self) -> String {
        match Local.timestamp_millis_opt(self.now_ms()).single() {
            Some(at) => at.format("%H:%M:%S").to_string(),
            None => Local::now().format("%H:%M:%S").to_string(),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Mutex<i64>,
}

impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        Self {
            now: Mutex::new(start_ms),
        }
    }

    pub fn advance_ms(&self, delta: i64) {
        *self.now.lock() += delta;
    }

    pub fn set_ms(&self, at: i64) {
        *self.now.lock() = at;
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        *self.now.lock()
    }
}
