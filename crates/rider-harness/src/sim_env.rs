//! Virtual clock shared by the client and the simulated backend.

use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicI64, Ordering},
    },
    time::Duration,
};

use chrono::{DateTime, Utc};
use rider_core::env::Environment;

/// 2025-01-01T00:00:00Z.
pub const SIM_EPOCH_MS: i64 = 1_735_689_600_000;

/// Deterministic environment. Time only moves when a test advances it or
/// something sleeps.
#[derive(Debug, Clone)]
pub struct SimEnv {
    now_ms: Arc<AtomicI64>,
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl SimEnv {
    /// Clock starting at [`SIM_EPOCH_MS`].
    pub fn new() -> Self {
        Self::at(SIM_EPOCH_MS)
    }

    /// Clock starting at `now_ms`.
    pub fn at(now_ms: i64) -> Self {
        Self { now_ms: Arc::new(AtomicI64::new(now_ms)) }
    }

    /// Current virtual time in epoch milliseconds.
    pub fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }

    /// Current virtual time as a UTC timestamp.
    pub fn now_utc(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.now_ms()).unwrap_or_default()
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        self.now_ms.fetch_add(by.as_millis() as i64, Ordering::SeqCst);
    }
}

impl Environment for SimEnv {
    fn wall_clock_ms(&self) -> i64 {
        self.now_ms()
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        self.advance(duration);
        std::future::ready(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_clock() {
        let env = SimEnv::new();
        let other = env.clone();

        env.advance(Duration::from_secs(90));
        assert_eq!(other.wall_clock_ms(), SIM_EPOCH_MS + 90_000);
        assert_eq!(other.now_utc().to_rfc3339(), "2025-01-01T00:01:30+00:00");
    }

    #[test]
    fn sleep_advances_virtual_time() {
        let env = SimEnv::at(0);
        drop(env.sleep(Duration::from_millis(250)));
        assert_eq!(env.now_ms(), 250);
    }
}
