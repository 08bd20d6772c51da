//! Environment abstraction for deterministic testing.
//!
//! The state machines never read the system clock directly. Production code
//! passes a system-backed environment; tests and the simulation harness pass
//! a virtual clock they can advance at will.

use std::{future::Future, time::Duration};

/// Time source and async sleep used by the client and its runtime.
///
/// # Invariants
///
/// - `wall_clock_ms()` returns Unix epoch milliseconds. Server-provided
///   deadlines (password reset cooldown) are compared against it.
/// - `sleep()` is only awaited by driver code, never by the state machines.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Current wall-clock time in Unix epoch milliseconds.
    fn wall_clock_ms(&self) -> i64;

    /// Sleep for `duration`.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// Environments for unit tests.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils {
    use std::{
        future::Future,
        sync::{
            Arc,
            atomic::{AtomicI64, Ordering},
        },
        time::Duration,
    };

    use super::Environment;

    /// Manually driven clock. `sleep` advances the clock and returns
    /// immediately.
    #[derive(Debug, Clone, Default)]
    pub struct MockEnv {
        now_ms: Arc<AtomicI64>,
    }

    impl MockEnv {
        /// Clock starting at the Unix epoch.
        pub fn new() -> Self {
            Self::default()
        }

        /// Clock starting at `now_ms`.
        pub fn at(now_ms: i64) -> Self {
            Self { now_ms: Arc::new(AtomicI64::new(now_ms)) }
        }

        /// Move the clock forward.
        pub fn advance(&self, by: Duration) {
            self.now_ms.fetch_add(by.as_millis() as i64, Ordering::SeqCst);
        }
    }

    impl Environment for MockEnv {
        fn wall_clock_ms(&self) -> i64 {
            self.now_ms.load(Ordering::SeqCst)
        }

        fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
            self.advance(duration);
            std::future::ready(())
        }
    }
}
