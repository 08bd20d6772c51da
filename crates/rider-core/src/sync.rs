//! Single-flight guard for collection refreshes.

/// Allows at most one fetch of a collection in flight.
///
/// A refresh requested while one is running is remembered, not dropped: when
/// the running fetch completes, [`FetchGate::complete`] reports that exactly
/// one more fetch should be issued. Any number of requests made during a
/// single fetch collapse into that one follow-up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchGate {
    in_flight: bool,
    queued: bool,
}

impl FetchGate {
    /// Idle gate.
    pub const fn new() -> Self {
        Self { in_flight: false, queued: false }
    }

    /// Ask to fetch. Returns `true` if the caller should issue the request
    /// now, `false` if it was queued behind the running fetch.
    pub fn request(&mut self) -> bool {
        if self.in_flight {
            self.queued = true;
            false
        } else {
            self.in_flight = true;
            true
        }
    }

    /// Mark the running fetch as finished. Returns `true` if a queued
    /// refresh must be issued now; the gate then stays in flight.
    pub fn complete(&mut self) -> bool {
        if self.queued {
            self.queued = false;
            self.in_flight = true;
            true
        } else {
            self.in_flight = false;
            false
        }
    }

    /// Whether a fetch is running.
    pub const fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Forget everything, e.g. on logout.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
