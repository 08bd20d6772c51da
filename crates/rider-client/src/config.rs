//! Client configuration.

use std::time::Duration;

/// Backend location and timing knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the REST backend, e.g. `https://api.example.com`. The
    /// realtime endpoint is derived from it.
    pub api_url: String,
    /// Per-request timeout enforced by the transport.
    pub request_timeout: Duration,
    /// First realtime reconnect delay.
    pub reconnect_base: Duration,
    /// Upper bound of the reconnect delay.
    pub reconnect_max: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3000".to_owned(),
            request_timeout: Duration::from_secs(30),
            reconnect_base: Duration::from_secs(1),
            reconnect_max: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    /// Default configuration against `api_url`.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self { api_url: api_url.into(), ..Self::default() }
    }

    /// Delay before reconnect attempt `attempt` (0-based):
    /// `reconnect_base * 2^attempt`, capped at `reconnect_max`.
    pub fn reconnect_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.reconnect_base.saturating_mul(factor).min(self.reconnect_max)
    }
}
