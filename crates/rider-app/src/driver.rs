//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the application runtime from specific I/O
//! implementations. Each frontend implements the trait to provide
//! platform-specific I/O, while the generic [`crate::Runtime`] handles all
//! orchestration.

use std::{future::Future, time::Duration};

use rider_client::{Notice, RequestId, Screen};
use rider_proto::Endpoint;

use crate::{Input, Snapshot};

/// Abstracts I/O operations for the application runtime.
///
/// Implementations provide platform-specific I/O while the generic
/// [`Runtime`](crate::Runtime) handles orchestration logic. This ensures
/// the same orchestration code runs in the production CLI and simulation.
///
/// Requests and the realtime channel are fire-and-forget from the runtime's
/// point of view: their outcomes come back through
/// [`next_input`](Driver::next_input) as
/// [`ClientEvent::Response`](rider_client::ClientEvent::Response),
/// [`ClientEvent::Realtime`](rider_client::ClientEvent::Realtime),
/// [`ClientEvent::RealtimeOpened`](rider_client::ClientEvent::RealtimeOpened) and
/// [`ClientEvent::RealtimeClosed`](rider_client::ClientEvent::RealtimeClosed).
///
/// # Implementations
///
/// - **CLI**: stdin commands, `reqwest` requests, WebSocket realtime
/// - **Simulation**: scripted inputs and an in-memory backend
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Wait for the next input.
    ///
    /// Returns `None` once no more input will arrive.
    fn next_input(&mut self) -> impl Future<Output = Result<Option<Input>, Self::Error>> + Send;

    /// Start a request. Its outcome must be delivered as a response input
    /// carrying `id`.
    fn execute(&mut self, id: RequestId, endpoint: Endpoint, token: Option<String>);

    /// Connect the realtime channel after `delay`, replacing any existing
    /// connection.
    ///
    /// The connection's opened and closed events must carry `generation`.
    fn open_realtime(&mut self, delay: Duration, generation: u64);

    /// Disconnect the realtime channel. No-op when already closed.
    fn close_realtime(&mut self);

    /// Show a screen.
    fn navigate(&mut self, screen: &Screen);

    /// Show a notice.
    fn notify(&mut self, notice: &Notice);

    /// Render the application state.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, snapshot: &Snapshot) -> Result<(), Self::Error>;

    /// Stop pending work and clean up resources.
    fn stop(&mut self);
}
