//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` provides the same interface as the CLI driver but for
//! deterministic testing. It implements [`Driver`] so the same
//! [`rider_app::Runtime`] orchestration code runs in both production and
//! simulation.
//!
//! Requests are answered synchronously by a [`SimBackend`]; their responses
//! are queued behind inputs that were already waiting, as if the network
//! took a moment. The realtime channel connects when nothing else is queued,
//! after sleeping the requested backoff on the [`SimEnv`] clock.

#![allow(clippy::disallowed_types, reason = "Synchronous locking operations only")]

use std::{
    collections::VecDeque,
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use rider_app::{Driver, Input, Snapshot};
use rider_client::{ClientEvent, Notice, RequestId, Screen};
use rider_proto::Endpoint;

use crate::{InvariantRegistry, SimBackend, SimEnv, Violation};

/// Error type for simulation driver.
#[derive(Debug, Clone)]
pub struct SimDriverError(pub String);

impl std::fmt::Display for SimDriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimDriverError: {}", self.0)
    }
}

impl std::error::Error for SimDriverError {}

impl From<Vec<Violation>> for SimDriverError {
    fn from(violations: Vec<Violation>) -> Self {
        let messages: Vec<_> = violations.iter().map(ToString::to_string).collect();
        Self(format!("invariant violation:\n  {}", messages.join("\n  ")))
    }
}

/// Realtime channel as seen by the simulated network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    /// No connection.
    Down,
    /// Connection attempt scheduled after a backoff.
    Dialing(Duration),
    /// Connected. Backend signals are delivered.
    Up,
}

/// Shared state for event injection.
///
/// This allows injection from outside async contexts.
#[derive(Debug)]
struct SharedState {
    backend: SimBackend,
    inputs: VecDeque<Input>,
    link: Link,
    generation: u64,
    refused_connects: u32,
    dial_log: Vec<Duration>,
    screens: Vec<Screen>,
    notices: Vec<Notice>,
    last_frame: Option<Snapshot>,
    renders: usize,
    stopped: bool,
}

/// Simulation driver for deterministic testing.
///
/// Clones share state, so a test keeps one clone to inject inputs and
/// inspect results while the runtime owns the other.
#[derive(Debug, Clone)]
pub struct SimDriver {
    env: SimEnv,
    state: Arc<Mutex<SharedState>>,
    invariants: Option<Arc<InvariantRegistry>>,
}

impl SimDriver {
    /// Create a new simulation driver in front of `backend`.
    pub fn new(env: SimEnv, backend: SimBackend) -> Self {
        let state = SharedState {
            backend,
            inputs: VecDeque::new(),
            link: Link::Down,
            generation: 0,
            refused_connects: 0,
            dial_log: Vec::new(),
            screens: Vec::new(),
            notices: Vec::new(),
            last_frame: None,
            renders: 0,
            stopped: false,
        };
        Self { env, state: Arc::new(Mutex::new(state)), invariants: None }
    }

    /// Enable invariant checking on every render.
    #[must_use]
    pub fn with_invariants(mut self, registry: InvariantRegistry) -> Self {
        self.invariants = Some(Arc::new(registry));
        self
    }

    fn lock(&self) -> MutexGuard<'_, SharedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a client event, e.g. a user intent.
    pub fn inject(&self, event: ClientEvent) {
        self.lock().inputs.push_back(Input::Event(event));
    }

    /// Queue a quit.
    pub fn inject_quit(&self) {
        self.lock().inputs.push_back(Input::Quit);
    }

    /// Run `f` against the backend, e.g. to assign an order.
    pub fn with_backend<R>(&self, f: impl FnOnce(&mut SimBackend) -> R) -> R {
        f(&mut self.lock().backend)
    }

    /// Refuse the next `count` realtime connection attempts.
    pub fn refuse_connects(&self, count: u32) {
        self.lock().refused_connects = count;
    }

    /// Drop an open realtime connection from the server side.
    pub fn drop_link(&self, reason: &str) {
        let mut state = self.lock();
        if state.link == Link::Up {
            state.link = Link::Down;
            let generation = state.generation;
            let event = ClientEvent::RealtimeClosed { generation, reason: reason.to_owned() };
            state.inputs.push_back(Input::Event(event));
        }
    }

    /// Realtime link state.
    pub fn link(&self) -> Link {
        self.lock().link
    }

    /// Backoff of every realtime connection attempt, in order.
    pub fn dial_log(&self) -> Vec<Duration> {
        self.lock().dial_log.clone()
    }

    /// Screens navigated to, in order.
    pub fn screens(&self) -> Vec<Screen> {
        self.lock().screens.clone()
    }

    /// Notices shown, in order.
    pub fn notices(&self) -> Vec<Notice> {
        self.lock().notices.clone()
    }

    /// Most recent rendered snapshot.
    pub fn last_frame(&self) -> Option<Snapshot> {
        self.lock().last_frame.clone()
    }

    /// Number of renders.
    pub fn renders(&self) -> usize {
        self.lock().renders
    }

    /// Whether the runtime stopped the driver.
    pub fn is_stopped(&self) -> bool {
        self.lock().stopped
    }

    /// Check if there are pending inputs, signals or connection attempts.
    pub fn has_pending(&self) -> bool {
        let state = self.lock();
        !state.inputs.is_empty() || matches!(state.link, Link::Dialing(_))
    }

    /// Next input in delivery order: queued inputs, then backend signals
    /// over an open link, then a pending connection attempt.
    fn pop_input(&self) -> Option<Input> {
        let mut state = self.lock();
        if let Some(input) = state.inputs.pop_front() {
            return Some(input);
        }

        let signals = state.backend.take_signals();
        if state.link == Link::Up && !signals.is_empty() {
            tracing::trace!(count = signals.len(), "delivering realtime signals");
            let events = signals.into_iter().map(|s| Input::Event(ClientEvent::Realtime(s)));
            state.inputs.extend(events);
            return state.inputs.pop_front();
        }

        if let Link::Dialing(delay) = state.link {
            self.env.advance(delay);
            let generation = state.generation;
            if state.refused_connects > 0 {
                state.refused_connects -= 1;
                state.link = Link::Down;
                let reason = "connection refused".to_owned();
                return Some(Input::Event(ClientEvent::RealtimeClosed { generation, reason }));
            }
            state.link = Link::Up;
            return Some(Input::Event(ClientEvent::RealtimeOpened { generation }));
        }
        None
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;

    fn next_input(&mut self) -> impl Future<Output = Result<Option<Input>, Self::Error>> + Send {
        std::future::ready(Ok(self.pop_input()))
    }

    fn execute(&mut self, id: RequestId, endpoint: Endpoint, token: Option<String>) {
        let mut state = self.lock();
        let result = state.backend.handle(&endpoint, token.as_deref());
        state.inputs.push_back(Input::Event(ClientEvent::Response { id, result }));
    }

    fn open_realtime(&mut self, delay: Duration, generation: u64) {
        let mut state = self.lock();
        state.dial_log.push(delay);
        state.link = Link::Dialing(delay);
        state.generation = generation;
        // Signals raised while disconnected are never delivered
        state.backend.take_signals();
    }

    fn close_realtime(&mut self) {
        self.lock().link = Link::Down;
    }

    fn navigate(&mut self, screen: &Screen) {
        self.lock().screens.push(screen.clone());
    }

    fn notify(&mut self, notice: &Notice) {
        self.lock().notices.push(notice.clone());
    }

    fn render(&mut self, snapshot: &Snapshot) -> Result<(), Self::Error> {
        {
            let mut state = self.lock();
            state.renders += 1;
            state.last_frame = Some(snapshot.clone());
        }
        match &self.invariants {
            Some(registry) => registry.check_all(snapshot).map_err(SimDriverError::from),
            None => Ok(()),
        }
    }

    fn stop(&mut self) {
        let mut state = self.lock();
        state.stopped = true;
        state.link = Link::Down;
    }
}
