//! Whole-app simulation for scenario and property tests.
//!
//! [`Simulation`] wires the production [`Runtime`] to a [`SimDriver`] in
//! front of a [`SimBackend`], sharing one [`SimEnv`] clock. Tests script the
//! backend, inject intents and let the runtime settle: every request is
//! answered and every realtime signal delivered before control returns.

use rider_app::{Runtime, Snapshot};
use rider_client::{Client, ClientConfig, ClientEvent, MemoryTokenStore, Screen, TokenStore};

use crate::{
    InvariantRegistry, SimBackend, SimDriver, SimEnv,
    fixtures::{RIDER_EMAIL, RIDER_PASSWORD},
    sim_driver::SimDriverError,
};

/// Upper bound on inputs processed by one [`Simulation::settle`].
pub const MAX_SETTLE_STEPS: usize = 10_000;

/// Runtime, backend and clock of one simulated rider device.
pub struct Simulation {
    env: SimEnv,
    driver: SimDriver,
    store: MemoryTokenStore,
    runtime: Runtime<SimDriver, SimEnv, MemoryTokenStore>,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulation {
    /// Fresh device with an empty token store. Every render is checked
    /// against [`InvariantRegistry::standard`].
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// Fresh device with custom client configuration.
    pub fn with_config(config: ClientConfig) -> Self {
        let env = SimEnv::new();
        let driver = SimDriver::new(env.clone(), SimBackend::new(env.clone()))
            .with_invariants(InvariantRegistry::standard());
        let store = MemoryTokenStore::new();
        let runtime = Runtime::new(driver.clone(), env.clone(), config, store.clone());
        Self { env, driver, store, runtime }
    }

    /// Seed the token store with a token the backend accepts, as if the
    /// rider had logged in during an earlier run.
    pub fn remember_session(&self) -> Result<String, SimDriverError> {
        let token = self.driver.with_backend(SimBackend::issue_token);
        self.store.save(&token).map_err(|e| SimDriverError(e.to_string()))?;
        Ok(token)
    }

    /// Launch the app: read the stored token and settle.
    ///
    /// # Errors
    ///
    /// Returns the first invariant violation, or an error if the system does
    /// not settle.
    pub async fn start(&mut self) -> Result<(), SimDriverError> {
        self.runtime.restore_session()?;
        self.settle().await
    }

    /// Process inputs until nothing is left to deliver.
    ///
    /// # Errors
    ///
    /// Returns the first invariant violation, or an error after
    /// [`MAX_SETTLE_STEPS`] inputs.
    pub async fn settle(&mut self) -> Result<(), SimDriverError> {
        for _ in 0..MAX_SETTLE_STEPS {
            if !self.runtime.step().await? {
                return Ok(());
            }
        }
        Err(SimDriverError(format!("not settled after {MAX_SETTLE_STEPS} inputs")))
    }

    /// Inject an event and settle.
    ///
    /// # Errors
    ///
    /// See [`Simulation::settle`].
    pub async fn act(&mut self, event: ClientEvent) -> Result<(), SimDriverError> {
        self.driver.inject(event);
        self.settle().await
    }

    /// Log in with the fixture rider's credentials.
    ///
    /// # Errors
    ///
    /// See [`Simulation::settle`].
    pub async fn login(&mut self) -> Result<(), SimDriverError> {
        let event = ClientEvent::Login {
            email: RIDER_EMAIL.to_owned(),
            password: RIDER_PASSWORD.to_owned(),
        };
        self.act(event).await
    }

    /// Run `f` against the backend.
    pub fn backend<R>(&self, f: impl FnOnce(&mut SimBackend) -> R) -> R {
        self.driver.with_backend(f)
    }

    /// The simulation driver, for fault injection and inspection.
    pub fn driver(&self) -> &SimDriver {
        &self.driver
    }

    /// The client state machine.
    pub fn client(&self) -> &Client<SimEnv> {
        self.runtime.client()
    }

    /// The token store.
    pub fn store(&self) -> &MemoryTokenStore {
        &self.store
    }

    /// The shared clock.
    pub fn env(&self) -> &SimEnv {
        &self.env
    }

    /// Screen last navigated to.
    pub fn screen(&self) -> &Screen {
        self.runtime.screen()
    }

    /// State as of the most recent render.
    pub fn frame(&self) -> Snapshot {
        self.driver.last_frame().unwrap_or_default()
    }
}
