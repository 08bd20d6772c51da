//! Generic runtime for application orchestration.
//!
//! The Runtime drives the application event loop, coordinating between:
//! - [`Client`]: rider state machine
//! - [`TokenStore`]: session persistence
//! - [`Driver`]: platform-specific I/O

use rider_client::{
    Client, ClientAction, ClientConfig, ClientEvent, Environment, LogLevel, Notice, Screen,
    TokenStore,
};
use tokio::sync::watch;

use crate::{Driver, Input, Snapshot};

/// Generic runtime that orchestrates Client, TokenStore, and Driver.
///
/// # Type Parameters
///
/// - `D`: Platform-specific I/O driver
/// - `E`: Environment providing the wall clock
/// - `S`: Session token persistence
pub struct Runtime<D, E, S>
where
    D: Driver,
    E: Environment,
    S: TokenStore,
{
    driver: D,
    client: Client<E>,
    store: S,
    screen: Screen,
    notice: Option<Notice>,
    snapshot: watch::Sender<Snapshot>,
}

impl<D, E, S> Runtime<D, E, S>
where
    D: Driver,
    E: Environment,
    S: TokenStore,
{
    /// Create a new runtime with the given driver, environment and store.
    pub fn new(driver: D, env: E, config: ClientConfig, store: S) -> Self {
        let (snapshot, _) = watch::channel(Snapshot::default());
        Self {
            driver,
            client: Client::new(env, config),
            store,
            screen: Screen::Login,
            notice: None,
            snapshot,
        }
    }

    /// Subscribe to state published on every render.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot.subscribe()
    }

    /// The client state machine.
    pub fn client(&self) -> &Client<E> {
        &self.client
    }

    /// The driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Mutable access to the driver, e.g. to inject inputs in tests.
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Screen last navigated to.
    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    /// Run the main event loop.
    ///
    /// 1. Reads the persisted token and feeds it to the client
    /// 2. Feeds driver inputs to the client until [`Input::Quit`] or the
    ///    driver runs dry
    /// 3. Executes the resulting actions through the driver
    ///
    /// The realtime channel is closed and the driver stopped on every exit
    /// path.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn run(mut self) -> Result<(), D::Error> {
        let result = self.event_loop().await;
        self.driver.close_realtime();
        self.driver.stop();
        result
    }

    async fn event_loop(&mut self) -> Result<(), D::Error> {
        self.render()?;
        self.restore_session()?;
        while self.step().await? {}
        Ok(())
    }

    /// Process one driver input.
    ///
    /// Returns `false` once the runtime should stop.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn step(&mut self) -> Result<bool, D::Error> {
        match self.driver.next_input().await? {
            Some(Input::Event(event)) => {
                self.dispatch(event)?;
                Ok(true)
            },
            Some(Input::Quit) | None => Ok(false),
        }
    }

    /// Read the persisted token and hand it to the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails to render.
    pub fn restore_session(&mut self) -> Result<(), D::Error> {
        let event = match self.store.load() {
            Ok(token) => ClientEvent::TokenRestored(token),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read session token");
                ClientEvent::TokenRestoreFailed { reason: e.to_string() }
            },
        };
        self.dispatch(event)
    }

    /// Feed one event to the client and execute its actions.
    ///
    /// A refused intent becomes an error notice; it never stops the loop.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails to render.
    pub fn dispatch(&mut self, event: ClientEvent) -> Result<(), D::Error> {
        match self.client.handle(event) {
            Ok(actions) => self.execute(actions),
            Err(err) => {
                tracing::debug!(error = %err, "intent refused");
                let mut actions = vec![ClientAction::Notify(Notice::error(err.to_string()))];
                if err.requires_login() {
                    actions.push(ClientAction::Navigate(Screen::Login));
                }
                actions.push(ClientAction::Render);
                self.execute(actions)
            },
        }
    }

    fn execute(&mut self, actions: Vec<ClientAction>) -> Result<(), D::Error> {
        for action in actions {
            match action {
                ClientAction::Request { id, endpoint, token } => {
                    tracing::debug!(%id, endpoint = endpoint.name(), "request");
                    self.driver.execute(id, endpoint, token);
                },
                ClientAction::PersistToken(token) => {
                    if let Err(e) = self.store.save(&token) {
                        tracing::warn!(error = %e, "failed to persist session token");
                    }
                },
                ClientAction::ForgetToken => {
                    if let Err(e) = self.store.clear() {
                        tracing::warn!(error = %e, "failed to clear session token");
                    }
                },
                ClientAction::OpenRealtime { delay, generation } => {
                    tracing::debug!(
                        delay_ms = delay.as_millis() as u64,
                        generation,
                        "opening realtime"
                    );
                    self.driver.open_realtime(delay, generation);
                },
                ClientAction::CloseRealtime => self.driver.close_realtime(),
                ClientAction::Navigate(screen) => {
                    self.driver.navigate(&screen);
                    self.screen = screen;
                },
                ClientAction::Notify(notice) => {
                    self.driver.notify(&notice);
                    self.notice = Some(notice);
                },
                ClientAction::Render => self.render()?,
                ClientAction::Log { level, message } => match level {
                    LogLevel::Debug => tracing::debug!("{message}"),
                    LogLevel::Info => tracing::info!("{message}"),
                    LogLevel::Warn => tracing::warn!("{message}"),
                },
            }
        }
        Ok(())
    }

    fn render(&mut self) -> Result<(), D::Error> {
        let snapshot = Snapshot::capture(&self.client, &self.screen, self.notice.as_ref());
        self.driver.render(&snapshot)?;
        self.snapshot.send_replace(snapshot);
        Ok(())
    }
}
