//! Console driver for the CLI.
//!
//! Implements the [`Driver`] trait for line-oriented console I/O: commands
//! arrive as text lines, frames are printed as text. Requests run on spawned
//! tokio tasks through [`HttpExecutor`], the realtime channel through
//! [`spawn_realtime`]. Both report back over one event channel.

use std::{
    io::{self, Write},
    time::Duration,
};

use rider_app::{
    Driver, Input, Snapshot,
    input::{self, Command, HELP},
};
use rider_client::{
    ClientConfig, ClientEvent, Notice, RequestId, Screen,
    transport::{HttpExecutor, RealtimeConnection, TransportError, spawn_realtime},
};
use rider_proto::Endpoint;
use thiserror::Error;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};

use crate::view;

/// Capacity of the response and realtime event channel.
const EVENT_BUFFER: usize = 256;

/// Console driver errors.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// I/O error writing to the console.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Read stdin line by line on a background task.
///
/// The receiver closes when stdin reaches end of file.
pub fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).await.is_err() {
                        break;
                    }
                },
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "stdin read failed");
                    break;
                },
            }
        }
    });
    rx
}

/// Console driver implementing the [`Driver`] trait.
///
/// Owns the network side of the client and writes frames and notices to
/// `W`. A frame is only written when its text changed.
pub struct ConsoleDriver<W> {
    api_url: String,
    http: HttpExecutor,
    events_tx: mpsc::Sender<ClientEvent>,
    events_rx: mpsc::Receiver<ClientEvent>,
    lines: mpsc::Receiver<String>,
    realtime: Option<RealtimeConnection>,
    out: W,
    last_frame: String,
}

impl<W: Write + Send> ConsoleDriver<W> {
    /// Create a driver reading commands from `lines` and writing to `out`.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Transport`] if the HTTP client cannot be
    /// built.
    pub fn new(
        config: &ClientConfig,
        lines: mpsc::Receiver<String>,
        out: W,
    ) -> Result<Self, ConsoleError> {
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        Ok(Self {
            api_url: config.api_url.clone(),
            http: HttpExecutor::new(config)?,
            events_tx,
            events_rx,
            lines,
            realtime: None,
            out,
            last_frame: String::new(),
        })
    }

    /// The console output.
    pub fn output(&self) -> &W {
        &self.out
    }

    /// Turn a command line into an input. Help and parse errors are answered
    /// on the console and yield nothing.
    fn handle_line(&mut self, line: &str) -> Result<Option<Input>, ConsoleError> {
        if line.trim().is_empty() {
            return Ok(None);
        }
        match input::parse(line) {
            Ok(Command::Input(input)) => Ok(Some(input)),
            Ok(Command::Help) => {
                writeln!(self.out, "{HELP}")?;
                Ok(None)
            },
            Err(e) => {
                writeln!(self.out, "[error] {e}")?;
                Ok(None)
            },
        }
    }

    async fn wait_input(&mut self) -> Result<Option<Input>, ConsoleError> {
        loop {
            tokio::select! {
                Some(event) = self.events_rx.recv() => return Ok(Some(Input::Event(event))),
                line = self.lines.recv() => match line {
                    Some(line) => {
                        if let Some(input) = self.handle_line(&line)? {
                            return Ok(Some(input));
                        }
                        self.out.flush()?;
                    },
                    None => return Ok(Some(Input::Quit)),
                },
            }
        }
    }
}

impl<W: Write + Send> Driver for ConsoleDriver<W> {
    type Error = ConsoleError;

    fn next_input(
        &mut self,
    ) -> impl std::future::Future<Output = Result<Option<Input>, Self::Error>> + Send {
        self.wait_input()
    }

    fn execute(&mut self, id: RequestId, endpoint: Endpoint, token: Option<String>) {
        let http = self.http.clone();
        let events = self.events_tx.clone();
        tracing::debug!(?id, name = endpoint.name(), "request");
        tokio::spawn(async move {
            let result = http.execute(&endpoint, token.as_deref()).await;
            let _ = events.send(ClientEvent::Response { id, result }).await;
        });
    }

    fn open_realtime(&mut self, delay: Duration, generation: u64) {
        self.close_realtime();
        tracing::debug!(?delay, generation, "connecting realtime");
        match spawn_realtime(&self.api_url, delay, generation, self.events_tx.clone()) {
            Ok(connection) => self.realtime = Some(connection),
            Err(e) => {
                tracing::error!(error = %e, "realtime connection not started");
                let event = ClientEvent::RealtimeClosed { generation, reason: e.to_string() };
                let _ = self.events_tx.try_send(event);
            },
        }
    }

    fn close_realtime(&mut self) {
        if let Some(connection) = self.realtime.take() {
            connection.close();
        }
    }

    fn navigate(&mut self, screen: &Screen) {
        tracing::debug!(?screen, "navigate");
    }

    fn notify(&mut self, notice: &Notice) {
        if let Err(e) = writeln!(self.out, "{}", view::notice(notice)) {
            tracing::warn!(error = %e, "notice not shown");
        }
    }

    fn render(&mut self, snapshot: &Snapshot) -> Result<(), Self::Error> {
        let frame = view::frame(snapshot);
        if frame != self.last_frame {
            writeln!(self.out, "{frame}")?;
            self.out.flush()?;
            self.last_frame = frame;
        }
        Ok(())
    }

    fn stop(&mut self) {
        self.close_realtime();
        let _ = self.out.flush();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rider_core::session::Phase;

    use super::*;

    fn driver() -> (mpsc::Sender<String>, ConsoleDriver<Vec<u8>>) {
        let (tx, rx) = mpsc::channel(8);
        let driver = ConsoleDriver::new(&ClientConfig::default(), rx, Vec::new()).unwrap();
        (tx, driver)
    }

    fn printed(driver: &ConsoleDriver<Vec<u8>>) -> String {
        String::from_utf8(driver.output().clone()).unwrap()
    }

    #[tokio::test]
    async fn commands_become_inputs() {
        let (tx, mut driver) = driver();
        tx.send("orders".to_owned()).await.unwrap();

        let input = driver.next_input().await.unwrap();
        assert!(matches!(input, Some(Input::Event(ClientEvent::RefreshOrders))));
    }

    #[tokio::test]
    async fn help_and_mistakes_are_answered_locally() {
        let (tx, mut driver) = driver();
        tx.send("help".to_owned()).await.unwrap();
        tx.send("   ".to_owned()).await.unwrap();
        tx.send("fly away".to_owned()).await.unwrap();
        tx.send("quit".to_owned()).await.unwrap();

        assert!(matches!(driver.next_input().await.unwrap(), Some(Input::Quit)));
        let out = printed(&driver);
        assert!(out.starts_with(HELP));
        assert!(out.ends_with("[error] unknown command `fly`, try `help`\n"));
    }

    #[tokio::test]
    async fn closed_stdin_quits() {
        let (tx, mut driver) = driver();
        drop(tx);

        assert!(matches!(driver.next_input().await.unwrap(), Some(Input::Quit)));
    }

    #[tokio::test]
    async fn unchanged_frames_are_not_reprinted() {
        let (_tx, mut driver) = driver();
        let snapshot = Snapshot { phase: Phase::Anonymous, ..Snapshot::default() };

        driver.render(&snapshot).unwrap();
        driver.render(&snapshot).unwrap();
        driver.notify(&Notice::error("not logged in"));

        assert_eq!(printed(&driver), "== login ==\n[error] not logged in\n");
    }
}
