//! Socket.IO bridge over WebSocket.
//!
//! The bridge never interprets event payloads. It answers heartbeats, joins
//! the default namespace after the Engine.IO handshake and forwards
//! recognized events as [`ClientEvent::Realtime`] signals.

use std::time::Duration;

use futures::{Sink, SinkExt, StreamExt};
use rider_proto::{
    Packet, Signal, SocketPacket,
    realtime::{Handshake, socket_url},
};
use tokio::{sync::mpsc, task::AbortHandle};
use tokio_tungstenite::tungstenite::{self, Message as WsMessage};

use super::TransportError;
use crate::event::ClientEvent;

/// Server ping period assumed until the handshake says otherwise.
const DEFAULT_PING_INTERVAL_MS: u64 = 25_000;

/// Grace period after a missed ping assumed until the handshake says
/// otherwise.
const DEFAULT_PING_TIMEOUT_MS: u64 = 20_000;

/// Handle to a running realtime connection.
///
/// Dropping the handle closes the connection without emitting
/// [`ClientEvent::RealtimeClosed`].
#[derive(Debug)]
pub struct RealtimeConnection {
    abort_handle: AbortHandle,
}

impl RealtimeConnection {
    /// Stop the connection.
    pub fn close(&self) {
        self.abort_handle.abort();
    }
}

impl Drop for RealtimeConnection {
    fn drop(&mut self) {
        self.abort_handle.abort();
    }
}

/// Connect to the realtime endpoint of `api_url` after `delay`.
///
/// Connection events are sent to `events`: [`ClientEvent::RealtimeOpened`]
/// once the namespace is joined, signals while connected and a final
/// [`ClientEvent::RealtimeClosed`] when the connection ends on its own.
/// Opened and closed events carry `generation`.
///
/// A server that stays silent for longer than its ping interval plus ping
/// timeout is treated as gone.
///
/// # Errors
///
/// Returns [`TransportError::Protocol`] if `api_url` is not an HTTP(S) URL.
pub fn spawn_realtime(
    api_url: &str,
    delay: Duration,
    generation: u64,
    events: mpsc::Sender<ClientEvent>,
) -> Result<RealtimeConnection, TransportError> {
    let url = socket_url(api_url).map_err(|e| TransportError::Protocol(e.to_string()))?;

    let handle = tokio::spawn(async move {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let reason = match run(&url, generation, &events).await {
            Ok(()) => "connection closed by server".to_owned(),
            Err(e) => e.to_string(),
        };
        tracing::info!(%reason, generation, "realtime connection ended");
        let _ = events.send(ClientEvent::RealtimeClosed { generation, reason }).await;
    });

    Ok(RealtimeConnection { abort_handle: handle.abort_handle() })
}

/// Longest silence tolerated from the server: one ping interval plus the
/// grace period.
fn read_deadline(handshake: Option<&Handshake>) -> Duration {
    let (interval, timeout) = match handshake {
        Some(h) => (h.ping_interval, h.ping_timeout),
        None => (DEFAULT_PING_INTERVAL_MS, DEFAULT_PING_TIMEOUT_MS),
    };
    Duration::from_millis(interval.saturating_add(timeout))
}

async fn run(
    url: &str,
    generation: u64,
    events: &mpsc::Sender<ClientEvent>,
) -> Result<(), TransportError> {
    let (stream, _) = tokio_tungstenite::connect_async(url)
        .await
        .map_err(|e| TransportError::Connection(e.to_string()))?;
    let (mut sink, mut source) = stream.split();
    let mut deadline = read_deadline(None);

    loop {
        let frame = match tokio::time::timeout(deadline, source.next()).await {
            Ok(Some(frame)) => frame.map_err(|e| TransportError::Connection(e.to_string()))?,
            Ok(None) => return Ok(()),
            Err(_) => return Err(TransportError::Connection("ping timeout".into())),
        };
        let text = match frame {
            WsMessage::Text(text) => text,
            WsMessage::Close(_) => return Ok(()),
            _ => continue,
        };
        let packet = match Packet::decode(text.as_str()) {
            Ok(packet) => packet,
            Err(e) => {
                tracing::debug!(error = %e, "ignoring realtime frame");
                continue;
            },
        };

        let event = match packet {
            Packet::Open(handshake) => {
                tracing::debug!(sid = %handshake.sid, "engine.io handshake");
                deadline = read_deadline(Some(&handshake));
                send(&mut sink, &Packet::connect()).await?;
                None
            },
            Packet::Ping(data) => {
                send(&mut sink, &Packet::Pong(data)).await?;
                None
            },
            Packet::Close | Packet::Message(SocketPacket::Disconnect { .. }) => return Ok(()),
            Packet::Message(SocketPacket::Connect { .. }) => {
                Some(ClientEvent::RealtimeOpened { generation })
            },
            Packet::Message(SocketPacket::ConnectError { data, .. }) => {
                return Err(TransportError::Protocol(format!("namespace refused: {data:?}")));
            },
            other => Signal::from_packet(&other).map(ClientEvent::Realtime),
        };

        if let Some(event) = event {
            if events.send(event).await.is_err() {
                // Runtime is gone
                return Ok(());
            }
        }
    }
}

async fn send<S>(sink: &mut S, packet: &Packet) -> Result<(), TransportError>
where
    S: Sink<WsMessage, Error = tungstenite::Error> + Unpin,
{
    let frame = packet.encode().map_err(|e| TransportError::Protocol(e.to_string()))?;
    sink.send(WsMessage::text(frame)).await.map_err(|e| TransportError::Connection(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use tokio::net::TcpListener;

    use super::*;

    fn handshake(ping_interval: u64, ping_timeout: u64) -> Handshake {
        Handshake {
            sid: "s1".to_owned(),
            upgrades: Vec::new(),
            ping_interval,
            ping_timeout,
            max_payload: 1_000_000,
        }
    }

    #[test]
    fn deadline_follows_handshake() {
        assert_eq!(read_deadline(None), Duration::from_secs(45));
        assert_eq!(read_deadline(Some(&handshake(10_000, 5_000))), Duration::from_secs(15));
        assert_eq!(read_deadline(Some(&handshake(u64::MAX, 1))), Duration::from_millis(u64::MAX));
    }

    #[tokio::test]
    async fn silent_server_is_dropped() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            let open = Packet::Open(handshake(50, 50)).encode().unwrap();
            ws.send(WsMessage::text(open)).await.unwrap();
            // Read the namespace connect, then never answer again
            while let Some(Ok(_)) = ws.next().await {}
        });

        let (tx, mut rx) = mpsc::channel(8);
        let _connection = spawn_realtime(&format!("http://{addr}"), Duration::ZERO, 4, tx).unwrap();

        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap();
        let Some(ClientEvent::RealtimeClosed { generation, reason }) = event else {
            panic!("expected close, got {event:?}");
        };
        assert_eq!(generation, 4);
        assert!(reason.contains("ping timeout"), "{reason}");
    }
}
