//! Realtime channel protocol.
//!
//! The backend pushes invalidation events over Socket.IO (protocol v5)
//! carried by Engine.IO v4 on a WebSocket. Only text frames are used: one
//! Engine.IO [`Packet`] per frame, with Socket.IO packets nested inside
//! [`Packet::Message`].
//!
//! ```text
//! Engine.IO frame:   <type>[payload]
//!   0 open  {"sid":..,"pingInterval":..}   server -> client
//!   2 ping / 3 pong                        heartbeat, payload echoed
//!   4 message <socket.io packet>
//!
//! Socket.IO packet:  <type>[<namespace>,][<ack id>][json]
//!   0 connect        sent by the client after open
//!   2 event          ["event name", ...args]
//! ```
//!
//! Event payloads are never interpreted. The client only cares which
//! [`Signal`] arrived.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ProtocolError, Result};

/// Path and query of the realtime endpoint, relative to the API origin.
pub const SOCKET_PATH: &str = "/socket.io/?EIO=4&transport=websocket";

/// Default Socket.IO namespace.
pub const DEFAULT_NAMESPACE: &str = "/";

/// Invalidation signals the rider client reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// A delivery was assigned to a rider (`"to rider"`).
    DeliveryAssigned,
    /// Inbox threads changed (`"newChatInbox"`).
    InboxActivity,
    /// A chat message was sent (`"newMessageSent"`).
    MessageSent,
    /// A chat message was read (`"markAsRead"`).
    MessageRead,
}

impl Signal {
    /// All recognized signals.
    pub const ALL: [Self; 4] =
        [Self::DeliveryAssigned, Self::InboxActivity, Self::MessageSent, Self::MessageRead];

    /// Socket.IO event name.
    pub const fn event_name(self) -> &'static str {
        match self {
            Self::DeliveryAssigned => "to rider",
            Self::InboxActivity => "newChatInbox",
            Self::MessageSent => "newMessageSent",
            Self::MessageRead => "markAsRead",
        }
    }

    /// Signal for an event name. Unknown events yield `None`.
    pub fn from_event(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.event_name() == name)
    }

    /// Signal carried by an inbound packet, if any.
    pub fn from_packet(packet: &Packet) -> Option<Self> {
        match packet {
            Packet::Message(SocketPacket::Event { name, .. }) => Self::from_event(name),
            _ => None,
        }
    }
}

/// WebSocket URL of the realtime endpoint for an HTTP API base URL.
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidUrl`] unless `api_url` is `http://` or
/// `https://`.
pub fn socket_url(api_url: &str) -> Result<String> {
    let base = api_url.trim_end_matches('/');
    let origin = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        return Err(ProtocolError::InvalidUrl(api_url.to_owned()));
    };
    Ok(format!("{origin}{SOCKET_PATH}"))
}

/// Engine.IO open handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    /// Session id.
    pub sid: String,
    /// Transports the server would upgrade to.
    #[serde(default)]
    pub upgrades: Vec<String>,
    /// Milliseconds between server pings.
    pub ping_interval: u64,
    /// Milliseconds the server waits for a pong.
    pub ping_timeout: u64,
    /// Largest accepted payload in bytes.
    #[serde(default)]
    pub max_payload: u64,
}

/// Engine.IO packet.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    /// Handshake sent by the server on connect.
    Open(Handshake),
    /// Transport is closing.
    Close,
    /// Heartbeat probe with optional payload.
    Ping(String),
    /// Heartbeat answer echoing the ping payload.
    Pong(String),
    /// Socket.IO packet.
    Message(SocketPacket),
    /// Transport upgrade.
    Upgrade,
    /// No-op.
    Noop,
}

impl Packet {
    /// Namespace connect packet the client sends after [`Packet::Open`].
    pub fn connect() -> Self {
        Self::Message(SocketPacket::Connect { namespace: DEFAULT_NAMESPACE.to_owned(), data: None })
    }

    /// Decode one text frame.
    ///
    /// # Errors
    ///
    /// Fails on empty frames, unknown packet types, binary packets and
    /// malformed JSON.
    pub fn decode(frame: &str) -> Result<Self> {
        let mut chars = frame.chars();
        let kind = chars.next().ok_or(ProtocolError::Empty)?;
        let rest = chars.as_str();
        match kind {
            '0' => Ok(Self::Open(serde_json::from_str(rest)?)),
            '1' => Ok(Self::Close),
            '2' => Ok(Self::Ping(rest.to_owned())),
            '3' => Ok(Self::Pong(rest.to_owned())),
            '4' => Ok(Self::Message(SocketPacket::decode(rest)?)),
            '5' => Ok(Self::Upgrade),
            '6' => Ok(Self::Noop),
            'b' => Err(ProtocolError::Unsupported("binary frame")),
            other => Err(ProtocolError::UnknownPacketType(other)),
        }
    }

    /// Encode as a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Json`] if a payload cannot be serialized.
    pub fn encode(&self) -> Result<String> {
        Ok(match self {
            Self::Open(handshake) => format!("0{}", serde_json::to_string(handshake)?),
            Self::Close => "1".to_owned(),
            Self::Ping(data) => format!("2{data}"),
            Self::Pong(data) => format!("3{data}"),
            Self::Message(packet) => format!("4{}", packet.encode()?),
            Self::Upgrade => "5".to_owned(),
            Self::Noop => "6".to_owned(),
        })
    }
}

/// Socket.IO packet.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    /// Join a namespace.
    Connect {
        /// Namespace.
        namespace: String,
        /// Auth payload (client) or session payload (server).
        data: Option<Value>,
    },
    /// Leave a namespace.
    Disconnect {
        /// Namespace.
        namespace: String,
    },
    /// Named event.
    Event {
        /// Namespace.
        namespace: String,
        /// Acknowledgement id requested by the sender.
        ack: Option<u64>,
        /// Event name.
        name: String,
        /// Event arguments.
        args: Vec<Value>,
    },
    /// Acknowledgement of an earlier event.
    Ack {
        /// Namespace.
        namespace: String,
        /// Acknowledged id.
        ack: u64,
        /// Reply arguments.
        args: Vec<Value>,
    },
    /// Namespace connection refused.
    ConnectError {
        /// Namespace.
        namespace: String,
        /// Error payload.
        data: Option<Value>,
    },
}

impl SocketPacket {
    /// Decode a Socket.IO packet (the part after the Engine.IO `4`).
    ///
    /// # Errors
    ///
    /// Fails on unknown or binary packet types and on malformed framing.
    pub fn decode(raw: &str) -> Result<Self> {
        let mut chars = raw.chars();
        let kind = chars.next().ok_or(ProtocolError::Empty)?;
        let rest = chars.as_str();

        if matches!(kind, '5' | '6') {
            return Err(ProtocolError::Unsupported("binary socket packet"));
        }

        let (namespace, rest) = split_namespace(rest);
        let ack_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        let (ack_digits, payload) = rest.split_at(ack_len);
        let ack = if ack_digits.is_empty() {
            None
        } else {
            Some(ack_digits.parse::<u64>().map_err(|e| ProtocolError::Malformed(e.to_string()))?)
        };
        let data =
            if payload.is_empty() { None } else { Some(serde_json::from_str::<Value>(payload)?) };

        match kind {
            '0' => Ok(Self::Connect { namespace, data }),
            '1' => Ok(Self::Disconnect { namespace }),
            '2' => {
                let (name, args) = split_event(data)?;
                Ok(Self::Event { namespace, ack, name, args })
            },
            '3' => {
                let ack = ack.ok_or_else(|| ProtocolError::Malformed("ack without id".into()))?;
                let args = match data {
                    Some(Value::Array(args)) => args,
                    Some(_) => {
                        return Err(ProtocolError::Malformed("ack payload is not an array".into()));
                    },
                    None => Vec::new(),
                };
                Ok(Self::Ack { namespace, ack, args })
            },
            '4' => Ok(Self::ConnectError { namespace, data }),
            other => Err(ProtocolError::UnknownPacketType(other)),
        }
    }

    /// Encode without the Engine.IO prefix.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Json`] if a payload cannot be serialized.
    pub fn encode(&self) -> Result<String> {
        let (kind, namespace, ack, data) = match self {
            Self::Connect { namespace, data } => ('0', namespace, None, data.clone()),
            Self::Disconnect { namespace } => ('1', namespace, None, None),
            Self::Event { namespace, ack, name, args } => {
                let mut array = Vec::with_capacity(args.len() + 1);
                array.push(Value::String(name.clone()));
                array.extend(args.iter().cloned());
                ('2', namespace, *ack, Some(Value::Array(array)))
            },
            Self::Ack { namespace, ack, args } => {
                ('3', namespace, Some(*ack), Some(Value::Array(args.clone())))
            },
            Self::ConnectError { namespace, data } => ('4', namespace, None, data.clone()),
        };

        let mut out = String::new();
        out.push(kind);
        if namespace != DEFAULT_NAMESPACE {
            out.push_str(namespace);
            out.push(',');
        }
        if let Some(ack) = ack {
            out.push_str(&ack.to_string());
        }
        if let Some(data) = data {
            out.push_str(&serde_json::to_string(&data)?);
        }
        Ok(out)
    }
}

fn split_namespace(rest: &str) -> (String, &str) {
    if !rest.starts_with('/') {
        return (DEFAULT_NAMESPACE.to_owned(), rest);
    }
    match rest.split_once(',') {
        Some((namespace, tail)) => (namespace.to_owned(), tail),
        None => (rest.to_owned(), ""),
    }
}

fn split_event(data: Option<Value>) -> Result<(String, Vec<Value>)> {
    let Some(Value::Array(mut items)) = data else {
        return Err(ProtocolError::Malformed("event payload is not an array".into()));
    };
    if items.is_empty() {
        return Err(ProtocolError::Malformed("event without name".into()));
    }
    match items.remove(0) {
        Value::String(name) => Ok((name, items)),
        _ => Err(ProtocolError::Malformed("event name is not a string".into())),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_open_handshake() {
        let frame = concat!(
            r#"0{"sid":"abc","upgrades":[],"pingInterval":25000,"#,
            r#""pingTimeout":20000,"maxPayload":1000000}"#
        );
        let Packet::Open(handshake) = Packet::decode(frame).unwrap() else {
            panic!("expected open packet");
        };
        assert_eq!(handshake.sid, "abc");
        assert_eq!(handshake.ping_interval, 25_000);
    }

    #[test]
    fn decodes_delivery_event() {
        let packet = Packet::decode(r#"42["to rider",{"orderId":"o1"}]"#).unwrap();
        assert_eq!(Signal::from_packet(&packet), Some(Signal::DeliveryAssigned));

        let Packet::Message(SocketPacket::Event { namespace, args, .. }) = packet else {
            panic!("expected event");
        };
        assert_eq!(namespace, "/");
        assert_eq!(args, vec![json!({"orderId": "o1"})]);
    }

    #[test]
    fn namespace_and_ack_are_parsed() {
        let packet = SocketPacket::decode(r#"2/admin,12["markAsRead"]"#).unwrap();
        assert_eq!(
            packet,
            SocketPacket::Event {
                namespace: "/admin".into(),
                ack: Some(12),
                name: "markAsRead".into(),
                args: Vec::new(),
            }
        );
        assert_eq!(packet.encode().unwrap(), r#"2/admin,12["markAsRead"]"#);
    }

    #[test]
    fn unknown_events_carry_no_signal() {
        let packet = Packet::decode(r#"42["typing",{}]"#).unwrap();
        assert_eq!(Signal::from_packet(&packet), None);
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(Packet::decode(""), Err(ProtocolError::Empty));
        assert_eq!(Packet::decode("9"), Err(ProtocolError::UnknownPacketType('9')));
        assert!(matches!(Packet::decode("b AAAA"), Err(ProtocolError::Unsupported(_))));
        assert!(matches!(Packet::decode("451-[\"x\"]"), Err(ProtocolError::Unsupported(_))));
        assert!(matches!(Packet::decode("42{}"), Err(ProtocolError::Malformed(_))));
    }

    #[test]
    fn heartbeat_and_connect_encoding() {
        insta::assert_snapshot!(Packet::connect().encode().unwrap(), @"40");
        insta::assert_snapshot!(Packet::Pong("probe".into()).encode().unwrap(), @"3probe");
    }

    #[test]
    fn socket_url_switches_scheme() {
        assert_eq!(
            socket_url("https://api.example.com/").unwrap(),
            "wss://api.example.com/socket.io/?EIO=4&transport=websocket"
        );
        assert_eq!(
            socket_url("http://10.0.2.2:3000").unwrap(),
            "ws://10.0.2.2:3000/socket.io/?EIO=4&transport=websocket"
        );
        assert!(socket_url("ftp://x").is_err());
    }
}
