//! The open chat conversation.

use rider_proto::{
    ThreadId,
    inbox::{InboxThread, Message, Role},
};

/// The other side of a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    /// Account id, `"unknown"` for support.
    pub id: String,
    /// Role.
    pub role: Role,
    /// Display name.
    pub name: String,
}

impl Peer {
    /// Support desk, used when the rider starts a chat with the admins.
    pub fn support() -> Self {
        Self { id: "unknown".to_owned(), role: Role::Admin, name: "Support".to_owned() }
    }

    /// Counterpart of an inbox thread.
    pub fn from_thread(thread: &InboxThread) -> Option<Self> {
        let participant = thread.counterpart()?;
        let (id, name) = match &participant.account_id {
            Some(account) => (
                account.id.to_string(),
                format!("{} {}", account.firstname, account.lastname).trim().to_owned(),
            ),
            None => ("unknown".to_owned(), String::new()),
        };
        Some(Self { id, role: participant.role.clone(), name })
    }
}

/// Messages of one thread, ordered by server timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    thread: ThreadId,
    peer: Option<Peer>,
    self_id: Option<String>,
    messages: Vec<Message>,
    error: Option<String>,
}

impl Conversation {
    /// Empty conversation for `thread`.
    pub fn new(thread: ThreadId, peer: Option<Peer>, self_id: Option<String>) -> Self {
        Self { thread, peer, self_id, messages: Vec::new(), error: None }
    }

    /// Thread id.
    pub fn thread(&self) -> &ThreadId {
        &self.thread
    }

    /// Counterpart, if known.
    pub fn peer(&self) -> Option<&Peer> {
        self.peer.as_ref()
    }

    /// Messages, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Inline error of the last failed load.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Record a load failure.
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    /// Replace all messages. Stable sort by timestamp.
    pub fn replace(&mut self, mut messages: Vec<Message>) {
        messages.sort_by_key(|m| m.created_at);
        self.messages = messages;
        self.error = None;
    }

    /// Append a sent message, keeping timestamp order.
    pub fn append(&mut self, message: Message) {
        let pos = self.messages.partition_point(|m| m.created_at <= message.created_at);
        self.messages.insert(pos, message);
    }

    /// Whether the newest message came from the other side and should be
    /// marked read. Unknown own id counts as "other side".
    pub fn needs_mark_read(&self) -> bool {
        match (self.messages.last(), self.self_id.as_deref()) {
            (None, _) => false,
            (Some(last), Some(me)) => last.sender_id != me,
            (Some(_), None) => true,
        }
    }
}
