//! Chat inbox and message payloads.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{AccountId, ThreadId};

/// Participant role in a chat thread.
///
/// The backend is inconsistent about casing (`"Rider"` vs `"rider"`), so
/// roles are compared case-insensitively and unknown roles are preserved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    /// Delivery rider.
    Rider,
    /// Buyer.
    User,
    /// Support staff.
    Admin,
    /// Shop owner.
    Seller,
    /// Role this client does not know about, kept verbatim.
    Other(String),
}

impl Role {
    /// Canonical lowercase wire string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Rider => "rider",
            Self::User => "user",
            Self::Admin => "admin",
            Self::Seller => "seller",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for Role {
    fn from(raw: String) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "rider" => Self::Rider,
            "user" => Self::User,
            "admin" => Self::Admin,
            "seller" => Self::Seller,
            _ => Self::Other(raw),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_owned()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Public account details embedded in a thread participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account id.
    #[serde(rename = "_id")]
    pub id: AccountId,
    /// Given name.
    #[serde(default)]
    pub firstname: String,
    /// Family name.
    #[serde(default)]
    pub lastname: String,
    /// Email address.
    #[serde(default)]
    pub email: String,
}

/// One side of a chat thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// Role of the participant.
    pub role: Role,
    /// Populated account. `None` when the account has been deleted.
    #[serde(default)]
    pub account_id: Option<Account>,
}

/// Per-role unread counters of a thread.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadCount {
    /// Messages the rider has not read.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rider: Option<u32>,
}

/// Summary of one chat thread as listed in the inbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxThread {
    /// Thread id.
    #[serde(rename = "_id")]
    pub id: ThreadId,
    /// Thread participants, typically the rider and one counterpart.
    #[serde(default)]
    pub participants: Vec<Participant>,
    /// Preview text of the newest message.
    #[serde(default)]
    pub last_message: String,
    /// Account id of the newest message's sender.
    #[serde(default)]
    pub last_sender: Option<String>,
    /// Time of the newest activity.
    pub updated_at: DateTime<Utc>,
    /// Unread counters.
    #[serde(default)]
    pub unread_count: UnreadCount,
}

impl InboxThread {
    /// Unread messages for the rider, 0 when the backend omits the counter.
    pub fn unread_for_rider(&self) -> u32 {
        self.unread_count.rider.unwrap_or(0)
    }

    /// Whether the rider has anything unread in this thread.
    pub fn has_unread(&self) -> bool {
        self.unread_for_rider() > 0
    }

    /// The participant that is not the rider.
    pub fn counterpart(&self) -> Option<&Participant> {
        self.participants.iter().find(|p| p.role != Role::Rider)
    }
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Sender account id.
    pub sender_id: String,
    /// Message text, possibly empty for image-only messages.
    #[serde(default, alias = "textMessage")]
    pub text: String,
    /// Attached image URLs.
    #[serde(default)]
    pub image_files: Vec<String>,
    /// Server timestamp.
    #[serde(alias = "time")]
    pub created_at: DateTime<Utc>,
    /// Account ids that have read the message.
    #[serde(default)]
    pub read_by: Vec<String>,
}

/// Body of `POST /api/getRiderChatId`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenChatRequest {
    /// Account to chat with, `"unknown"` for support.
    pub receiver_id: String,
    /// Role of the receiver.
    pub receiver_role: Role,
}

/// Reply of `POST /api/getRiderChatId`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatHandle {
    /// Thread to open.
    pub chat_id: ThreadId,
    /// Rider account id as seen by the chat service.
    #[serde(default)]
    pub sender_id: String,
    /// Resolved receiver id.
    #[serde(default)]
    pub receiver_id: String,
    /// Receiver email, if known.
    #[serde(default)]
    pub email: Option<String>,
}

/// Message the rider is about to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// Receiver account id.
    pub receiver_id: String,
    /// Receiver role.
    pub receiver_role: Role,
    /// Text body.
    pub text: String,
    /// Local image attachments.
    pub images: Vec<crate::Attachment>,
}

impl OutgoingMessage {
    /// A message with no text and no images carries nothing.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty() && self.images.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_are_case_insensitive() {
        let role: Role = serde_json::from_str(r#""Rider""#).unwrap();
        assert_eq!(role, Role::Rider);

        let role: Role = serde_json::from_str(r#""ADMIN""#).unwrap();
        assert_eq!(role, Role::Admin);

        let role: Role = serde_json::from_str(r#""courier""#).unwrap();
        assert_eq!(role, Role::Other("courier".into()));
    }

    #[test]
    fn missing_unread_counter_is_zero() {
        let json = r#"{
            "_id": "t1",
            "participants": [
                {"role": "rider", "accountId": {"_id": "r1", "firstname": "Jo"}},
                {"role": "User", "accountId": {"_id": "u1", "firstname": "Ana"}}
            ],
            "lastMessage": "hi",
            "updatedAt": "2024-03-01T10:00:00.000Z",
            "unreadCount": {"user": 3}
        }"#;

        let thread: InboxThread = serde_json::from_str(json).unwrap();
        assert_eq!(thread.unread_for_rider(), 0);
        assert!(!thread.has_unread());

        let other = thread.counterpart().unwrap();
        assert_eq!(other.role, Role::User);
    }

    #[test]
    fn message_accepts_legacy_field_names() {
        let json = r#"{"senderId": "u1", "textMessage": "hello", "time": "2024-03-01T10:00:00Z"}"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.text, "hello");
        assert!(msg.image_files.is_empty());
    }
}
