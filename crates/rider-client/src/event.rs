//! Client events and actions.

use std::{fmt, time::Duration};

use rider_core::chat::Peer;
use rider_proto::{
    ApiFailure, Attachment, Endpoint, OrderId, PayoutId, Signal, ThreadId,
    profile::{Availability, ProfileUpdate},
};

/// Correlates a [`ClientAction::Request`] with its
/// [`ClientEvent::Response`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// Events the caller feeds into the client.
///
/// The caller is responsible for:
/// - Reading the persisted token once at start-up
/// - Forwarding user intents
/// - Executing requests and feeding back their responses
/// - Forwarding realtime signals and connection changes
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// Persisted token was read. `None` if nothing was stored.
    TokenRestored(Option<String>),

    /// Persisted token could not be read.
    TokenRestoreFailed {
        /// Storage error.
        reason: String,
    },

    /// Rider submitted the login form.
    Login {
        /// Account email.
        email: String,
        /// Account password.
        password: String,
    },

    /// Rider logged out.
    Logout,

    /// Re-fetch all orders.
    RefreshOrders,

    /// Delete orders from the rider's list.
    DeleteOrders(Vec<OrderId>),

    /// Photo captured for the next transition of an order.
    StageProof {
        /// Order the photo belongs to.
        order: OrderId,
        /// Captured image.
        photo: Attachment,
    },

    /// Payment receipt picked for an order.
    StageReceipt {
        /// Order the receipt belongs to.
        order: OrderId,
        /// Picked image.
        receipt: Attachment,
    },

    /// Receipt removed before submitting.
    ClearReceipt {
        /// Order the receipt belonged to.
        order: OrderId,
    },

    /// Advance an order to its next delivery stage.
    AdvanceOrder {
        /// Order to advance.
        order: OrderId,
    },

    /// Re-fetch inbox threads.
    RefreshInbox,

    /// Open a thread from the inbox.
    OpenThread {
        /// Thread to open.
        thread: ThreadId,
    },

    /// Delete a thread from the inbox.
    DeleteThread {
        /// Thread to delete.
        thread: ThreadId,
    },

    /// Reload messages of the open conversation.
    LoadConversation,

    /// Leave the open conversation.
    CloseConversation,

    /// Send a message in the open conversation.
    SendMessage {
        /// Text body.
        text: String,
        /// Images to attach.
        images: Vec<Attachment>,
    },

    /// Open (or create) a chat with someone, e.g. the buyer of an order or
    /// support ([`Peer::support`]).
    StartChat {
        /// Who to chat with.
        peer: Peer,
    },

    /// Re-fetch payouts.
    RefreshPayouts,

    /// Delete payout records.
    DeletePayouts(Vec<PayoutId>),

    /// Fetch the rider's profile.
    LoadProfile,

    /// Submit profile edits.
    UpdateProfile(ProfileUpdate),

    /// Toggle availability.
    SetAvailability(Availability),

    /// Fetch payment QR codes.
    LoadQrCodes,

    /// Ask for a password reset code.
    RequestResetCode {
        /// Account email.
        email: String,
    },

    /// Submit the emailed reset code.
    VerifyResetCode {
        /// Code from the email.
        code: String,
    },

    /// Submit the new password.
    ChangePassword {
        /// New password.
        new_password: String,
        /// Repeated new password.
        confirm_password: String,
    },

    /// A request finished.
    Response {
        /// Request this answers.
        id: RequestId,
        /// Body of a 2xx response, or the classified failure.
        result: Result<Vec<u8>, ApiFailure>,
    },

    /// Realtime invalidation signal.
    Realtime(Signal),

    /// Realtime channel connected.
    RealtimeOpened {
        /// Generation of the [`ClientAction::OpenRealtime`] this answers.
        generation: u64,
    },

    /// Realtime channel closed.
    RealtimeClosed {
        /// Generation of the [`ClientAction::OpenRealtime`] this answers.
        generation: u64,
        /// Why.
        reason: String,
    },
}

/// Screen the frontend should show.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Screen {
    /// Login form.
    Login,
    /// Order list.
    Home,
    /// Camera flow for an order's proof photo.
    PhotoCapture {
        /// Order the photo is for.
        order: OrderId,
    },
    /// Message view.
    Conversation {
        /// Open thread.
        thread: ThreadId,
    },
}

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeLevel {
    /// Informational.
    Info,
    /// Operation succeeded.
    Success,
    /// Operation failed.
    Error,
}

/// Message for the rider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Text.
    pub message: String,
}

impl Notice {
    /// Informational notice.
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, message: message.into() }
    }

    /// Success notice.
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, message: message.into() }
    }

    /// Error notice.
    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into() }
    }
}

/// Log levels for client actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug information
    Debug,
    /// Informational message
    Info,
    /// Warning
    Warn,
}

/// Actions the client produces for the caller to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientAction {
    /// Perform an HTTP request and feed back a [`ClientEvent::Response`]
    /// with the same id.
    Request {
        /// Correlation id.
        id: RequestId,
        /// Call to make.
        endpoint: Endpoint,
        /// Bearer token for authenticated endpoints.
        token: Option<String>,
    },

    /// Persist the session token.
    PersistToken(String),

    /// Remove the persisted token.
    ForgetToken,

    /// Connect the realtime channel after `delay`, replacing any previous
    /// connection.
    OpenRealtime {
        /// Backoff before connecting. Zero for the first attempt.
        delay: Duration,
        /// Tag echoed back on the connection's opened and closed events.
        /// Events carrying an older tag are ignored.
        generation: u64,
    },

    /// Disconnect the realtime channel.
    CloseRealtime,

    /// Show a screen.
    Navigate(Screen),

    /// Show a notice.
    Notify(Notice),

    /// State changed, redraw.
    Render,

    /// Log message for debugging.
    Log {
        /// Level.
        level: LogLevel,
        /// Message.
        message: String,
    },
}
