//! Client state machine.
//!
//! [`Client`] owns every collection the rider sees and is their only writer.
//! It never performs I/O: intents and I/O completions go in as
//! [`ClientEvent`]s, requests and side effects come out as [`ClientAction`]s.
//!
//! ```text
//!   intent ──► validate ──► optimistic mutation ──► Request { id }
//!                                                         │
//!   Response { id } ◄─────────────────────────────────────┘
//!        │
//!        ├─ ok       ──► apply reply
//!        ├─ expired  ──► forced logout
//!        └─ failed   ──► rollback, inline error or notice
//! ```
//!
//! Every request is tracked under its [`RequestId`] until the response
//! arrives. Logging out drops that bookkeeping, so responses to requests
//! issued by an earlier session are ignored.

use std::{collections::HashMap, time::Duration};

use rider_core::{
    Environment, LookupError, SessionError, ValidationError,
    chat::{Conversation, Peer},
    delivery::{self, Plan},
    inbox::{Inbox, InboxSnapshot},
    orders::{OrderBook, OrderSnapshot},
    password_reset::PasswordReset,
    payouts::PayoutLedger,
    session::{Phase, Session},
};
use rider_proto::{
    ApiFailure, Endpoint, FailureKind, OrderId, PayoutId, Signal, ThreadId,
    auth::{
        ChangePasswordRequest, ForgotPasswordReply, ForgotPasswordRequest, LoginRejection,
        LoginReply, LoginRequest, VerifyCodeRequest,
    },
    failure::decode_reply,
    inbox::{ChatHandle, InboxThread, Message, OpenChatRequest, OutgoingMessage},
    order::{DeliveryStatus, Order, StatusUpdateReply},
    payout::Payout,
    profile::{Availability, MessageReply, Profile, ProfileUpdateReply, QrCode, QrPaymentReply},
};

use crate::{
    config::ClientConfig,
    error::ClientError,
    event::{ClientAction, ClientEvent, LogLevel, Notice, RequestId, Screen},
};

/// Shown when the server rejected the session token.
pub const SESSION_EXPIRED_NOTICE: &str = "Session expired. Please log in again.";

/// Shown when a delivery is assigned over the realtime channel.
pub const NEW_DELIVERY_NOTICE: &str = "New delivery assigned";

/// Realtime channel state as last requested or reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RealtimeState {
    /// Not connected and not wanted.
    Closed,
    /// `OpenRealtime` issued, waiting for `RealtimeOpened`.
    Connecting,
    /// Connected.
    Open,
}

/// What a request in flight was for.
#[derive(Debug)]
enum Pending {
    Login,
    FetchOrders,
    DeleteOrders { snapshot: OrderSnapshot },
    Advance { order: OrderId, to: DeliveryStatus },
    FetchInbox,
    MarkRead { thread: ThreadId },
    DeleteThread { snapshot: InboxSnapshot },
    FetchMessages { thread: ThreadId, mark_read: bool },
    SendMessage { thread: ThreadId },
    OpenChat { peer: Peer },
    FetchPayouts,
    DeletePayouts { ids: Vec<PayoutId> },
    FetchProfile,
    UpdateProfile,
    SetAvailability { previous: Option<Availability> },
    FetchQrCodes,
    RequestResetCode { email: String },
    VerifyResetCode,
    ChangePassword,
}

impl Pending {
    /// Sent with the bearer token; expiry ends the session.
    fn requires_session(&self) -> bool {
        !matches!(
            self,
            Self::Login
                | Self::RequestResetCode { .. }
                | Self::VerifyResetCode
                | Self::ChangePassword
        )
    }
}

/// The rider client.
pub struct Client<E: Environment> {
    env: E,
    config: ClientConfig,
    session: Session,
    orders: OrderBook,
    inbox: Inbox,
    conversation: Option<Conversation>,
    payouts: PayoutLedger,
    qr_codes: Vec<QrCode>,
    reset: PasswordReset,
    login_error: Option<LoginRejection>,
    pending: HashMap<RequestId, Pending>,
    next_request: u64,
    realtime: RealtimeState,
    realtime_generation: u64,
    reconnect_attempt: u32,
}

impl<E: Environment> Client<E> {
    /// Create a client whose session is still loading.
    ///
    /// Feed [`ClientEvent::TokenRestored`] (or `TokenRestoreFailed`) before
    /// anything else; authenticated intents are rejected until then.
    pub fn new(env: E, config: ClientConfig) -> Self {
        Self {
            env,
            config,
            session: Session::new(),
            orders: OrderBook::new(),
            inbox: Inbox::new(),
            conversation: None,
            payouts: PayoutLedger::new(),
            qr_codes: Vec::new(),
            reset: PasswordReset::new(),
            login_error: None,
            pending: HashMap::new(),
            next_request: 0,
            realtime: RealtimeState::Closed,
            realtime_generation: 0,
            reconnect_attempt: 0,
        }
    }

    /// Configuration the client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Session gate.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The rider's orders.
    pub fn orders(&self) -> &OrderBook {
        &self.orders
    }

    /// Chat inbox and unread badge.
    pub fn inbox(&self) -> &Inbox {
        &self.inbox
    }

    /// Open conversation, if any.
    pub fn conversation(&self) -> Option<&Conversation> {
        self.conversation.as_ref()
    }

    /// Payout history.
    pub fn payouts(&self) -> &PayoutLedger {
        &self.payouts
    }

    /// Payment QR codes.
    pub fn qr_codes(&self) -> &[QrCode] {
        &self.qr_codes
    }

    /// Password reset progress.
    pub fn password_reset(&self) -> &PasswordReset {
        &self.reset
    }

    /// Why the last login attempt failed.
    pub fn login_error(&self) -> Option<&LoginRejection> {
        self.login_error.as_ref()
    }

    /// Realtime channel state.
    pub fn realtime(&self) -> RealtimeState {
        self.realtime
    }

    /// Number of requests awaiting a response.
    pub fn pending_requests(&self) -> usize {
        self.pending.len()
    }

    /// Seconds until another reset code may be requested.
    pub fn reset_cooldown_secs(&self) -> u64 {
        self.reset.remaining_secs(self.env.wall_clock_ms())
    }

    /// Process an event and return resulting actions.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] when an intent is refused. The client state
    /// is unchanged and no request is issued.
    pub fn handle(&mut self, event: ClientEvent) -> Result<Vec<ClientAction>, ClientError> {
        match event {
            ClientEvent::TokenRestored(token) => Ok(self.handle_token_restored(token)),
            ClientEvent::TokenRestoreFailed { reason } => {
                Ok(self.handle_token_restore_failed(&reason))
            },
            ClientEvent::Login { email, password } => self.handle_login(&email, password),
            ClientEvent::Logout => {
                self.require_session()?;
                Ok(self.logout())
            },
            ClientEvent::RefreshOrders => {
                self.require_session()?;
                Ok(self.refresh_orders())
            },
            ClientEvent::DeleteOrders(ids) => self.handle_delete_orders(ids),
            ClientEvent::StageProof { order, photo } => {
                self.require_session()?;
                self.orders.stage_proof(&order, photo)?;
                Ok(vec![ClientAction::Render])
            },
            ClientEvent::StageReceipt { order, receipt } => {
                self.require_session()?;
                self.orders.stage_receipt(&order, receipt)?;
                Ok(vec![ClientAction::Render])
            },
            ClientEvent::ClearReceipt { order } => {
                self.require_session()?;
                self.orders.clear_receipt(&order)?;
                Ok(vec![ClientAction::Render])
            },
            ClientEvent::AdvanceOrder { order } => self.handle_advance(order),
            ClientEvent::RefreshInbox => {
                self.require_session()?;
                Ok(self.refresh_inbox())
            },
            ClientEvent::OpenThread { thread } => self.handle_open_thread(thread),
            ClientEvent::DeleteThread { thread } => self.handle_delete_thread(thread),
            ClientEvent::LoadConversation => {
                self.require_session()?;
                let thread = self.open_thread_id()?;
                Ok(vec![self.fetch_messages(thread, true)])
            },
            ClientEvent::CloseConversation => {
                self.conversation = None;
                Ok(vec![ClientAction::Render])
            },
            ClientEvent::SendMessage { text, images } => self.handle_send(text, images),
            ClientEvent::StartChat { peer } => {
                self.require_session()?;
                let request = OpenChatRequest {
                    receiver_id: peer.id.clone(),
                    receiver_role: peer.role.clone(),
                };
                Ok(vec![self.request(Endpoint::OpenChat(request), Pending::OpenChat { peer })])
            },
            ClientEvent::RefreshPayouts => {
                self.require_session()?;
                Ok(vec![self.request(Endpoint::Payouts, Pending::FetchPayouts)])
            },
            ClientEvent::DeletePayouts(ids) => {
                self.require_session()?;
                if ids.is_empty() {
                    return Err(ValidationError::EmptySelection.into());
                }
                let endpoint = Endpoint::DeletePayouts(ids.clone());
                Ok(vec![self.request(endpoint, Pending::DeletePayouts { ids })])
            },
            ClientEvent::LoadProfile => {
                self.require_session()?;
                Ok(vec![self.request(Endpoint::Profile, Pending::FetchProfile)])
            },
            ClientEvent::UpdateProfile(update) => {
                self.require_session()?;
                if let Some(field) = update.missing_field() {
                    return Err(ValidationError::MissingField(field).into());
                }
                Ok(vec![self.request(Endpoint::UpdateProfile(update), Pending::UpdateProfile)])
            },
            ClientEvent::SetAvailability(status) => {
                self.require_session()?;
                let previous = self.session.set_availability(status);
                let endpoint = Endpoint::SetAvailability(status);
                Ok(vec![
                    self.request(endpoint, Pending::SetAvailability { previous }),
                    ClientAction::Render,
                ])
            },
            ClientEvent::LoadQrCodes => {
                self.require_session()?;
                Ok(vec![self.request(Endpoint::QrPayments, Pending::FetchQrCodes)])
            },
            ClientEvent::RequestResetCode { email } => self.handle_request_reset_code(&email),
            ClientEvent::VerifyResetCode { code } => {
                let email = self.reset.validate_code(&code)?;
                let request = VerifyCodeRequest { email, verify_code: code.trim().to_owned() };
                Ok(vec![self.request(Endpoint::VerifyCode(request), Pending::VerifyResetCode)])
            },
            ClientEvent::ChangePassword { new_password, confirm_password } => {
                let email = self.reset.validate_new_password(&new_password, &confirm_password)?;
                let request = ChangePasswordRequest { email, new_password, confirm_password };
                Ok(vec![self.request(Endpoint::ChangePassword(request), Pending::ChangePassword)])
            },
            ClientEvent::Response { id, result } => Ok(self.handle_response(id, result)),
            ClientEvent::Realtime(signal) => Ok(self.handle_signal(signal)),
            ClientEvent::RealtimeOpened { generation } => {
                Ok(self.handle_realtime_opened(generation))
            },
            ClientEvent::RealtimeClosed { generation, reason } => {
                Ok(self.handle_realtime_closed(generation, &reason))
            },
        }
    }

    fn require_session(&self) -> Result<(), SessionError> {
        self.session.require_token().map(|_| ())
    }

    fn self_id(&self) -> Option<String> {
        self.session.user().map(|user| user.id.to_string())
    }

    fn open_thread_id(&self) -> Result<ThreadId, ClientError> {
        self.conversation
            .as_ref()
            .map(|c| c.thread().clone())
            .ok_or(ClientError::NoConversation)
    }

    /// Register a request and build its action.
    fn request(&mut self, endpoint: Endpoint, pending: Pending) -> ClientAction {
        let id = RequestId(self.next_request);
        self.next_request = self.next_request.wrapping_add(1);
        let token = if endpoint.requires_auth() {
            self.session.token().map(str::to_owned)
        } else {
            None
        };
        self.pending.insert(id, pending);
        ClientAction::Request { id, endpoint, token }
    }

    fn handle_token_restored(&mut self, token: Option<String>) -> Vec<ClientAction> {
        if !self.session.is_loading() {
            return vec![log(LogLevel::Debug, "session already restored, ignoring token")];
        }
        if self.session.restore(token) {
            let mut actions = vec![log(LogLevel::Info, "session restored")];
            actions.extend(self.on_authenticated());
            actions
        } else {
            vec![ClientAction::Navigate(Screen::Login), ClientAction::Render]
        }
    }

    fn handle_token_restore_failed(&mut self, reason: &str) -> Vec<ClientAction> {
        let message = format!("failed to read stored token: {reason}");
        let mut actions = vec![log(LogLevel::Warn, message)];
        if self.session.is_loading() {
            self.session.restore(None);
            actions.extend([ClientAction::Navigate(Screen::Login), ClientAction::Render]);
        }
        actions
    }

    fn handle_login(
        &mut self,
        email: &str,
        password: String,
    ) -> Result<Vec<ClientAction>, ClientError> {
        match self.session.phase() {
            Phase::Loading => return Err(SessionError::Loading.into()),
            Phase::Authenticated => return Err(SessionError::AlreadyAuthenticated.into()),
            Phase::Anonymous => {},
        }
        let email = email.trim();
        if email.is_empty() {
            return Err(ValidationError::EmailRequired.into());
        }
        if password.is_empty() {
            return Err(ValidationError::PasswordRequired.into());
        }

        self.login_error = None;
        let request = LoginRequest { email: email.to_owned(), password };
        Ok(vec![self.request(Endpoint::Login(request), Pending::Login), ClientAction::Render])
    }

    /// Session became authenticated: open realtime and load the home screen.
    fn on_authenticated(&mut self) -> Vec<ClientAction> {
        self.realtime = RealtimeState::Connecting;
        self.reconnect_attempt = 0;

        let mut actions = vec![self.open_realtime(Duration::ZERO)];
        actions.extend(self.refresh_orders());
        actions.extend(self.refresh_inbox());
        actions.push(self.request(Endpoint::Profile, Pending::FetchProfile));
        actions.extend([ClientAction::Navigate(Screen::Home), ClientAction::Render]);
        actions
    }

    /// Drop the session and everything loaded under it.
    fn logout(&mut self) -> Vec<ClientAction> {
        self.session.logout();
        self.orders.clear();
        self.inbox.clear();
        self.conversation = None;
        self.payouts.clear();
        self.qr_codes.clear();
        self.reset.reset();
        self.login_error = None;
        self.pending.clear();
        self.reconnect_attempt = 0;

        let mut actions = vec![ClientAction::ForgetToken];
        if self.realtime != RealtimeState::Closed {
            actions.push(ClientAction::CloseRealtime);
        }
        self.realtime = RealtimeState::Closed;
        actions.extend([ClientAction::Navigate(Screen::Login), ClientAction::Render]);
        actions
    }

    fn expire_session(&mut self) -> Vec<ClientAction> {
        let mut actions = vec![log(LogLevel::Info, "session expired, logging out")];
        actions.extend(self.logout());
        actions.push(ClientAction::Notify(Notice::error(SESSION_EXPIRED_NOTICE)));
        actions
    }

    fn refresh_orders(&mut self) -> Vec<ClientAction> {
        if self.orders.gate().request() {
            vec![self.request(Endpoint::Orders, Pending::FetchOrders)]
        } else {
            vec![log(LogLevel::Debug, "orders refresh in flight, queued")]
        }
    }

    fn finish_orders_fetch(&mut self) -> Vec<ClientAction> {
        let mut actions = Vec::new();
        if self.orders.gate().complete() {
            actions.push(self.request(Endpoint::Orders, Pending::FetchOrders));
        }
        actions.push(ClientAction::Render);
        actions
    }

    fn refresh_inbox(&mut self) -> Vec<ClientAction> {
        if self.inbox.gate().request() {
            vec![self.request(Endpoint::Inbox, Pending::FetchInbox)]
        } else {
            vec![log(LogLevel::Debug, "inbox refresh in flight, queued")]
        }
    }

    fn finish_inbox_fetch(&mut self) -> Vec<ClientAction> {
        let mut actions = Vec::new();
        if self.inbox.gate().complete() {
            actions.push(self.request(Endpoint::Inbox, Pending::FetchInbox));
        }
        actions.push(ClientAction::Render);
        actions
    }

    fn fetch_messages(&mut self, thread: ThreadId, mark_read: bool) -> ClientAction {
        let endpoint = Endpoint::Messages(thread.clone());
        self.request(endpoint, Pending::FetchMessages { thread, mark_read })
    }

    fn handle_delete_orders(
        &mut self,
        ids: Vec<OrderId>,
    ) -> Result<Vec<ClientAction>, ClientError> {
        self.require_session()?;
        if ids.is_empty() {
            return Err(ValidationError::EmptySelection.into());
        }
        let snapshot = self.orders.remove(&ids);
        Ok(vec![
            self.request(Endpoint::DeleteOrders(ids), Pending::DeleteOrders { snapshot }),
            ClientAction::Render,
        ])
    }

    fn handle_advance(&mut self, order: OrderId) -> Result<Vec<ClientAction>, ClientError> {
        self.require_session()?;
        match self.orders.plan(&order)? {
            Plan::CaptureProof => Ok(vec![ClientAction::Navigate(Screen::PhotoCapture { order })]),
            Plan::Submit(transition) => {
                self.orders.begin_transition(&order)?;
                let to = transition.to;
                let endpoint = Endpoint::UpdateDeliveryStatus {
                    order: order.clone(),
                    status: to,
                    proof: transition.proof,
                    receipt: transition.receipt,
                };
                Ok(vec![
                    self.request(endpoint, Pending::Advance { order, to }),
                    ClientAction::Render,
                ])
            },
        }
    }

    fn handle_open_thread(&mut self, thread: ThreadId) -> Result<Vec<ClientAction>, ClientError> {
        self.require_session()?;
        let peer = self
            .inbox
            .get(&thread)
            .ok_or_else(|| LookupError::Thread(thread.clone()))
            .map(Peer::from_thread)?
            .ok_or_else(|| LookupError::Peer(thread.clone()))?;
        self.inbox.open_thread(&thread)?;
        let self_id = self.self_id();
        Ok(self.open_conversation(thread, peer, self_id, true))
    }

    /// Open a conversation and load its messages. With `mark_now` the
    /// mark-read goes out immediately, otherwise it follows the load.
    fn open_conversation(
        &mut self,
        thread: ThreadId,
        peer: Peer,
        self_id: Option<String>,
        mark_now: bool,
    ) -> Vec<ClientAction> {
        self.conversation = Some(Conversation::new(thread.clone(), Some(peer), self_id));

        let mut actions = vec![
            ClientAction::Navigate(Screen::Conversation { thread: thread.clone() }),
            self.fetch_messages(thread.clone(), !mark_now),
        ];
        if mark_now {
            let endpoint = Endpoint::MarkThreadRead(thread.clone());
            actions.push(self.request(endpoint, Pending::MarkRead { thread }));
        }
        actions.push(ClientAction::Render);
        actions
    }

    fn handle_delete_thread(
        &mut self,
        thread: ThreadId,
    ) -> Result<Vec<ClientAction>, ClientError> {
        self.require_session()?;
        let snapshot = self.inbox.remove(&thread)?;
        if self.conversation.as_ref().is_some_and(|c| c.thread() == &thread) {
            self.conversation = None;
        }
        Ok(vec![
            self.request(Endpoint::DeleteThread(thread), Pending::DeleteThread { snapshot }),
            ClientAction::Render,
        ])
    }

    fn handle_send(
        &mut self,
        text: String,
        images: Vec<rider_proto::Attachment>,
    ) -> Result<Vec<ClientAction>, ClientError> {
        self.require_session()?;
        let conversation = self.conversation.as_ref().ok_or(ClientError::NoConversation)?;
        let thread = conversation.thread().clone();
        let peer =
            conversation.peer().cloned().ok_or_else(|| LookupError::Peer(thread.clone()))?;

        let message =
            OutgoingMessage { receiver_id: peer.id, receiver_role: peer.role, text, images };
        if message.is_blank() {
            return Err(ValidationError::BlankMessage.into());
        }
        Ok(vec![self.request(Endpoint::SendMessage(message), Pending::SendMessage { thread })])
    }

    fn handle_request_reset_code(&mut self, email: &str) -> Result<Vec<ClientAction>, ClientError> {
        let email = PasswordReset::validate_request(email)?;
        let remaining_secs = self.reset_cooldown_secs();
        if remaining_secs > 0 {
            return Err(ValidationError::ResendCooldown { remaining_secs }.into());
        }
        let request = ForgotPasswordRequest { email: email.clone() };
        Ok(vec![
            self.request(Endpoint::ForgotPassword(request), Pending::RequestResetCode { email }),
            ClientAction::Render,
        ])
    }

    fn handle_response(
        &mut self,
        id: RequestId,
        result: Result<Vec<u8>, ApiFailure>,
    ) -> Vec<ClientAction> {
        let Some(pending) = self.pending.remove(&id) else {
            return vec![log(LogLevel::Debug, format!("ignoring response to unknown request {id}"))];
        };

        match result.and_then(|body| self.on_success(&pending, &body)) {
            Ok(actions) => actions,
            Err(failure) if failure.is_session_expired() && pending.requires_session() => {
                self.expire_session()
            },
            Err(failure) => self.on_failure(pending, failure),
        }
    }

    /// Apply a successful reply. Decoding happens before any mutation, so a
    /// decode failure leaves the state as it was.
    fn on_success(
        &mut self,
        pending: &Pending,
        body: &[u8],
    ) -> Result<Vec<ClientAction>, ApiFailure> {
        match pending {
            Pending::Login => {
                let reply: LoginReply = decode_reply(body)?;
                Ok(self.on_login_reply(reply))
            },
            Pending::FetchOrders => {
                let orders: Vec<Order> = decode_reply(body)?;
                self.orders.replace(orders);
                Ok(self.finish_orders_fetch())
            },
            Pending::DeleteOrders { .. } | Pending::DeleteThread { .. } => {
                Ok(vec![ClientAction::Render])
            },
            Pending::Advance { order, to } => {
                let reply: StatusUpdateReply = decode_reply(body)?;
                if self.orders.confirm_transition(order, *to, reply).is_err() {
                    let message = format!("order {order} left the list before its update landed");
                    return Ok(vec![log(LogLevel::Debug, message)]);
                }
                Ok(vec![
                    ClientAction::Notify(Notice::success(delivery::success_message(*to))),
                    ClientAction::Render,
                ])
            },
            Pending::FetchInbox => {
                let threads: Vec<InboxThread> = decode_reply(body)?;
                self.inbox.replace(threads);
                Ok(self.finish_inbox_fetch())
            },
            Pending::MarkRead { thread } => {
                Ok(vec![log(LogLevel::Debug, format!("thread {thread} marked as read"))])
            },
            Pending::FetchMessages { thread, mark_read } => {
                let messages: Vec<Message> = decode_reply(body)?;
                let Some(conversation) =
                    self.conversation.as_mut().filter(|c| c.thread() == thread)
                else {
                    return Ok(Vec::new());
                };
                conversation.replace(messages);
                let mut actions = Vec::new();
                if *mark_read && conversation.needs_mark_read() {
                    let endpoint = Endpoint::MarkThreadRead(thread.clone());
                    let pending = Pending::MarkRead { thread: thread.clone() };
                    actions.push(self.request(endpoint, pending));
                }
                actions.push(ClientAction::Render);
                Ok(actions)
            },
            Pending::SendMessage { thread } => {
                let message: Message = decode_reply(body)?;
                if let Some(conversation) =
                    self.conversation.as_mut().filter(|c| c.thread() == thread)
                {
                    conversation.append(message);
                }
                Ok(vec![ClientAction::Render])
            },
            Pending::OpenChat { peer } => {
                let handle: ChatHandle = decode_reply(body)?;
                let self_id = Some(handle.sender_id)
                    .filter(|id| !id.is_empty())
                    .or_else(|| self.self_id());
                Ok(self.open_conversation(handle.chat_id, peer.clone(), self_id, false))
            },
            Pending::FetchPayouts => {
                let payouts: Vec<Payout> = decode_reply(body)?;
                self.payouts.replace(payouts);
                Ok(vec![ClientAction::Render])
            },
            Pending::DeletePayouts { ids } => {
                self.payouts.remove(ids);
                Ok(vec![
                    ClientAction::Notify(Notice::success("Payout records deleted")),
                    ClientAction::Render,
                ])
            },
            Pending::FetchProfile => {
                let profile: Profile = decode_reply(body)?;
                self.session.set_user(profile);
                Ok(vec![ClientAction::Render])
            },
            Pending::UpdateProfile => {
                let reply: ProfileUpdateReply = decode_reply(body)?;
                self.session.set_user(reply.rider);
                Ok(vec![
                    ClientAction::Notify(Notice::success("Profile updated successfully")),
                    ClientAction::Render,
                ])
            },
            Pending::SetAvailability { .. } => Ok(vec![ClientAction::Render]),
            Pending::FetchQrCodes => {
                let reply: QrPaymentReply = decode_reply(body)?;
                self.qr_codes = reply.into_codes();
                Ok(vec![ClientAction::Render])
            },
            Pending::RequestResetCode { email } => {
                let reply: ForgotPasswordReply = decode_reply(body)?;
                let mut actions = Vec::new();
                if !reply.message.is_empty() {
                    actions.push(ClientAction::Notify(Notice::info(reply.message.clone())));
                }
                self.reset.code_sent(email.clone(), reply.message, reply.cooldown);
                actions.push(ClientAction::Render);
                Ok(actions)
            },
            Pending::VerifyResetCode => {
                let reply: MessageReply = decode_reply(body)?;
                self.reset.verified(reply.message);
                Ok(vec![ClientAction::Render])
            },
            Pending::ChangePassword => {
                let reply: MessageReply = decode_reply(body)?;
                let notice = if reply.message.is_empty() {
                    "Password changed".to_owned()
                } else {
                    reply.message.clone()
                };
                self.reset.completed(reply.message);
                Ok(vec![
                    ClientAction::Notify(Notice::success(notice)),
                    ClientAction::Navigate(Screen::Login),
                    ClientAction::Render,
                ])
            },
        }
    }

    fn on_login_reply(&mut self, reply: LoginReply) -> Vec<ClientAction> {
        let Some(token) = reply.access_token.filter(|t| !t.trim().is_empty()) else {
            let message =
                if reply.message.is_empty() { "Login failed".to_owned() } else { reply.message };
            self.login_error = Some(LoginRejection::General(message.clone()));
            return vec![ClientAction::Notify(Notice::error(message)), ClientAction::Render];
        };
        if let Err(err) = self.session.login(token.clone()) {
            return vec![log(LogLevel::Warn, format!("discarding login reply: {err}"))];
        }

        let mut actions = vec![ClientAction::PersistToken(token)];
        actions.extend(self.on_authenticated());
        actions
    }

    fn on_failure(&mut self, pending: Pending, failure: ApiFailure) -> Vec<ClientAction> {
        match pending {
            Pending::Login => {
                let rejection = LoginRejection::from_failure(&failure);
                let notice = Notice::error(rejection.message());
                self.login_error = Some(rejection);
                vec![ClientAction::Notify(notice), ClientAction::Render]
            },
            Pending::FetchOrders => {
                self.orders.set_error(failure.message);
                self.finish_orders_fetch()
            },
            Pending::DeleteOrders { snapshot } => {
                self.orders.restore(snapshot);
                let mut actions = vec![ClientAction::Notify(Notice::error(failure.message))];
                actions.extend(self.refresh_orders());
                actions.push(ClientAction::Render);
                actions
            },
            Pending::Advance { order, .. } => {
                self.orders.abort_transition(&order);
                let mut actions = vec![ClientAction::Notify(Notice::error(failure.message))];
                // Status may have changed server-side
                if failure.kind == FailureKind::Decode {
                    actions.extend(self.refresh_orders());
                }
                actions.push(ClientAction::Render);
                actions
            },
            Pending::FetchInbox => {
                self.inbox.set_error(failure.message);
                self.finish_inbox_fetch()
            },
            Pending::MarkRead { thread } => vec![log(
                LogLevel::Warn,
                format!("failed to mark thread {thread} as read: {}", failure.message),
            )],
            Pending::DeleteThread { snapshot } => {
                self.inbox.restore(snapshot);
                let mut actions = vec![ClientAction::Notify(Notice::error(failure.message))];
                actions.extend(self.refresh_inbox());
                actions.push(ClientAction::Render);
                actions
            },
            Pending::FetchMessages { thread, .. } => {
                if let Some(conversation) =
                    self.conversation.as_mut().filter(|c| c.thread() == &thread)
                {
                    conversation.set_error(failure.message);
                }
                vec![ClientAction::Render]
            },
            Pending::FetchPayouts => {
                self.payouts.set_error(failure.message);
                vec![ClientAction::Render]
            },
            Pending::FetchProfile => vec![log(
                LogLevel::Warn,
                format!("failed to load profile: {}", failure.message),
            )],
            Pending::SetAvailability { previous } => {
                if let Some(previous) = previous {
                    self.session.set_availability(previous);
                }
                vec![ClientAction::Notify(Notice::error(failure.message)), ClientAction::Render]
            },
            Pending::SendMessage { .. }
            | Pending::OpenChat { .. }
            | Pending::DeletePayouts { .. }
            | Pending::UpdateProfile
            | Pending::FetchQrCodes
            | Pending::RequestResetCode { .. }
            | Pending::VerifyResetCode
            | Pending::ChangePassword => {
                vec![ClientAction::Notify(Notice::error(failure.message))]
            },
        }
    }

    fn handle_signal(&mut self, signal: Signal) -> Vec<ClientAction> {
        if !self.session.is_authenticated() {
            let message = format!("ignoring '{}' while logged out", signal.event_name());
            return vec![log(LogLevel::Debug, message)];
        }
        match signal {
            Signal::DeliveryAssigned => {
                let mut actions = self.refresh_orders();
                actions.push(ClientAction::Notify(Notice::info(NEW_DELIVERY_NOTICE)));
                actions
            },
            Signal::InboxActivity => self.refresh_inbox(),
            Signal::MessageSent | Signal::MessageRead => match self.open_thread_id() {
                Ok(thread) => vec![self.fetch_messages(thread, signal == Signal::MessageSent)],
                Err(_) => Vec::new(),
            },
        }
    }

    /// Start a new realtime connection. Events of older connections are
    /// stale from here on.
    fn open_realtime(&mut self, delay: Duration) -> ClientAction {
        self.realtime_generation = self.realtime_generation.wrapping_add(1);
        ClientAction::OpenRealtime { delay, generation: self.realtime_generation }
    }

    fn is_stale(&self, generation: u64) -> bool {
        generation != self.realtime_generation
    }

    fn handle_realtime_opened(&mut self, generation: u64) -> Vec<ClientAction> {
        if self.is_stale(generation) {
            let message = format!("ignoring stale realtime open #{generation}");
            return vec![log(LogLevel::Debug, message)];
        }
        if !self.session.is_authenticated() {
            return vec![
                log(LogLevel::Debug, "realtime opened without a session"),
                ClientAction::CloseRealtime,
            ];
        }
        let reconnected = self.reconnect_attempt > 0;
        self.realtime = RealtimeState::Open;
        self.reconnect_attempt = 0;

        let mut actions = vec![log(LogLevel::Info, "realtime connected")];
        if reconnected {
            // Signals may have been missed while disconnected
            actions.extend(self.refresh_orders());
            actions.extend(self.refresh_inbox());
        }
        actions.push(ClientAction::Render);
        actions
    }

    fn handle_realtime_closed(&mut self, generation: u64, reason: &str) -> Vec<ClientAction> {
        if self.is_stale(generation) {
            let message = format!("ignoring stale realtime close #{generation}: {reason}");
            return vec![log(LogLevel::Debug, message)];
        }
        if !self.session.is_authenticated() || self.realtime == RealtimeState::Closed {
            self.realtime = RealtimeState::Closed;
            return vec![log(LogLevel::Debug, format!("realtime closed: {reason}"))];
        }
        let delay = self.config.reconnect_delay(self.reconnect_attempt);
        self.reconnect_attempt = self.reconnect_attempt.saturating_add(1);
        self.realtime = RealtimeState::Connecting;
        vec![
            log(LogLevel::Warn, format!("realtime closed ({reason}), reconnecting in {delay:?}")),
            self.open_realtime(delay),
            ClientAction::Render,
        ]
    }
}

fn log(level: LogLevel, message: impl Into<String>) -> ClientAction {
    ClientAction::Log { level, message: message.into() }
}
