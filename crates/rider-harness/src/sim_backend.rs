//! In-memory model of the rider backend.
//!
//! [`SimBackend`] answers [`Endpoint`]s the way the REST API does: same
//! status codes, same JSON shapes, same session expiry signalling. Tests
//! drive server-side activity (new assignments, customer messages, token
//! revocation) through its methods and inject faults per endpoint.

use std::collections::{HashMap, HashSet, VecDeque};

use rider_proto::{
    ApiFailure, Attachment, Endpoint, OrderId, Signal, TOKEN_EXPIRED_MESSAGE, ThreadId,
    auth::{ChangePasswordRequest, LoginRequest, VerifyCodeRequest},
    failure::check_response,
    inbox::{ChatHandle, InboxThread, Message, OpenChatRequest, OutgoingMessage, Role},
    order::{DeliveryStatus, Order, PaymentStatus, StatusUpdateReply},
    payout::Payout,
    profile::{
        Availability, Profile, ProfileUpdate, ProfileUpdateReply, QrPaymentData, QrPaymentReply,
    },
};
use serde_json::{Value, json};

use crate::{
    SimEnv,
    fixtures::{self, RIDER_ID, RIDER_PASSWORD, SUPPORT_ID},
};

/// Code mailed by the simulated password reset.
pub const RESET_CODE: &str = "424242";

/// Seconds between two reset code requests.
pub const RESET_COOLDOWN_SECS: i64 = 60;

/// Injected failure for the next call of an endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Answer with this status and `{ "message": ... }` body.
    Status(u16, String),
    /// The request never reaches the backend.
    Network,
    /// 200 with a body that is not the expected JSON.
    Garbage,
}

/// One request as seen by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestRecord {
    /// Endpoint name, see [`Endpoint::name`].
    pub endpoint: &'static str,
    /// Whether the bearer token was valid.
    pub authorized: bool,
    /// Response status, `None` for network faults.
    pub status: Option<u16>,
}

#[derive(Debug, Clone)]
struct ResetState {
    email: String,
    cooldown_until_ms: i64,
    verified: bool,
}

/// Simulated rider backend.
#[derive(Debug)]
pub struct SimBackend {
    env: SimEnv,
    profile: Profile,
    password: String,
    verification: Option<&'static str>,
    tokens: HashSet<String>,
    next_token: u64,
    orders: Vec<Order>,
    threads: Vec<InboxThread>,
    messages: HashMap<ThreadId, Vec<Message>>,
    payouts: Vec<Payout>,
    qr: QrPaymentData,
    reset: Option<ResetState>,
    faults: HashMap<&'static str, VecDeque<Fault>>,
    log: Vec<RequestRecord>,
    signals: VecDeque<Signal>,
    next_thread: u64,
}

impl SimBackend {
    /// Backend with the fixture rider and no data.
    pub fn new(env: SimEnv) -> Self {
        Self {
            env,
            profile: fixtures::rider_profile(),
            password: RIDER_PASSWORD.to_owned(),
            verification: None,
            tokens: HashSet::new(),
            next_token: 1,
            orders: Vec::new(),
            threads: Vec::new(),
            messages: HashMap::new(),
            payouts: Vec::new(),
            qr: QrPaymentData {
                gcash_qr: Some("https://cdn.example.com/qr/gcash.png".to_owned()),
                maya_qr: None,
            },
            reset: None,
            faults: HashMap::new(),
            log: Vec::new(),
            signals: VecDeque::new(),
            next_thread: 1,
        }
    }

    /// Issue a valid token without going through login, e.g. to seed a
    /// token store.
    pub fn issue_token(&mut self) -> String {
        let token = format!("token-{}", self.next_token);
        self.next_token += 1;
        self.tokens.insert(token.clone());
        token
    }

    /// Revoke every token. The next authenticated call answers 401.
    pub fn expire_sessions(&mut self) {
        self.tokens.clear();
    }

    /// Make logins fail with a verification rejection.
    pub fn set_verification_pending(&mut self, pending: bool) {
        self.verification = pending.then_some("pending");
    }

    /// Fail the next call of `endpoint`. Faults queue up in order.
    pub fn fail_next(&mut self, endpoint: &'static str, fault: Fault) {
        self.faults.entry(endpoint).or_default().push_back(fault);
    }

    /// Add an order without notifying anyone.
    pub fn seed_order(&mut self, order: Order) {
        self.orders.push(order);
    }

    /// Assign a new order and push the realtime notification.
    pub fn assign_order(&mut self, order: Order) {
        self.orders.push(order);
        self.signals.push_back(Signal::DeliveryAssigned);
    }

    /// Add a thread without notifying anyone.
    pub fn seed_thread(&mut self, thread: InboxThread) {
        self.messages.entry(thread.id.clone()).or_default();
        self.threads.push(thread);
    }

    /// Add a payout record.
    pub fn seed_payout(&mut self, payout: Payout) {
        self.payouts.push(payout);
    }

    /// A customer writes in `thread`, bumping the rider's unread counter and
    /// pushing the realtime notifications.
    pub fn customer_writes(&mut self, thread: &ThreadId, text: &str) {
        let now = self.env.now_utc();
        let Some(summary) = self.threads.iter_mut().find(|t| &t.id == thread) else {
            return;
        };
        let sender = summary
            .counterpart()
            .and_then(|p| p.account_id.as_ref())
            .map_or_else(|| "unknown".to_owned(), |a| a.id.to_string());

        summary.last_message = text.to_owned();
        summary.last_sender = Some(sender.clone());
        summary.updated_at = now;
        summary.unread_count.rider = Some(summary.unread_for_rider() + 1);
        let message = fixtures::message(&sender, text, now);
        self.messages.entry(thread.clone()).or_default().push(message);
        self.signals.extend([Signal::InboxActivity, Signal::MessageSent]);
    }

    /// Realtime signals not yet delivered.
    pub fn take_signals(&mut self) -> Vec<Signal> {
        self.signals.drain(..).collect()
    }

    /// Every request handled so far.
    pub fn log(&self) -> &[RequestRecord] {
        &self.log
    }

    /// Names of requests handled so far, in order.
    pub fn request_names(&self) -> Vec<&'static str> {
        self.log.iter().map(|r| r.endpoint).collect()
    }

    /// Orders as stored on the server.
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Order as stored on the server.
    pub fn order(&self, id: &OrderId) -> Option<&Order> {
        self.orders.iter().find(|o| &o.id == id)
    }

    /// Threads as stored on the server.
    pub fn threads(&self) -> &[InboxThread] {
        &self.threads
    }

    /// Messages of a thread as stored on the server.
    pub fn messages(&self, thread: &ThreadId) -> &[Message] {
        self.messages.get(thread).map_or(&[], Vec::as_slice)
    }

    /// Payouts as stored on the server.
    pub fn payouts(&self) -> &[Payout] {
        &self.payouts
    }

    /// Rider profile as stored on the server.
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Whether `password` is the rider's current password.
    pub fn password_is(&self, password: &str) -> bool {
        self.password == password
    }

    /// Handle one request.
    pub fn handle(
        &mut self,
        endpoint: &Endpoint,
        token: Option<&str>,
    ) -> Result<Vec<u8>, ApiFailure> {
        let name = endpoint.name();
        let authorized = token.is_some_and(|t| self.tokens.contains(t));

        if let Some(fault) = self.faults.get_mut(name).and_then(VecDeque::pop_front) {
            let (status, body) = match fault {
                Fault::Network => {
                    self.log.push(RequestRecord { endpoint: name, authorized, status: None });
                    return Err(ApiFailure::network("connection reset by peer"));
                },
                Fault::Status(status, message) => (status, json!({ "message": message })),
                Fault::Garbage => (200, json!("<html>gateway</html>")),
            };
            return self.reply(name, authorized, status, &body);
        }

        if endpoint.requires_auth() && !authorized {
            let body = json!({ "message": TOKEN_EXPIRED_MESSAGE });
            return self.reply(name, authorized, 401, &body);
        }

        let (status, body) = self.route(endpoint);
        self.reply(name, authorized, status, &body)
    }

    fn reply(
        &mut self,
        endpoint: &'static str,
        authorized: bool,
        status: u16,
        body: &Value,
    ) -> Result<Vec<u8>, ApiFailure> {
        self.log.push(RequestRecord { endpoint, authorized, status: Some(status) });
        let bytes = serde_json::to_vec(body).map_err(|e| ApiFailure::decode(e.to_string()))?;
        check_response(status, bytes)
    }

    fn route(&mut self, endpoint: &Endpoint) -> (u16, Value) {
        match endpoint {
            Endpoint::Login(req) => self.login(req),
            Endpoint::ForgotPassword(req) => self.forgot_password(&req.email),
            Endpoint::VerifyCode(req) => self.verify_code(req),
            Endpoint::ChangePassword(req) => self.change_password(req),
            Endpoint::Orders => ok(&self.orders),
            Endpoint::DeleteOrders(ids) => {
                self.orders.retain(|o| !ids.contains(&o.id));
                (200, json!({ "message": "Orders deleted" }))
            },
            Endpoint::UpdateDeliveryStatus { order, status, proof, receipt } => {
                self.update_status(order, *status, proof.as_ref(), receipt.as_ref())
            },
            Endpoint::Inbox => {
                let mut threads = self.threads.clone();
                threads.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
                ok(&threads)
            },
            Endpoint::MarkThreadRead(id) => self.mark_read(id),
            Endpoint::DeleteThread(id) => {
                let before = self.threads.len();
                self.threads.retain(|t| &t.id != id);
                if self.threads.len() == before {
                    return not_found("Chat not found");
                }
                self.messages.remove(id);
                (200, json!({ "message": "Chat deleted" }))
            },
            Endpoint::Messages(id) => match self.messages.get(id) {
                Some(messages) => ok(messages),
                None => not_found("Chat not found"),
            },
            Endpoint::SendMessage(message) => self.send_message(message),
            Endpoint::OpenChat(req) => self.open_chat(req),
            Endpoint::Payouts => ok(&self.payouts),
            Endpoint::DeletePayouts(ids) => {
                self.payouts.retain(|p| !ids.contains(&p.id));
                (200, json!({ "message": "Payouts deleted" }))
            },
            Endpoint::Profile => ok(&self.profile),
            Endpoint::UpdateProfile(update) => self.update_profile(update),
            Endpoint::SetAvailability(status) => {
                self.profile.status = *status;
                let word = if *status == Availability::Available { "online" } else { "offline" };
                (200, json!({ "message": format!("You are now {word}") }))
            },
            Endpoint::QrPayments => ok(&QrPaymentReply { data: self.qr.clone() }),
        }
    }

    fn login(&mut self, req: &LoginRequest) -> (u16, Value) {
        if req.email != self.profile.email {
            return (404, json!({ "message": "Email not found", "from": "email" }));
        }
        if req.password != self.password {
            return (400, json!({ "message": "Incorrect password", "from": "password" }));
        }
        if let Some(status) = self.verification {
            let body = json!({
                "message": "Your account is still under review",
                "from": "verification",
                "verificationStatus": status,
            });
            return (403, body);
        }
        let token = self.issue_token();
        (200, json!({ "accessToken": token, "message": "Login successful" }))
    }

    fn forgot_password(&mut self, email: &str) -> (u16, Value) {
        if email != self.profile.email {
            return not_found("No account with that email");
        }
        let now = self.env.now_ms();
        if let Some(reset) = &self.reset
            && reset.cooldown_until_ms > now
        {
            return (429, json!({ "message": "Please wait before requesting another code" }));
        }
        let cooldown_until_ms = now + RESET_COOLDOWN_SECS * 1000;
        self.reset =
            Some(ResetState { email: email.to_owned(), cooldown_until_ms, verified: false });
        (200, json!({ "message": "Verification code sent", "cooldown": cooldown_until_ms }))
    }

    fn verify_code(&mut self, req: &VerifyCodeRequest) -> (u16, Value) {
        match &mut self.reset {
            Some(reset) if reset.email == req.email && req.verify_code == RESET_CODE => {
                reset.verified = true;
                (200, json!({ "message": "Code verified" }))
            },
            _ => (400, json!({ "message": "Invalid verification code" })),
        }
    }

    fn change_password(&mut self, req: &ChangePasswordRequest) -> (u16, Value) {
        match &self.reset {
            Some(reset) if reset.verified && reset.email == req.email => {
                if req.new_password != req.confirm_password {
                    return (400, json!({ "message": "Passwords do not match" }));
                }
                self.password.clone_from(&req.new_password);
                self.reset = None;
                (200, json!({ "message": "Password changed successfully" }))
            },
            _ => (400, json!({ "message": "Verify your email first" })),
        }
    }

    fn update_status(
        &mut self,
        id: &OrderId,
        to: DeliveryStatus,
        proof: Option<&Attachment>,
        receipt: Option<&Attachment>,
    ) -> (u16, Value) {
        let Some(order) = self.orders.iter_mut().find(|o| &o.id == id) else {
            return not_found("Order not found");
        };
        if to.stage() != order.status_delivery.stage() + 1 {
            let message = format!("Cannot move order from {} to {to}", order.status_delivery);
            return (400, json!({ "message": message }));
        }
        if to == DeliveryStatus::Delivered
            && order.payment_status != PaymentStatus::Paid
            && receipt.is_none()
        {
            return (400, json!({ "message": "Payment receipt is required" }));
        }

        let photo = proof.map(|p| format!("https://cdn.example.com/proof/{}", p.file_name));
        order.status_delivery = to;
        order.status_history.push(fixtures::history_entry(to, photo));
        let payment_status = if to == DeliveryStatus::Delivered {
            order.payment_status = PaymentStatus::Paid;
            Some(PaymentStatus::Paid)
        } else {
            None
        };
        ok(&StatusUpdateReply { status_history: order.status_history.clone(), payment_status })
    }

    fn mark_read(&mut self, id: &ThreadId) -> (u16, Value) {
        let Some(thread) = self.threads.iter_mut().find(|t| &t.id == id) else {
            return not_found("Chat not found");
        };
        thread.unread_count.rider = Some(0);
        for message in self.messages.entry(id.clone()).or_default() {
            if !message.read_by.iter().any(|r| r == RIDER_ID) {
                message.read_by.push(RIDER_ID.to_owned());
            }
        }
        self.signals.push_back(Signal::MessageRead);
        (200, json!({ "message": "Marked as read" }))
    }

    fn send_message(&mut self, outgoing: &OutgoingMessage) -> (u16, Value) {
        let thread = self.thread_with(&outgoing.receiver_id, &outgoing.receiver_role);
        let now = self.env.now_utc();
        let mut message = fixtures::message(RIDER_ID, &outgoing.text, now);
        message.image_files = outgoing
            .images
            .iter()
            .map(|image| format!("https://cdn.example.com/chat/{}", image.file_name))
            .collect();

        if let Some(summary) = self.threads.iter_mut().find(|t| t.id == thread) {
            summary.last_message = if outgoing.text.is_empty() {
                "Sent a photo".to_owned()
            } else {
                outgoing.text.clone()
            };
            summary.last_sender = Some(RIDER_ID.to_owned());
            summary.updated_at = now;
        }
        self.messages.entry(thread).or_default().push(message.clone());
        self.signals.push_back(Signal::MessageSent);
        ok(&message)
    }

    fn open_chat(&mut self, req: &OpenChatRequest) -> (u16, Value) {
        let thread = self.thread_with(&req.receiver_id, &req.receiver_role);
        let receiver_id = self
            .threads
            .iter()
            .find(|t| t.id == thread)
            .and_then(InboxThread::counterpart)
            .and_then(|p| p.account_id.as_ref())
            .map(|a| a.id.to_string())
            .unwrap_or_default();
        let handle = ChatHandle {
            chat_id: thread,
            sender_id: RIDER_ID.to_owned(),
            receiver_id,
            email: None,
        };
        ok(&handle)
    }

    /// Thread with the given counterpart, created on first use. Support is
    /// addressed as `"unknown"` with the admin role.
    fn thread_with(&mut self, receiver_id: &str, role: &Role) -> ThreadId {
        let found = self.threads.iter().find(|t| {
            t.counterpart().is_some_and(|p| match &p.account_id {
                _ if receiver_id == "unknown" => p.role == Role::Admin,
                Some(account) => account.id.as_str() == receiver_id,
                None => false,
            })
        });
        if let Some(thread) = found {
            return thread.id.clone();
        }

        let id = format!("chat-{}", self.next_thread);
        self.next_thread += 1;
        let counterpart = if receiver_id == "unknown" { SUPPORT_ID } else { receiver_id };
        let thread = fixtures::thread(&id, counterpart, role.clone(), 0, self.env.now_utc());
        let id = thread.id.clone();
        self.seed_thread(thread);
        id
    }

    fn update_profile(&mut self, update: &ProfileUpdate) -> (u16, Value) {
        if let Some(field) = update.missing_field() {
            return (400, json!({ "message": format!("{field} is required") }));
        }
        self.profile.firstname.clone_from(&update.firstname);
        self.profile.lastname.clone_from(&update.lastname);
        self.profile.email.clone_from(&update.email);
        self.profile.contact.clone_from(&update.contact);
        self.profile.wallet.number.clone_from(&update.wallet_number);
        self.profile.wallet.kind.clone_from(&update.wallet_type);
        if let Some(image) = &update.image {
            self.profile.image_file =
                Some(format!("https://cdn.example.com/avatars/{}", image.file_name));
        }
        ok(&ProfileUpdateReply { rider: self.profile.clone() })
    }
}

fn ok<T: serde::Serialize + ?Sized>(value: &T) -> (u16, Value) {
    match serde_json::to_value(value) {
        Ok(body) => (200, body),
        Err(e) => (500, json!({ "message": e.to_string() })),
    }
}

fn not_found(message: &str) -> (u16, Value) {
    (404, json!({ "message": message }))
}
