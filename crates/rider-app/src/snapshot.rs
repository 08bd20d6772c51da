//! Read-only view of client state handed to renderers.

use rider_client::{Client, Environment, Notice, RealtimeState, Screen};
use rider_core::{
    chat::Conversation, inbox::Badge, orders::TrackedOrder, password_reset::ResetStage,
    session::Phase,
};
use rider_proto::{
    auth::LoginRejection,
    inbox::InboxThread,
    payout::Payout,
    profile::{Profile, QrCode},
};

/// Everything a frontend needs to draw one frame.
///
/// Captured after every [`ClientAction::Render`](rider_client::ClientAction::Render)
/// and published through [`Runtime::subscribe`](crate::Runtime::subscribe).
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Session phase.
    pub phase: Phase,
    /// Screen the rider is on.
    pub screen: Screen,
    /// Logged-in rider.
    pub user: Option<Profile>,
    /// Orders, newest first, with staged evidence.
    pub orders: Vec<TrackedOrder>,
    /// Last order list failure.
    pub orders_error: Option<String>,
    /// Inbox threads, most recent first.
    pub threads: Vec<InboxThread>,
    /// Unread indicator.
    pub badge: Badge,
    /// Last inbox failure.
    pub inbox_error: Option<String>,
    /// Open conversation.
    pub conversation: Option<Conversation>,
    /// Payout history.
    pub payouts: Vec<Payout>,
    /// Sum of net payout amounts.
    pub payouts_total: f64,
    /// Payment QR codes.
    pub qr_codes: Vec<QrCode>,
    /// Password reset progress.
    pub reset_stage: ResetStage,
    /// Seconds until another reset code may be requested.
    pub reset_cooldown_secs: u64,
    /// Why the last login failed.
    pub login_error: Option<LoginRejection>,
    /// Most recent notice.
    pub notice: Option<Notice>,
    /// Realtime channel state.
    pub realtime: RealtimeState,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            phase: Phase::Loading,
            screen: Screen::Login,
            user: None,
            orders: Vec::new(),
            orders_error: None,
            threads: Vec::new(),
            badge: Badge::default(),
            inbox_error: None,
            conversation: None,
            payouts: Vec::new(),
            payouts_total: 0.0,
            qr_codes: Vec::new(),
            reset_stage: ResetStage::default(),
            reset_cooldown_secs: 0,
            login_error: None,
            notice: None,
            realtime: RealtimeState::Closed,
        }
    }
}

impl Snapshot {
    /// Capture the client's current state.
    pub fn capture<E: Environment>(
        client: &Client<E>,
        screen: &Screen,
        notice: Option<&Notice>,
    ) -> Self {
        let session = client.session();
        let inbox = client.inbox();
        let payouts = client.payouts();
        Self {
            phase: session.phase(),
            screen: screen.clone(),
            user: session.user().cloned(),
            orders: client.orders().orders().to_vec(),
            orders_error: client.orders().error().map(str::to_owned),
            threads: inbox.threads().to_vec(),
            badge: inbox.badge(),
            inbox_error: inbox.error().map(str::to_owned),
            conversation: client.conversation().cloned(),
            payouts: payouts.payouts().to_vec(),
            payouts_total: payouts.total_net(),
            qr_codes: client.qr_codes().to_vec(),
            reset_stage: client.password_reset().stage(),
            reset_cooldown_secs: client.reset_cooldown_secs(),
            login_error: client.login_error().cloned(),
            notice: notice.cloned(),
            realtime: client.realtime(),
        }
    }

    /// Number of orders whose advance control is pressable.
    pub fn actionable_orders(&self) -> usize {
        self.orders.iter().filter(|o| o.control().is_enabled()).count()
    }
}
