//! Plain-text rendering of [`Snapshot`]s.
//!
//! Pure functions from state to text so frames can be snapshot-tested
//! without a console.

use rider_app::Snapshot;
use rider_client::{Notice, NoticeLevel, RealtimeState, Screen};
use rider_core::{
    chat::{Conversation, Peer},
    delivery::Control,
    orders::TrackedOrder,
    password_reset::ResetStage,
    session::Phase,
};
use rider_proto::{order::PaymentStatus, payout::PayoutStatus, profile::QrMethod};

/// Render one frame.
pub fn frame(snapshot: &Snapshot) -> String {
    let mut lines = Vec::new();
    if snapshot.phase == Phase::Loading {
        lines.push("== starting ==".to_owned());
        return lines.join("\n");
    }

    match &snapshot.screen {
        Screen::Login => login(snapshot, &mut lines),
        Screen::Home => home(snapshot, &mut lines),
        Screen::PhotoCapture { order } => {
            lines.push(format!("== proof photo for {order} =="));
            lines.push(format!("  attach with: proof {order} <path>"));
        },
        Screen::Conversation { thread } => {
            match &snapshot.conversation {
                Some(conversation) => chat(conversation, &mut lines),
                None => lines.push(format!("== chat {thread} (loading) ==")),
            }
        },
    }
    lines.join("\n")
}

/// Render a notice as a single line.
pub fn notice(notice: &Notice) -> String {
    let tag = match notice.level {
        NoticeLevel::Info => "info",
        NoticeLevel::Success => "ok",
        NoticeLevel::Error => "error",
    };
    format!("[{tag}] {}", notice.message)
}

fn login(snapshot: &Snapshot, lines: &mut Vec<String>) {
    lines.push("== login ==".to_owned());
    if let Some(rejection) = &snapshot.login_error {
        lines.push(format!("! {}", rejection.message()));
    }

    let step = match snapshot.reset_stage {
        ResetStage::Idle => return,
        ResetStage::CodeSent => "enter the emailed code (verify <code>)",
        ResetStage::Verified => "choose a new password (new-password <pw> <confirm>)",
        ResetStage::Done => "done, log in with the new password",
    };
    let mut line = format!("password reset: {step}");
    if snapshot.reset_cooldown_secs > 0 {
        line.push_str(&format!("; resend in {}s", snapshot.reset_cooldown_secs));
    }
    lines.push(line);
}

fn home(snapshot: &Snapshot, lines: &mut Vec<String>) {
    let mut header = match &snapshot.user {
        Some(user) => format!(
            "== {} {} | {}",
            user.firstname,
            user.lastname,
            user.status.as_str()
        ),
        None => "== (profile loading)".to_owned(),
    };
    if snapshot.badge.show() {
        header.push_str(&format!(" | inbox {}", snapshot.badge.label()));
    }
    let realtime = match snapshot.realtime {
        RealtimeState::Closed => "closed",
        RealtimeState::Connecting => "connecting",
        RealtimeState::Open => "open",
    };
    lines.push(format!("{header} | realtime {realtime} =="));

    lines.push(format!("orders ({})", snapshot.orders.len()));
    lines.extend(snapshot.orders.iter().map(order_line));
    if let Some(error) = &snapshot.orders_error {
        lines.push(format!("! orders: {error}"));
    }

    lines.push(format!("threads ({})", snapshot.threads.len()));
    for thread in &snapshot.threads {
        let name = Peer::from_thread(thread).map(|p| p.name).unwrap_or_default();
        let mut line = format!("  {}  {name}", thread.id);
        let unread = thread.unread_for_rider();
        if unread > 0 {
            line.push_str(&format!("  {unread} unread"));
        }
        if !thread.last_message.is_empty() {
            line.push_str(&format!("  \"{}\"", thread.last_message));
        }
        lines.push(line);
    }
    if let Some(error) = &snapshot.inbox_error {
        lines.push(format!("! inbox: {error}"));
    }

    if !snapshot.payouts.is_empty() {
        lines.push(format!(
            "payouts ({})  net total {:.2}",
            snapshot.payouts.len(),
            snapshot.payouts_total
        ));
        for payout in &snapshot.payouts {
            let status = match payout.status {
                PayoutStatus::Pending => "pending",
                PayoutStatus::Paid => "paid",
            };
            lines.push(format!(
                "  {}  {:.2}  {status}  {}",
                payout.id, payout.net_amount, payout.date
            ));
        }
    }

    for qr in &snapshot.qr_codes {
        let method = match qr.method {
            QrMethod::Gcash => "gcash",
            QrMethod::Maya => "maya",
        };
        lines.push(format!("qr {method}: {}", qr.image_url));
    }
}

fn order_line(tracked: &TrackedOrder) -> String {
    let order = &tracked.order;
    let payment = match order.payment_status {
        PaymentStatus::Paid => "paid",
        PaymentStatus::Unpaid => "unpaid",
    };
    let control = match tracked.control() {
        Control::Enabled { label } => format!("[{label}]"),
        Control::Disabled { reason } => format!("({reason})"),
    };
    let mut line = format!(
        "  {}  {}  {}  {payment}  {:.2}  {control}",
        order.id, order.order_id, order.status_delivery, order.total_price
    );
    if tracked.evidence.proof.is_some() {
        line.push_str(" +proof");
    }
    if tracked.evidence.receipt.is_some() {
        line.push_str(" +receipt");
    }
    line
}

fn chat(conversation: &Conversation, lines: &mut Vec<String>) {
    let peer = conversation.peer();
    let title = peer.map_or("unknown", |p| p.name.as_str());
    lines.push(format!("== chat with {title} ({}) ==", conversation.thread()));

    for message in conversation.messages() {
        let sender = match peer {
            Some(p) if p.id == message.sender_id => p.name.as_str(),
            _ => "you",
        };
        let mut line = format!("  {sender}: {}", message.text);
        if !message.image_files.is_empty() {
            line.push_str(&format!(" [images: {}]", message.image_files.len()));
        }
        lines.push(line);
    }
    if let Some(error) = conversation.error() {
        lines.push(format!("! {error}"));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rider_core::{delivery::Evidence, inbox::Badge};
    use rider_harness::{SimEnv, fixtures};
    use rider_proto::{
        ThreadId,
        auth::LoginRejection,
        inbox::Role,
        order::{DeliveryStatus, PaymentStatus},
    };

    use super::*;

    fn tracked(id: &str, status: DeliveryStatus, payment: PaymentStatus) -> TrackedOrder {
        TrackedOrder {
            order: fixtures::order(id, status, payment),
            evidence: Evidence::default(),
            in_flight: false,
        }
    }

    #[test]
    fn loading_hides_everything() {
        assert_eq!(frame(&Snapshot::default()), "== starting ==");
    }

    #[test]
    fn login_shows_rejection_and_reset_progress() {
        let snapshot = Snapshot {
            phase: Phase::Anonymous,
            login_error: Some(LoginRejection::Password("Incorrect password".to_owned())),
            reset_stage: ResetStage::CodeSent,
            reset_cooldown_secs: 40,
            ..Snapshot::default()
        };

        insta::assert_snapshot!(frame(&snapshot), @r"
        == login ==
        ! Incorrect password
        password reset: enter the emailed code (verify <code>); resend in 40s
        ");
    }

    #[test]
    fn home_lists_orders_threads_and_payouts() {
        let now = SimEnv::new().now_utc();
        let snapshot = Snapshot {
            phase: Phase::Authenticated,
            screen: Screen::Home,
            user: Some(fixtures::rider_profile()),
            orders: vec![
                tracked("o1", DeliveryStatus::ReadyToDeliver, PaymentStatus::Unpaid),
                tracked("o2", DeliveryStatus::InTransit, PaymentStatus::Paid),
                tracked("o3", DeliveryStatus::Delivered, PaymentStatus::Paid),
            ],
            threads: vec![fixtures::thread("t1", "user-1", Role::User, 2, now)],
            badge: Badge::new(2),
            payouts: vec![fixtures::payout("p0", 120.0)],
            payouts_total: 120.0,
            realtime: RealtimeState::Open,
            ..Snapshot::default()
        };

        insta::assert_snapshot!(frame(&snapshot), @r"
        == Jo Reyes | offline | inbox 2 | realtime open ==
        orders (3)
          o1  ORD-o1  ready to deliver  unpaid  100.00  [Start delivery]
          o2  ORD-o2  in transit  paid  100.00  [Mark as delivered]
          o3  ORD-o3  delivered  paid  100.00  (order is already delivered)
        threads (1)
          t1  Ana Cruz  2 unread
        payouts (1)  net total 120.00
          p0  120.00  pending  2025-01-01
        ");
    }

    #[test]
    fn unpaid_order_waits_for_receipt() {
        let mut order = tracked("o2", DeliveryStatus::InTransit, PaymentStatus::Unpaid);
        assert_eq!(
            order_line(&order),
            "  o2  ORD-o2  in transit  unpaid  100.00  \
             (attach the payment receipt before completing an unpaid order)"
        );

        order.evidence.receipt = Some(rider_app::input::attachment("/tmp/receipt.jpg"));

        assert_eq!(
            order_line(&order),
            "  o2  ORD-o2  in transit  unpaid  100.00  [Mark as delivered] +receipt"
        );
    }

    #[test]
    fn conversation_names_the_sender() {
        let now = SimEnv::new().now_utc();
        let peer = Peer { id: "user-1".to_owned(), role: Role::User, name: "Ana Cruz".to_owned() };
        let mut conversation = Conversation::new(
            ThreadId::new("t1"),
            Some(peer),
            Some(fixtures::RIDER_ID.to_owned()),
        );
        conversation.replace(vec![
            fixtures::message("user-1", "where are you?", now),
            fixtures::message(fixtures::RIDER_ID, "two blocks away", now),
        ]);
        let snapshot = Snapshot {
            phase: Phase::Authenticated,
            screen: Screen::Conversation { thread: ThreadId::new("t1") },
            conversation: Some(conversation),
            ..Snapshot::default()
        };

        insta::assert_snapshot!(frame(&snapshot), @r"
        == chat with Ana Cruz (t1) ==
          Ana Cruz: where are you?
          you: two blocks away
        ");
    }

    #[test]
    fn notices_are_tagged() {
        let deleted = Notice::success("Payout records deleted");
        assert_eq!(notice(&deleted), "[ok] Payout records deleted");
        assert_eq!(notice(&Notice::error("not logged in")), "[error] not logged in");
    }
}
