//! End-to-end scenarios through the production runtime.
//!
//! Each test runs the real `Runtime` against the simulated backend with the
//! standard invariants checked on every render.

#![allow(clippy::unwrap_used, clippy::panic)]

use std::time::Duration;

use rider_client::{
    ClientEvent, NEW_DELIVERY_NOTICE, NoticeLevel, RealtimeState, SESSION_EXPIRED_NOTICE, Screen,
    TokenStore,
};
use rider_core::{password_reset::ResetStage, session::Phase};
use rider_harness::{
    Fault, Link, RESET_CODE, Simulation,
    fixtures::{self, RIDER_EMAIL, RIDER_PASSWORD},
};
use rider_proto::{
    Attachment, OrderId, PayoutId, ThreadId,
    auth::LoginRejection,
    inbox::Role,
    order::{DeliveryStatus, PaymentStatus},
    profile::Availability,
};

fn photo(name: &str) -> Attachment {
    Attachment::jpeg(format!("file:///tmp/cam/{name}"), name)
}

fn last_notice(sim: &Simulation) -> (NoticeLevel, String) {
    let notice = sim.driver().notices().pop().unwrap();
    (notice.level, notice.message)
}

fn order_fetches(sim: &Simulation) -> usize {
    sim.backend(|b| b.request_names().iter().filter(|n| **n == "orders.fetch").count())
}

async fn logged_in(setup: impl FnOnce(&mut rider_harness::SimBackend)) -> Simulation {
    let mut sim = Simulation::new();
    sim.backend(setup);
    sim.start().await.unwrap();
    sim.login().await.unwrap();
    sim
}

#[tokio::test]
async fn login_pickup_and_delivery() {
    let mut sim = logged_in(|b| {
        b.seed_order(fixtures::order("o1", DeliveryStatus::ReadyToDeliver, PaymentStatus::Unpaid));
    })
    .await;
    let id = OrderId::new("o1");

    let names = sim.backend(|b| b.request_names());
    insta::assert_debug_snapshot!(names, @r#"
    [
        "auth.login",
        "orders.fetch",
        "inbox.fetch",
        "profile.fetch",
    ]
    "#);
    assert_eq!(sim.screen(), &Screen::Home);
    assert!(sim.store().load().unwrap().is_some());
    assert_eq!(sim.frame().realtime, RealtimeState::Open);

    // Pickup without a photo opens the camera
    sim.act(ClientEvent::AdvanceOrder { order: id.clone() }).await.unwrap();
    assert_eq!(sim.screen(), &Screen::PhotoCapture { order: id.clone() });
    assert!(!sim.backend(|b| b.request_names()).contains(&"orders.update_status"));

    sim.act(ClientEvent::StageProof { order: id.clone(), photo: photo("p.jpg") }).await.unwrap();
    sim.act(ClientEvent::AdvanceOrder { order: id.clone() }).await.unwrap();
    assert_eq!(last_notice(&sim), (NoticeLevel::Success, "Order is now in transit".into()));
    let stored = sim.backend(|b| b.order(&id).cloned()).unwrap();
    assert_eq!(stored.status_delivery, DeliveryStatus::InTransit);
    assert!(stored.status_history.last().unwrap().photo.as_deref().unwrap().ends_with("p.jpg"));

    // Unpaid: the receipt guard refuses before any request goes out
    let before = sim.backend(|b| b.log().len());
    sim.act(ClientEvent::AdvanceOrder { order: id.clone() }).await.unwrap();
    assert_eq!(last_notice(&sim).0, NoticeLevel::Error);
    assert_eq!(sim.backend(|b| b.log().len()), before);

    sim.act(ClientEvent::StageReceipt { order: id.clone(), receipt: photo("r.jpg") })
        .await
        .unwrap();
    sim.act(ClientEvent::AdvanceOrder { order: id.clone() }).await.unwrap();
    assert_eq!(last_notice(&sim), (NoticeLevel::Success, "Order delivered successfully".into()));

    let frame = sim.frame();
    let tracked = &frame.orders[0];
    assert_eq!(tracked.order.status_delivery, DeliveryStatus::Delivered);
    assert_eq!(tracked.order.payment_status, PaymentStatus::Paid);
    assert!(tracked.evidence.is_empty());
    assert_eq!(frame.actionable_orders(), 0);
}

#[tokio::test]
async fn rejected_logins_explain_themselves() {
    let mut sim = Simulation::new();
    sim.start().await.unwrap();

    let wrong_password = ClientEvent::Login {
        email: RIDER_EMAIL.to_owned(),
        password: "nope-nope".to_owned(),
    };
    sim.act(wrong_password).await.unwrap();
    assert!(matches!(sim.frame().login_error, Some(LoginRejection::Password(_))));
    assert_eq!(sim.frame().phase, Phase::Anonymous);

    sim.backend(|b| b.set_verification_pending(true));
    sim.login().await.unwrap();
    assert!(matches!(sim.frame().login_error, Some(LoginRejection::Verification { .. })));
    assert!(sim.store().load().unwrap().is_none());

    sim.backend(|b| b.set_verification_pending(false));
    sim.login().await.unwrap();
    assert_eq!(sim.frame().login_error, None);
    assert_eq!(sim.frame().phase, Phase::Authenticated);
}

#[tokio::test]
async fn expired_token_forces_logout() {
    let mut sim = logged_in(|b| {
        b.seed_order(fixtures::order("o1", DeliveryStatus::InTransit, PaymentStatus::Paid));
    })
    .await;
    assert_eq!(sim.frame().orders.len(), 1);

    sim.backend(rider_harness::SimBackend::expire_sessions);
    sim.act(ClientEvent::RefreshOrders).await.unwrap();

    let frame = sim.frame();
    assert_eq!(frame.phase, Phase::Anonymous);
    assert!(frame.orders.is_empty());
    assert_eq!(sim.screen(), &Screen::Login);
    assert_eq!(last_notice(&sim), (NoticeLevel::Error, SESSION_EXPIRED_NOTICE.into()));
    assert_eq!(sim.store().load().unwrap(), None);
    assert_eq!(sim.driver().link(), Link::Down);

    // Authenticated intents now bounce to the login screen
    sim.act(ClientEvent::RefreshPayouts).await.unwrap();
    assert_eq!(last_notice(&sim).1, "not logged in");
    assert_eq!(sim.backend(|b| b.log().last().unwrap().endpoint), "orders.fetch");
}

#[tokio::test]
async fn dropped_realtime_reconnects_with_backoff_and_resyncs() {
    let mut sim = logged_in(|_| {}).await;
    let start = sim.env().now_ms();
    let requests_before = sim.backend(|b| b.log().len());

    sim.driver().refuse_connects(2);
    sim.driver().drop_link("transport close");
    sim.settle().await.unwrap();

    let secs: Vec<_> = sim.driver().dial_log().iter().map(Duration::as_secs).collect();
    assert_eq!(secs, [0, 1, 2, 4]);
    assert_eq!(sim.env().now_ms() - start, 7_000);
    assert_eq!(sim.frame().realtime, RealtimeState::Open);

    // Missed signals are covered by a refetch after reconnecting
    let names = sim.backend(|b| b.request_names());
    assert_eq!(names[requests_before..], ["orders.fetch", "inbox.fetch"]);
}

#[tokio::test]
async fn assignment_over_realtime_refreshes_orders() {
    let mut sim = logged_in(|_| {}).await;
    assert!(sim.frame().orders.is_empty());

    sim.backend(|b| {
        b.assign_order(fixtures::order("o9", DeliveryStatus::ReadyToDeliver, PaymentStatus::Paid));
    });
    sim.settle().await.unwrap();

    assert_eq!(sim.frame().orders.len(), 1);
    assert_eq!(last_notice(&sim), (NoticeLevel::Info, NEW_DELIVERY_NOTICE.into()));
}

#[tokio::test]
async fn chat_marks_read_and_follows_new_messages() {
    let thread = ThreadId::new("t1");
    let mut sim = logged_in(|b| {
        let now = chrono::DateTime::UNIX_EPOCH;
        b.seed_thread(fixtures::thread("t1", "user-9", Role::User, 0, now));
        b.seed_thread(fixtures::thread("t2", "user-8", Role::User, 0, now));
        b.customer_writes(&ThreadId::new("t1"), "where are you?");
        b.customer_writes(&ThreadId::new("t1"), "hello?");
    })
    .await;
    assert_eq!(sim.frame().badge.number(), 1);

    sim.act(ClientEvent::OpenThread { thread: thread.clone() }).await.unwrap();
    let frame = sim.frame();
    assert_eq!(frame.badge.number(), 0);
    assert_eq!(frame.conversation.as_ref().unwrap().messages().len(), 2);
    assert_eq!(sim.screen(), &Screen::Conversation { thread: thread.clone() });
    assert_eq!(sim.backend(|b| b.threads()[0].unread_for_rider()), 0);

    sim.act(ClientEvent::SendMessage { text: "on my way".into(), images: Vec::new() })
        .await
        .unwrap();
    let frame = sim.frame();
    let messages = frame.conversation.as_ref().unwrap().messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages.last().unwrap().text, "on my way");

    // An incoming message lands in the open conversation and is marked read
    sim.backend(|b| b.customer_writes(&ThreadId::new("t1"), "thanks"));
    sim.settle().await.unwrap();
    assert_eq!(sim.frame().conversation.unwrap().messages().len(), 4);
    assert_eq!(sim.backend(|b| b.threads()[0].unread_for_rider()), 0);

    sim.act(ClientEvent::CloseConversation).await.unwrap();
    assert!(sim.frame().conversation.is_none());
}

#[tokio::test]
async fn support_chat_is_created_on_demand() {
    let mut sim = logged_in(|_| {}).await;

    let peer = rider_core::chat::Peer::support();
    sim.act(ClientEvent::StartChat { peer }).await.unwrap();
    let Screen::Conversation { thread } = sim.screen().clone() else {
        panic!("expected conversation screen, got {:?}", sim.screen());
    };

    sim.act(ClientEvent::SendMessage { text: "app keeps crashing".into(), images: Vec::new() })
        .await
        .unwrap();
    assert_eq!(sim.backend(|b| b.messages(&thread).len()), 1);
    assert_eq!(sim.frame().conversation.unwrap().messages().len(), 1);
}

#[tokio::test]
async fn failed_deletes_roll_back() {
    let mut sim = logged_in(|b| {
        b.seed_order(fixtures::order("o1", DeliveryStatus::Delivered, PaymentStatus::Paid));
        b.seed_order(fixtures::order("o2", DeliveryStatus::Delivered, PaymentStatus::Paid));
        let now = chrono::DateTime::UNIX_EPOCH;
        b.seed_thread(fixtures::thread("t1", "user-9", Role::User, 2, now));
        b.fail_next("orders.delete", Fault::Status(500, "database unavailable".into()));
        b.fail_next("inbox.delete", Fault::Network);
    })
    .await;
    let before = sim.frame();

    sim.act(ClientEvent::DeleteOrders(vec![OrderId::new("o1")])).await.unwrap();
    assert_eq!(last_notice(&sim), (NoticeLevel::Error, "database unavailable".into()));
    assert_eq!(sim.frame().orders, before.orders);

    sim.act(ClientEvent::DeleteThread { thread: ThreadId::new("t1") }).await.unwrap();
    assert_eq!(sim.frame().threads, before.threads);
    assert_eq!(sim.frame().badge.number(), 1);

    // Without faults the deletes stick
    sim.act(ClientEvent::DeleteOrders(vec![OrderId::new("o1")])).await.unwrap();
    sim.act(ClientEvent::DeleteThread { thread: ThreadId::new("t1") }).await.unwrap();
    assert_eq!(sim.frame().orders.len(), 1);
    assert!(sim.frame().threads.is_empty());
    assert_eq!(sim.backend(|b| b.orders().len()), 1);
}

#[tokio::test]
async fn garbled_status_reply_resyncs_orders() {
    let mut sim = logged_in(|b| {
        b.seed_order(fixtures::order("o1", DeliveryStatus::ReadyToDeliver, PaymentStatus::Paid));
        b.fail_next("orders.update_status", Fault::Garbage);
    })
    .await;
    let id = OrderId::new("o1");

    sim.act(ClientEvent::StageProof { order: id.clone(), photo: photo("p.jpg") }).await.unwrap();
    let fetches_before = order_fetches(&sim);
    sim.act(ClientEvent::AdvanceOrder { order: id.clone() }).await.unwrap();

    assert_eq!(last_notice(&sim).0, NoticeLevel::Error);
    assert_eq!(order_fetches(&sim), fetches_before + 1);
    let frame = sim.frame();
    assert!(!frame.orders[0].in_flight);
    assert!(frame.orders[0].evidence.proof.is_some(), "proof stays staged for a retry");
}

#[tokio::test]
async fn availability_toggle_rolls_back_on_failure() {
    let mut sim = logged_in(|b| b.fail_next("profile.availability", Fault::Network)).await;

    sim.act(ClientEvent::SetAvailability(Availability::Available)).await.unwrap();
    assert_eq!(sim.frame().user.unwrap().status, Availability::Offline);
    assert_eq!(last_notice(&sim).0, NoticeLevel::Error);

    sim.act(ClientEvent::SetAvailability(Availability::Available)).await.unwrap();
    assert_eq!(sim.frame().user.unwrap().status, Availability::Available);
    assert_eq!(sim.backend(|b| b.profile().status), Availability::Available);
}

#[tokio::test]
async fn payouts_and_qr_codes() {
    let mut sim = logged_in(|b| {
        b.seed_payout(fixtures::payout("p1", 100.0));
        b.seed_payout(fixtures::payout("p2", 50.5));
    })
    .await;

    sim.act(ClientEvent::RefreshPayouts).await.unwrap();
    assert!((sim.frame().payouts_total - 150.5).abs() < f64::EPSILON);

    sim.act(ClientEvent::DeletePayouts(vec![PayoutId::new("p1")])).await.unwrap();
    assert_eq!(last_notice(&sim), (NoticeLevel::Success, "Payout records deleted".into()));
    assert_eq!(sim.frame().payouts.len(), 1);
    assert_eq!(sim.backend(|b| b.payouts().len()), 1);

    sim.act(ClientEvent::LoadQrCodes).await.unwrap();
    assert_eq!(sim.frame().qr_codes.len(), 1);
}

#[tokio::test]
async fn profile_edit_round_trips() {
    let mut sim = logged_in(|_| {}).await;
    let mut update = rider_proto::profile::ProfileUpdate {
        image: Some(photo("me.jpg")),
        firstname: "Joanna".into(),
        lastname: "Reyes".into(),
        email: RIDER_EMAIL.into(),
        contact: "09170000000".into(),
        wallet_number: "09170000000".into(),
        wallet_type: "Maya".into(),
    };

    sim.act(ClientEvent::UpdateProfile(update.clone())).await.unwrap();
    let user = sim.frame().user.unwrap();
    assert_eq!(user.firstname, "Joanna");
    assert_eq!(user.wallet.kind, "Maya");
    assert!(user.image_file.unwrap().ends_with("me.jpg"));

    // Blank required field never reaches the backend
    update.lastname = "  ".into();
    let before = sim.backend(|b| b.log().len());
    sim.act(ClientEvent::UpdateProfile(update)).await.unwrap();
    assert_eq!(last_notice(&sim), (NoticeLevel::Error, "lastname is required".into()));
    assert_eq!(sim.backend(|b| b.log().len()), before);
}

#[tokio::test]
async fn password_reset_with_cooldown() {
    let mut sim = Simulation::new();
    sim.start().await.unwrap();
    let request = || ClientEvent::RequestResetCode { email: RIDER_EMAIL.to_owned() };

    sim.act(request()).await.unwrap();
    assert_eq!(sim.frame().reset_stage, ResetStage::CodeSent);
    assert_eq!(sim.frame().reset_cooldown_secs, 60);

    sim.env().advance(Duration::from_secs(20));
    sim.act(request()).await.unwrap();
    assert_eq!(
        last_notice(&sim),
        (NoticeLevel::Error, "please wait 40s before requesting another code".into())
    );
    assert_eq!(sim.backend(|b| b.request_names()), ["auth.forgot_password"]);

    sim.act(ClientEvent::VerifyResetCode { code: "000000".into() }).await.unwrap();
    assert_eq!(last_notice(&sim), (NoticeLevel::Error, "Invalid verification code".into()));
    assert_eq!(sim.frame().reset_stage, ResetStage::CodeSent);

    sim.act(ClientEvent::VerifyResetCode { code: RESET_CODE.into() }).await.unwrap();
    assert_eq!(sim.frame().reset_stage, ResetStage::Verified);

    let change = ClientEvent::ChangePassword {
        new_password: "fresh-pass".into(),
        confirm_password: "fresh-pass".into(),
    };
    sim.act(change).await.unwrap();
    assert_eq!(sim.frame().reset_stage, ResetStage::Done);
    assert_eq!(sim.screen(), &Screen::Login);
    assert!(sim.backend(|b| b.password_is("fresh-pass")));

    // Old password is gone, new one works
    sim.login().await.unwrap();
    assert!(matches!(sim.frame().login_error, Some(LoginRejection::Password(_))));
    let login = ClientEvent::Login { email: RIDER_EMAIL.into(), password: "fresh-pass".into() };
    sim.act(login).await.unwrap();
    assert_eq!(sim.frame().phase, Phase::Authenticated);
    assert!(!sim.backend(|b| b.password_is(RIDER_PASSWORD)));
}

#[tokio::test]
async fn restart_restores_session_from_store() {
    let mut sim = Simulation::new();
    sim.remember_session().unwrap();
    sim.start().await.unwrap();

    assert_eq!(sim.frame().phase, Phase::Authenticated);
    assert!(sim.backend(|b| b.log().iter().all(|r| r.authorized)));

    sim.act(ClientEvent::Logout).await.unwrap();
    assert_eq!(sim.store().load().unwrap(), None);
    assert_eq!(sim.screen(), &Screen::Login);
    assert_eq!(sim.frame().phase, Phase::Anonymous);
}
