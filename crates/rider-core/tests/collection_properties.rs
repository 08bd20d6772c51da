//! Property tests for the optimistic collections.
//!
//! Random sequences of refreshes, opens, deletes and rollbacks are applied to
//! an [`Inbox`] and an [`OrderBook`]. After every step the badge must equal
//! the number of unread threads, and every rollback must reproduce the exact
//! pre-mutation state.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use rider_core::{
    inbox::{Inbox, count_unread},
    orders::OrderBook,
};
use rider_proto::{
    OrderId, ThreadId,
    inbox::{InboxThread, UnreadCount},
    order::{Customer, DeliveryStatus, Order, PaymentStatus},
};

#[derive(Debug, Clone)]
enum InboxOp {
    Refresh(Vec<Option<u32>>),
    Open(usize),
    Delete(usize),
    DeleteAndRollback(usize),
}

fn inbox_op() -> impl Strategy<Value = InboxOp> {
    prop_oneof![
        prop::collection::vec(prop::option::of(0u32..5), 0..8).prop_map(InboxOp::Refresh),
        (0usize..8).prop_map(InboxOp::Open),
        (0usize..8).prop_map(InboxOp::Delete),
        (0usize..8).prop_map(InboxOp::DeleteAndRollback),
    ]
}

fn thread(index: usize, unread: Option<u32>) -> InboxThread {
    InboxThread {
        id: ThreadId::new(format!("t{index}")),
        participants: Vec::new(),
        last_message: String::new(),
        last_sender: None,
        updated_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        unread_count: UnreadCount { rider: unread },
    }
}

fn order(index: usize) -> Order {
    Order {
        id: OrderId::new(format!("o{index}")),
        order_id: format!("ORD-{index}"),
        user_id: String::new(),
        customer: Customer::default(),
        payment_status: PaymentStatus::Unpaid,
        status_delivery: DeliveryStatus::ReadyToDeliver,
        status_history: Vec::new(),
        rider: None,
        order_items: Vec::new(),
        total_price: 0.0,
    }
}

proptest! {
    #[test]
    fn badge_tracks_unread_threads(ops in prop::collection::vec(inbox_op(), 1..40)) {
        let mut inbox = Inbox::new();

        for op in ops {
            match op {
                InboxOp::Refresh(unread) => {
                    let threads = unread.into_iter().enumerate().map(|(i, u)| thread(i, u));
                    inbox.replace(threads.collect());
                },
                InboxOp::Open(i) => {
                    let before = inbox.badge().number();
                    let id = ThreadId::new(format!("t{i}"));
                    if let Ok(had_unread) = inbox.open_thread(&id) {
                        // Oracle: one thread read, badge drops by exactly one
                        let expected = if had_unread { before - 1 } else { before };
                        prop_assert_eq!(inbox.badge().number(), expected);
                    }
                },
                InboxOp::Delete(i) => {
                    let _ = inbox.remove(&ThreadId::new(format!("t{i}")));
                },
                InboxOp::DeleteAndRollback(i) => {
                    let before = inbox.threads().to_vec();
                    let badge = inbox.badge();
                    if let Ok(snapshot) = inbox.remove(&ThreadId::new(format!("t{i}"))) {
                        inbox.restore(snapshot);
                    }
                    prop_assert_eq!(inbox.threads(), before.as_slice());
                    prop_assert_eq!(inbox.badge(), badge);
                },
            }

            prop_assert_eq!(inbox.badge().number(), count_unread(inbox.threads()));
            prop_assert_eq!(inbox.badge().show(), inbox.badge().number() > 0);
        }
    }

    #[test]
    fn order_list_is_server_list_reversed(count in 0usize..20) {
        let server: Vec<Order> = (0..count).map(order).collect();
        let mut book = OrderBook::new();
        book.replace(server.clone());

        let local: Vec<&Order> = book.orders().iter().map(|t| &t.order).collect();
        let expected: Vec<&Order> = server.iter().rev().collect();
        prop_assert_eq!(local, expected);
    }

    #[test]
    fn failed_delete_restores_exact_list(
        count in 1usize..12,
        selection in prop::collection::vec(0usize..12, 1..6),
    ) {
        let mut book = OrderBook::new();
        book.replace((0..count).map(order).collect());
        let before = book.snapshot();

        let ids: Vec<OrderId> = selection.iter().map(|i| OrderId::new(format!("o{i}"))).collect();
        let snapshot = book.remove(&ids);
        prop_assert!(book.len() <= count);

        book.restore(snapshot);
        prop_assert_eq!(book.snapshot(), before);
    }
}
