//! Standard invariant checks.
//!
//! These invariants capture behavioral properties that must always hold.
//! They verify WHAT must be true, not specific test scenarios.

use std::collections::HashSet;

use rider_app::Snapshot;
use rider_core::session::Phase;
use rider_proto::order::DeliveryStatus;

use super::{Invariant, InvariantResult};

/// The unread badge equals the number of threads with unread messages.
///
/// Counting messages instead of threads, or forgetting to decrement when a
/// thread is opened, makes the badge drift from the list it summarizes.
pub struct BadgeMatchesUnreadThreads;

impl Invariant for BadgeMatchesUnreadThreads {
    fn name(&self) -> &'static str {
        "BadgeMatchesUnreadThreads"
    }

    fn check(&self, state: &Snapshot) -> InvariantResult {
        let unread = state.threads.iter().filter(|t| t.has_unread()).count() as u32;
        if state.badge.number() != unread {
            return Err(self.violation(format!(
                "badge shows {} but {unread} of {} threads are unread",
                state.badge.number(),
                state.threads.len()
            )));
        }
        Ok(())
    }
}

/// Delivery history only moves forward and never runs ahead of the current
/// status.
pub struct StatusHistoryMonotonic;

impl Invariant for StatusHistoryMonotonic {
    fn name(&self) -> &'static str {
        "StatusHistoryMonotonic"
    }

    fn check(&self, state: &Snapshot) -> InvariantResult {
        for tracked in &state.orders {
            let order = &tracked.order;
            for pair in order.status_history.windows(2) {
                if pair[1].status.stage() < pair[0].status.stage() {
                    return Err(self.violation(format!(
                        "order {}: history goes {} → {}",
                        order.id, pair[0].status, pair[1].status
                    )));
                }
            }
            if let Some(last) = order.status_history.last()
                && last.status.stage() > order.status_delivery.stage()
            {
                return Err(self.violation(format!(
                    "order {}: status {} but history already reached {}",
                    order.id, order.status_delivery, last.status
                )));
            }
        }
        Ok(())
    }
}

/// A delivered order holds no staged images and no pending update.
pub struct EvidenceClearedOnDelivery;

impl Invariant for EvidenceClearedOnDelivery {
    fn name(&self) -> &'static str {
        "EvidenceClearedOnDelivery"
    }

    fn check(&self, state: &Snapshot) -> InvariantResult {
        let stale = state.orders.iter().find(|t| {
            t.order.status_delivery == DeliveryStatus::Delivered
                && (!t.evidence.is_empty() || t.in_flight)
        });
        match stale {
            Some(t) => Err(self.violation(format!(
                "delivered order {} still has evidence {:?} (in flight: {})",
                t.order.id, t.evidence, t.in_flight
            ))),
            None => Ok(()),
        }
    }
}

/// Without a session no rider data is held.
pub struct LoggedOutIsEmpty;

impl Invariant for LoggedOutIsEmpty {
    fn name(&self) -> &'static str {
        "LoggedOutIsEmpty"
    }

    fn check(&self, state: &Snapshot) -> InvariantResult {
        if state.phase == Phase::Authenticated {
            return Ok(());
        }
        let leftovers = [
            ("orders", !state.orders.is_empty()),
            ("threads", !state.threads.is_empty()),
            ("badge", state.badge.show()),
            ("conversation", state.conversation.is_some()),
            ("payouts", !state.payouts.is_empty()),
            ("qr codes", !state.qr_codes.is_empty()),
            ("user", state.user.is_some()),
        ];
        let held: Vec<_> = leftovers.iter().filter(|(_, held)| *held).map(|(n, _)| *n).collect();
        if held.is_empty() {
            Ok(())
        } else {
            Err(self.violation(format!("{:?} session still holds {held:?}", state.phase)))
        }
    }
}

/// No order appears twice in the list.
pub struct OrderIdsUnique;

impl Invariant for OrderIdsUnique {
    fn name(&self) -> &'static str {
        "OrderIdsUnique"
    }

    fn check(&self, state: &Snapshot) -> InvariantResult {
        let mut seen = HashSet::new();
        for tracked in &state.orders {
            if !seen.insert(&tracked.order.id) {
                return Err(self.violation(format!("order {} listed twice", tracked.order.id)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rider_core::{inbox::Badge, orders::OrderBook};
    use rider_proto::{Attachment, inbox::Role, order::PaymentStatus};

    use super::*;
    use crate::{SimEnv, fixtures};

    fn authenticated() -> Snapshot {
        Snapshot { phase: Phase::Authenticated, ..Snapshot::default() }
    }

    #[test]
    fn badge_counts_threads_not_messages() {
        let now = SimEnv::new().now_utc();
        let mut state = authenticated();
        state.threads = vec![
            fixtures::thread("t1", "u1", Role::User, 3, now),
            fixtures::thread("t2", "u2", Role::User, 0, now),
        ];

        state.badge = Badge::new(1);
        assert!(BadgeMatchesUnreadThreads.check(&state).is_ok());

        state.badge = Badge::new(3);
        let violation = BadgeMatchesUnreadThreads.check(&state).unwrap_err();
        assert_eq!(violation.invariant, "BadgeMatchesUnreadThreads");
    }

    #[test]
    fn history_cannot_run_ahead_of_status() {
        let mut order = fixtures::order("o1", DeliveryStatus::InTransit, PaymentStatus::Unpaid);
        order.status_delivery = DeliveryStatus::ReadyToDeliver;
        let mut book = OrderBook::new();
        book.replace(vec![order]);

        let state = Snapshot { orders: book.orders().to_vec(), ..authenticated() };
        assert!(StatusHistoryMonotonic.check(&state).is_err());
    }

    #[test]
    fn delivered_order_with_staged_receipt_is_flagged() {
        let mut book = OrderBook::new();
        book.replace(vec![fixtures::order("o1", DeliveryStatus::Delivered, PaymentStatus::Paid)]);
        let mut orders = book.orders().to_vec();
        orders[0].evidence.receipt = Some(Attachment::jpeg("file:///r.jpg", "r.jpg"));

        let state = Snapshot { orders, ..authenticated() };
        assert!(EvidenceClearedOnDelivery.check(&state).is_err());
    }

    #[test]
    fn anonymous_session_with_data_is_flagged() {
        let mut book = OrderBook::new();
        book.replace(vec![fixtures::order("o1", DeliveryStatus::Delivered, PaymentStatus::Paid)]);
        let state = Snapshot {
            phase: Phase::Anonymous,
            orders: book.orders().to_vec(),
            ..Snapshot::default()
        };

        let violation = LoggedOutIsEmpty.check(&state).unwrap_err();
        assert!(violation.message.contains("orders"), "{violation}");
        assert!(LoggedOutIsEmpty.check(&authenticated()).is_ok());
    }
}
