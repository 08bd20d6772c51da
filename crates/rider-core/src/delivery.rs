//! Delivery status state machine.
//!
//! ```text
//!   ready to deliver ──(proof photo)──► in transit ──(paid | receipt)──► delivered
//! ```
//!
//! The lifecycle is linear with no back-transitions. Guards are checked on
//! the client before any request is issued:
//!
//! - pickup needs a proof photo; without one the rider is sent to the photo
//!   capture flow instead ([`Plan::CaptureProof`])
//! - completing an unpaid order needs a staged payment receipt
//! - at most one transition per order may be in flight

use rider_proto::{
    Attachment,
    order::{DeliveryStatus, Order, PaymentStatus},
};

use crate::error::TransitionBlocked;

/// Next stage, or `None` for the terminal state.
pub const fn successor(status: DeliveryStatus) -> Option<DeliveryStatus> {
    match status {
        DeliveryStatus::ReadyToDeliver => Some(DeliveryStatus::InTransit),
        DeliveryStatus::InTransit => Some(DeliveryStatus::Delivered),
        DeliveryStatus::Delivered => None,
    }
}

/// Locally staged images for the next transition. Never sent to the server
/// on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evidence {
    /// Proof photo taken with the device camera.
    pub proof: Option<Attachment>,
    /// Payment receipt picked from the gallery.
    pub receipt: Option<Attachment>,
}

impl Evidence {
    /// Nothing staged.
    pub fn is_empty(&self) -> bool {
        self.proof.is_none() && self.receipt.is_none()
    }
}

/// A transition that passed every guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Current stage.
    pub from: DeliveryStatus,
    /// Target stage.
    pub to: DeliveryStatus,
    /// Proof photo to upload.
    pub proof: Option<Attachment>,
    /// Receipt to upload.
    pub receipt: Option<Attachment>,
}

/// Outcome of planning the next transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    /// Send the transition to the server.
    Submit(Transition),
    /// Pickup without a photo: redirect to capture, issue nothing.
    CaptureProof,
}

/// Decide what advancing `order` means right now.
///
/// # Errors
///
/// - [`TransitionBlocked::InFlight`] while a transition is pending
/// - [`TransitionBlocked::AlreadyDelivered`] in the terminal state
/// - [`TransitionBlocked::ReceiptRequired`] for an unpaid order without a
///   staged receipt
pub fn plan_transition(
    order: &Order,
    evidence: &Evidence,
    in_flight: bool,
) -> Result<Plan, TransitionBlocked> {
    if in_flight {
        return Err(TransitionBlocked::InFlight);
    }
    let from = order.status_delivery;
    let to = successor(from).ok_or(TransitionBlocked::AlreadyDelivered)?;

    match to {
        DeliveryStatus::InTransit => match &evidence.proof {
            Some(proof) => Ok(Plan::Submit(Transition {
                from,
                to,
                proof: Some(proof.clone()),
                receipt: None,
            })),
            None => Ok(Plan::CaptureProof),
        },
        DeliveryStatus::Delivered => {
            if order.payment_status != PaymentStatus::Paid && evidence.receipt.is_none() {
                return Err(TransitionBlocked::ReceiptRequired);
            }
            Ok(Plan::Submit(Transition {
                from,
                to,
                proof: evidence.proof.clone(),
                receipt: evidence.receipt.clone(),
            }))
        },
        DeliveryStatus::ReadyToDeliver => Err(TransitionBlocked::AlreadyDelivered),
    }
}

/// State of the "advance" control for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Pressable, with its label.
    Enabled {
        /// Button label.
        label: &'static str,
    },
    /// Greyed out.
    Disabled {
        /// Why.
        reason: TransitionBlocked,
    },
}

impl Control {
    /// Whether the control accepts input.
    pub const fn is_enabled(self) -> bool {
        matches!(self, Self::Enabled { .. })
    }
}

/// Control state for advancing `order`. Agrees with [`plan_transition`]:
/// the control is disabled exactly when planning fails.
pub fn availability(order: &Order, evidence: &Evidence, in_flight: bool) -> Control {
    match plan_transition(order, evidence, in_flight) {
        Err(reason) => Control::Disabled { reason },
        Ok(Plan::CaptureProof) => Control::Enabled { label: "Start delivery" },
        Ok(Plan::Submit(t)) => match (t.to, t.proof.is_some()) {
            (DeliveryStatus::InTransit, _) => Control::Enabled { label: "Start delivery" },
            (_, true) => Control::Enabled { label: "Submit now" },
            (_, false) => Control::Enabled { label: "Mark as delivered" },
        },
    }
}

/// Notice shown after the server confirmed a transition.
pub const fn success_message(to: DeliveryStatus) -> &'static str {
    match to {
        DeliveryStatus::InTransit => "Order is now in transit",
        DeliveryStatus::Delivered => "Order delivered successfully",
        DeliveryStatus::ReadyToDeliver => "Order is ready to deliver",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rider_proto::{OrderId, order::Customer};

    use super::*;

    fn order(status: DeliveryStatus, payment: PaymentStatus) -> Order {
        Order {
            id: OrderId::new("o1"),
            order_id: "ORD-1".into(),
            user_id: "u1".into(),
            customer: Customer::default(),
            payment_status: payment,
            status_delivery: status,
            status_history: Vec::new(),
            rider: None,
            order_items: Vec::new(),
            total_price: 0.0,
        }
    }

    fn photo(name: &str) -> Attachment {
        Attachment::jpeg(format!("file:///{name}"), name)
    }

    #[test]
    fn pickup_without_proof_redirects_to_capture() {
        let order = order(DeliveryStatus::ReadyToDeliver, PaymentStatus::Unpaid);
        let plan = plan_transition(&order, &Evidence::default(), false).unwrap();
        assert_eq!(plan, Plan::CaptureProof);
    }

    #[test]
    fn pickup_with_proof_submits_photo_only() {
        let order = order(DeliveryStatus::ReadyToDeliver, PaymentStatus::Unpaid);
        let evidence = Evidence { proof: Some(photo("p.jpg")), receipt: Some(photo("r.jpg")) };

        let Plan::Submit(t) = plan_transition(&order, &evidence, false).unwrap() else {
            panic!("expected submit");
        };
        assert_eq!(t.to, DeliveryStatus::InTransit);
        assert!(t.proof.is_some());
        assert!(t.receipt.is_none());
    }

    #[test]
    fn unpaid_delivery_needs_receipt() {
        let order = order(DeliveryStatus::InTransit, PaymentStatus::Unpaid);
        assert_eq!(
            plan_transition(&order, &Evidence::default(), false),
            Err(TransitionBlocked::ReceiptRequired)
        );
        assert_eq!(
            availability(&order, &Evidence::default(), false),
            Control::Disabled { reason: TransitionBlocked::ReceiptRequired }
        );

        let evidence = Evidence { proof: None, receipt: Some(photo("r.jpg")) };
        assert!(availability(&order, &evidence, false).is_enabled());
    }

    #[test]
    fn paid_delivery_needs_nothing() {
        let order = order(DeliveryStatus::InTransit, PaymentStatus::Paid);
        assert_eq!(
            availability(&order, &Evidence::default(), false),
            Control::Enabled { label: "Mark as delivered" }
        );
    }

    #[test]
    fn terminal_and_in_flight_are_blocked() {
        let delivered = order(DeliveryStatus::Delivered, PaymentStatus::Paid);
        assert_eq!(
            plan_transition(&delivered, &Evidence::default(), false),
            Err(TransitionBlocked::AlreadyDelivered)
        );

        let ready = order(DeliveryStatus::ReadyToDeliver, PaymentStatus::Paid);
        let evidence = Evidence { proof: Some(photo("p.jpg")), receipt: None };
        assert_eq!(plan_transition(&ready, &evidence, true), Err(TransitionBlocked::InFlight));
    }

    #[test]
    fn successor_chain_ends() {
        assert_eq!(successor(DeliveryStatus::ReadyToDeliver), Some(DeliveryStatus::InTransit));
        assert_eq!(successor(DeliveryStatus::Delivered), None);
    }
}
