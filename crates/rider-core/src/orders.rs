//! The rider's order collection.
//!
//! [`OrderBook`] is the single writer of the local order list. It keeps the
//! list in presentation order (newest first, i.e. the server's ascending
//! array reversed), tracks per-order staged evidence and in-flight status
//! updates, and hands out snapshots so a failed optimistic delete can be
//! rolled back exactly.

use rider_proto::{
    Attachment, OrderId,
    order::{DeliveryStatus, Order, PaymentStatus, StatusEntry, StatusUpdateReply},
};

use crate::{
    delivery::{self, Control, Evidence, Plan},
    error::{LookupError, TransitionBlocked},
    sync::FetchGate,
};

/// An order plus local-only bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedOrder {
    /// Server state.
    pub order: Order,
    /// Images staged for the next transition.
    pub evidence: Evidence,
    /// A status update is pending.
    pub in_flight: bool,
}

impl TrackedOrder {
    fn new(order: Order) -> Self {
        Self { order, evidence: Evidence::default(), in_flight: false }
    }

    /// Control state for advancing this order.
    pub fn control(&self) -> Control {
        delivery::availability(&self.order, &self.evidence, self.in_flight)
    }
}

/// Order list as it was before an optimistic mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSnapshot(Vec<TrackedOrder>);

impl OrderSnapshot {
    /// Number of orders captured.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the snapshot holds no orders.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Local order collection.
#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    orders: Vec<TrackedOrder>,
    error: Option<String>,
    gate: FetchGate,
}

impl OrderBook {
    /// Empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Orders, newest first.
    pub fn orders(&self) -> &[TrackedOrder] {
        &self.orders
    }

    /// Number of orders.
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Whether there are no orders.
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Order by id.
    pub fn get(&self, id: &OrderId) -> Option<&TrackedOrder> {
        self.orders.iter().find(|t| &t.order.id == id)
    }

    fn get_mut(&mut self, id: &OrderId) -> Result<&mut TrackedOrder, LookupError> {
        self.orders
            .iter_mut()
            .find(|t| &t.order.id == id)
            .ok_or_else(|| LookupError::Order(id.clone()))
    }

    /// Inline error of the last failed fetch.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Record a fetch failure.
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    /// Single-flight guard for `fetchAll`.
    pub fn gate(&mut self) -> &mut FetchGate {
        &mut self.gate
    }

    /// Replace the collection with the server's list.
    ///
    /// The server returns orders oldest first; they are stored reversed.
    /// Staged evidence and in-flight flags of orders that still exist carry
    /// over unless the server reports them delivered. Clears the inline
    /// error.
    pub fn replace(&mut self, server_orders: Vec<Order>) {
        let mut previous = std::mem::take(&mut self.orders);
        self.orders = server_orders
            .into_iter()
            .rev()
            .map(|order| {
                let mut tracked = TrackedOrder::new(order);
                if let Some(pos) = previous.iter().position(|p| p.order.id == tracked.order.id) {
                    let old = previous.swap_remove(pos);
                    if tracked.order.status_delivery != DeliveryStatus::Delivered {
                        tracked.evidence = old.evidence;
                        tracked.in_flight = old.in_flight;
                    }
                }
                tracked.order.status_history = merge_history(tracked.order.status_history);
                tracked
            })
            .collect();
        self.error = None;
    }

    /// Capture the current list.
    pub fn snapshot(&self) -> OrderSnapshot {
        OrderSnapshot(self.orders.clone())
    }

    /// Put back a captured list.
    pub fn restore(&mut self, snapshot: OrderSnapshot) {
        self.orders = snapshot.0;
    }

    /// Optimistically remove `ids`. Returns the pre-removal snapshot.
    pub fn remove(&mut self, ids: &[OrderId]) -> OrderSnapshot {
        let snapshot = self.snapshot();
        self.orders.retain(|t| !ids.contains(&t.order.id));
        snapshot
    }

    /// Stage a proof photo. No network call.
    ///
    /// # Errors
    ///
    /// [`AdvanceError::Unknown`] for unknown ids,
    /// [`TransitionBlocked::AlreadyDelivered`] for delivered orders.
    pub fn stage_proof(&mut self, id: &OrderId, photo: Attachment) -> Result<(), AdvanceError> {
        self.undelivered_mut(id)?.evidence.proof = Some(photo);
        Ok(())
    }

    /// Stage a payment receipt. No network call.
    ///
    /// # Errors
    ///
    /// Same as [`OrderBook::stage_proof`].
    pub fn stage_receipt(&mut self, id: &OrderId, receipt: Attachment) -> Result<(), AdvanceError> {
        self.undelivered_mut(id)?.evidence.receipt = Some(receipt);
        Ok(())
    }

    fn undelivered_mut(&mut self, id: &OrderId) -> Result<&mut TrackedOrder, AdvanceError> {
        let tracked = self.get_mut(id)?;
        if tracked.order.status_delivery == DeliveryStatus::Delivered {
            return Err(TransitionBlocked::AlreadyDelivered.into());
        }
        Ok(tracked)
    }

    /// Drop a staged receipt.
    ///
    /// # Errors
    ///
    /// [`LookupError::Order`] for unknown ids.
    pub fn clear_receipt(&mut self, id: &OrderId) -> Result<(), LookupError> {
        self.get_mut(id)?.evidence.receipt = None;
        Ok(())
    }

    /// Plan the next transition for `id`.
    ///
    /// # Errors
    ///
    /// [`AdvanceError::Unknown`] for unknown ids,
    /// [`AdvanceError::Blocked`] when a guard fails.
    pub fn plan(&self, id: &OrderId) -> Result<Plan, AdvanceError> {
        let tracked = self.get(id).ok_or_else(|| LookupError::Order(id.clone()))?;
        Ok(delivery::plan_transition(&tracked.order, &tracked.evidence, tracked.in_flight)?)
    }

    /// Mark a transition as pending.
    ///
    /// # Errors
    ///
    /// [`LookupError::Order`] for unknown ids.
    pub fn begin_transition(&mut self, id: &OrderId) -> Result<(), LookupError> {
        self.get_mut(id)?.in_flight = true;
        Ok(())
    }

    /// Apply a confirmed transition.
    ///
    /// Sets the new status, merges the server's history, takes the payment
    /// status from the reply (or `paid` on delivery when the reply omits it)
    /// and clears staged evidence: the proof after any transition, both
    /// proof and receipt on delivery.
    ///
    /// # Errors
    ///
    /// [`LookupError::Order`] if the order disappeared meanwhile.
    pub fn confirm_transition(
        &mut self,
        id: &OrderId,
        to: DeliveryStatus,
        reply: StatusUpdateReply,
    ) -> Result<(), LookupError> {
        let tracked = self.get_mut(id)?;
        tracked.in_flight = false;
        tracked.order.status_delivery = to;
        if !reply.status_history.is_empty() {
            tracked.order.status_history = merge_history(reply.status_history);
        }
        tracked.order.payment_status = match (reply.payment_status, to) {
            (Some(status), _) => status,
            (None, DeliveryStatus::Delivered) => PaymentStatus::Paid,
            (None, _) => tracked.order.payment_status,
        };
        tracked.evidence.proof = None;
        if to == DeliveryStatus::Delivered {
            tracked.evidence.receipt = None;
        }
        Ok(())
    }

    /// Clear the pending flag after a failed transition. Evidence stays
    /// staged so the rider can retry manually.
    pub fn abort_transition(&mut self, id: &OrderId) {
        if let Ok(tracked) = self.get_mut(id) {
            tracked.in_flight = false;
        }
    }

    /// Drop everything, e.g. on logout.
    pub fn clear(&mut self) {
        self.orders.clear();
        self.error = None;
        self.gate.reset();
    }
}

/// Failure to plan a transition.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AdvanceError {
    /// Order not in the collection.
    #[error(transparent)]
    Unknown(#[from] LookupError),

    /// Guard failed.
    #[error(transparent)]
    Blocked(#[from] TransitionBlocked),
}

/// Order a status history by delivery stage. Entries of the same stage keep
/// their server order.
pub fn merge_history(mut history: Vec<StatusEntry>) -> Vec<StatusEntry> {
    history.sort_by_key(|entry| entry.status.stage());
    history
}
