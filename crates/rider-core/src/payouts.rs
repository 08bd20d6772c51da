//! Payout history.
//!
//! Unlike orders and threads, payout deletion is not optimistic: records are
//! removed locally only after the server confirmed the delete.

use rider_proto::{PayoutId, payout::Payout};

/// The rider's payouts, newest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PayoutLedger {
    payouts: Vec<Payout>,
    error: Option<String>,
}

impl PayoutLedger {
    /// Empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Payouts, newest first.
    pub fn payouts(&self) -> &[Payout] {
        &self.payouts
    }

    /// Inline error of the last failed fetch.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Record a fetch failure.
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    /// Replace with the server's list, reversed.
    pub fn replace(&mut self, server_payouts: Vec<Payout>) {
        self.payouts = server_payouts.into_iter().rev().collect();
        self.error = None;
    }

    /// Remove confirmed deletions.
    pub fn remove(&mut self, ids: &[PayoutId]) {
        self.payouts.retain(|p| !ids.contains(&p.id));
    }

    /// Sum of net amounts.
    pub fn total_net(&self) -> f64 {
        self.payouts.iter().map(|p| p.net_amount).sum()
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.payouts.clear();
        self.error = None;
    }
}
