//! Payout payloads.

use serde::{Deserialize, Serialize};

use crate::ids::PayoutId;

/// Settlement state of a payout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayoutStatus {
    /// Transferred to the rider's wallet.
    Paid,
    /// Awaiting transfer. Unknown states land here too.
    #[default]
    #[serde(other)]
    Pending,
}

/// E-wallet account a payout is sent to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EWallet {
    /// Provider name, e.g. `"GCash"`.
    #[serde(default, rename = "type")]
    pub kind: String,
    /// Wallet number.
    #[serde(default)]
    pub number: String,
}

/// One payout record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payout {
    /// Payout id.
    #[serde(rename = "_id")]
    pub id: PayoutId,
    /// Rider display name at payout time.
    #[serde(default)]
    pub rider_name: String,
    /// Rider email at payout time.
    #[serde(default)]
    pub rider_email: String,
    /// Deliveries covered by this payout.
    #[serde(default)]
    pub total_delivery: u32,
    /// Gross amount.
    #[serde(default)]
    pub total_amount: f64,
    /// Amount after tax.
    #[serde(default)]
    pub net_amount: f64,
    /// Withheld tax.
    #[serde(default)]
    pub tax_amount: f64,
    /// Destination wallet.
    #[serde(default, rename = "e_WalletAcc")]
    pub wallet: EWallet,
    /// Settlement state.
    #[serde(default)]
    pub status: PayoutStatus,
    /// Display date as formatted by the backend.
    #[serde(default)]
    pub date: String,
    /// Transfer screenshot, present once paid.
    #[serde(default)]
    pub image_file: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_payout_with_wallet() {
        let json = r#"{
            "_id": "p1",
            "riderName": "Jo Reyes",
            "totalDelivery": 12,
            "totalAmount": 1200,
            "netAmount": 1140,
            "taxAmount": 60,
            "e_WalletAcc": {"type": "GCash", "number": "0917"},
            "status": "paid",
            "date": "Mar 2"
        }"#;

        let payout: Payout = serde_json::from_str(json).unwrap();
        assert_eq!(payout.wallet.kind, "GCash");
        assert_eq!(payout.status, PayoutStatus::Paid);
        assert!(payout.image_file.is_none());
    }

    #[test]
    fn unknown_payout_status_is_pending() {
        let json = r#"{"_id": "p2", "status": "processing"}"#;

        let payout: Payout = serde_json::from_str(json).unwrap();
        assert_eq!(payout.status, PayoutStatus::Pending);
        assert_eq!(payout.net_amount, 0.0);
    }
}
