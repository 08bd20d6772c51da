//! Delivery order payloads.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::OrderId;

/// Delivery lifecycle stage of an order.
///
/// The wire representation uses the backend's human-readable strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeliveryStatus {
    /// Assigned to the rider, not yet picked up.
    #[serde(rename = "ready to deliver")]
    ReadyToDeliver,
    /// Picked up and on the way.
    #[serde(rename = "in transit")]
    InTransit,
    /// Handed over to the buyer. Terminal.
    #[serde(rename = "delivered")]
    Delivered,
}

impl DeliveryStatus {
    /// Position in the delivery lifecycle, starting at 0.
    pub const fn stage(self) -> u8 {
        match self {
            Self::ReadyToDeliver => 0,
            Self::InTransit => 1,
            Self::Delivered => 2,
        }
    }

    /// Wire string for this status.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReadyToDeliver => "ready to deliver",
            Self::InTransit => "in transit",
            Self::Delivered => "delivered",
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment state of an order.
///
/// Anything the backend sends other than `"paid"` is treated as unpaid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Paid in full.
    Paid,
    /// Not paid yet (cash on delivery or pending e-wallet transfer).
    #[default]
    #[serde(other)]
    Unpaid,
}

/// One entry of an order's status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    /// Stage reached.
    pub status: DeliveryStatus,
    /// Human description of the event.
    #[serde(default)]
    pub description: String,
    /// Free-form location text.
    #[serde(default)]
    pub location: String,
    /// Display date as formatted by the backend.
    #[serde(default)]
    pub date: String,
    /// Display time as formatted by the backend.
    #[serde(default)]
    pub timestamp: String,
    /// Photo uploaded with the transition, if any.
    #[serde(default, rename = "imageFile", skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

/// Line item of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    /// Product image URL.
    #[serde(default)]
    pub image_file: Option<String>,
    /// Product name.
    pub prod_name: String,
    /// Unit price.
    #[serde(default)]
    pub prod_price: f64,
    /// Product description or discount note.
    #[serde(default)]
    pub prod_disc: String,
    /// Quantity ordered.
    #[serde(default)]
    pub quantity: u32,
}

/// Buyer contact details carried inline on an order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Given name.
    #[serde(default)]
    pub firstname: String,
    /// Family name.
    #[serde(default)]
    pub lastname: String,
    /// Email address.
    #[serde(default)]
    pub email: String,
    /// Phone number.
    #[serde(default)]
    pub contact: String,
    /// Delivery address.
    #[serde(default)]
    pub address: String,
}

impl Customer {
    /// `"firstname lastname"`, trimmed.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname).trim().to_owned()
    }
}

/// A delivery order assigned to the rider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Database id.
    #[serde(rename = "_id")]
    pub id: OrderId,
    /// Human-facing order number.
    pub order_id: String,
    /// Buyer account id.
    #[serde(default)]
    pub user_id: String,
    /// Buyer contact details.
    #[serde(flatten)]
    pub customer: Customer,
    /// Payment state.
    #[serde(default)]
    pub payment_status: PaymentStatus,
    /// Current lifecycle stage.
    pub status_delivery: DeliveryStatus,
    /// Lifecycle log, oldest first.
    #[serde(default)]
    pub status_history: Vec<StatusEntry>,
    /// Assigned rider id.
    #[serde(default)]
    pub rider: Option<String>,
    /// Line items.
    #[serde(default)]
    pub order_items: Vec<OrderItem>,
    /// Order total.
    #[serde(default)]
    pub total_price: f64,
}

/// Reply to a delivery status update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateReply {
    /// Authoritative status history after the transition.
    #[serde(default)]
    pub status_history: Vec<StatusEntry>,
    /// Payment state if the backend changed it as a side effect.
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
}

/// Body of the bulk delete endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteItems<T> {
    /// Ids to delete.
    pub items: Vec<T>,
}
