//! Typed test data shared by the simulated backend and tests.

use chrono::{DateTime, Utc};
use rider_proto::{
    AccountId, OrderId, PayoutId, ThreadId,
    inbox::{Account, InboxThread, Message, Participant, Role, UnreadCount},
    order::{Customer, DeliveryStatus, Order, OrderItem, PaymentStatus, StatusEntry},
    payout::{EWallet, Payout, PayoutStatus},
    profile::{Availability, Profile},
};

/// Account id of the simulated rider.
pub const RIDER_ID: &str = "rider-1";
/// Login email of the simulated rider.
pub const RIDER_EMAIL: &str = "jo@example.com";
/// Login password of the simulated rider.
pub const RIDER_PASSWORD: &str = "secret123";
/// Account id of the support desk.
pub const SUPPORT_ID: &str = "admin-1";

/// The simulated rider's profile.
pub fn rider_profile() -> Profile {
    Profile {
        id: AccountId::new(RIDER_ID),
        image_file: None,
        firstname: "Jo".to_owned(),
        lastname: "Reyes".to_owned(),
        email: RIDER_EMAIL.to_owned(),
        contact: "09171234567".to_owned(),
        status: Availability::Offline,
        wallet: EWallet { kind: "GCash".to_owned(), number: "09171234567".to_owned() },
    }
}

/// History entry for reaching `status`.
pub fn history_entry(status: DeliveryStatus, photo: Option<String>) -> StatusEntry {
    let description = match status {
        DeliveryStatus::ReadyToDeliver => "Order packed and ready for pickup",
        DeliveryStatus::InTransit => "Rider picked up the order",
        DeliveryStatus::Delivered => "Order delivered",
    };
    StatusEntry {
        status,
        description: description.to_owned(),
        location: String::new(),
        date: "2025-01-01".to_owned(),
        timestamp: "08:00".to_owned(),
        photo,
    }
}

/// Order at `status` with a history covering every earlier stage.
pub fn order(id: &str, status: DeliveryStatus, payment: PaymentStatus) -> Order {
    let status_history = [DeliveryStatus::ReadyToDeliver, DeliveryStatus::InTransit, status]
        .into_iter()
        .filter(|s| s.stage() <= status.stage())
        .fold(Vec::new(), |mut history: Vec<StatusEntry>, s| {
            if history.last().is_none_or(|last| last.status != s) {
                history.push(history_entry(s, None));
            }
            history
        });

    Order {
        id: OrderId::new(id),
        order_id: format!("ORD-{id}"),
        user_id: format!("user-{id}"),
        customer: Customer {
            firstname: "Ana".to_owned(),
            lastname: "Cruz".to_owned(),
            email: "ana@example.com".to_owned(),
            contact: "09181234567".to_owned(),
            address: "12 Mabini St".to_owned(),
        },
        payment_status: payment,
        status_delivery: status,
        status_history,
        rider: Some(RIDER_ID.to_owned()),
        order_items: vec![OrderItem {
            image_file: None,
            prod_name: "Rice".to_owned(),
            prod_price: 50.0,
            prod_disc: String::new(),
            quantity: 2,
        }],
        total_price: 100.0,
    }
}

/// Thread between the rider and `counterpart`.
pub fn thread(
    id: &str,
    counterpart: &str,
    role: Role,
    unread: u32,
    updated_at: DateTime<Utc>,
) -> InboxThread {
    InboxThread {
        id: ThreadId::new(id),
        participants: vec![
            participant(RIDER_ID, Role::Rider, "Jo", "Reyes"),
            participant(counterpart, role, "Ana", "Cruz"),
        ],
        last_message: String::new(),
        last_sender: None,
        updated_at,
        unread_count: UnreadCount { rider: Some(unread) },
    }
}

fn participant(id: &str, role: Role, firstname: &str, lastname: &str) -> Participant {
    Participant {
        role,
        account_id: Some(Account {
            id: AccountId::new(id),
            firstname: firstname.to_owned(),
            lastname: lastname.to_owned(),
            email: String::new(),
        }),
    }
}

/// Chat message.
pub fn message(sender: &str, text: &str, created_at: DateTime<Utc>) -> Message {
    Message {
        sender_id: sender.to_owned(),
        text: text.to_owned(),
        image_files: Vec::new(),
        created_at,
        read_by: vec![sender.to_owned()],
    }
}

/// Pending payout of `net` after a 5% withholding.
pub fn payout(id: &str, net: f64) -> Payout {
    Payout {
        id: PayoutId::new(id),
        rider_name: "Jo Reyes".to_owned(),
        rider_email: RIDER_EMAIL.to_owned(),
        total_delivery: 10,
        total_amount: net / 0.95,
        net_amount: net,
        tax_amount: net / 0.95 - net,
        wallet: rider_profile().wallet,
        status: PayoutStatus::Pending,
        date: "2025-01-01".to_owned(),
        image_file: None,
    }
}
