//! REST endpoint catalogue.
//!
//! [`Endpoint`] names every backend call the rider client makes, together
//! with the data it carries. The transport turns an endpoint into an HTTP
//! request through [`Endpoint::method`], [`Endpoint::url`] and
//! [`Endpoint::body`]; the state machines never see URLs or encodings.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::{
    auth::{ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, VerifyCodeRequest},
    error::Result,
    ids::{OrderId, PayoutId, ThreadId},
    inbox::{OpenChatRequest, OutgoingMessage},
    order::{DeleteItems, DeliveryStatus},
    profile::{Availability, AvailabilityRequest, ProfileUpdate},
};

/// HTTP method used by an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PATCH`
    Patch,
}

impl Method {
    /// Method name as it appears on the wire.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Patch => "PATCH",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A local file to upload, as handed over by the platform image picker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Attachment {
    /// Local URI or filesystem path.
    pub uri: String,
    /// File name sent in the multipart part.
    pub file_name: String,
    /// MIME type.
    pub mime: String,
}

impl Attachment {
    /// A JPEG image.
    pub fn jpeg(uri: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self { uri: uri.into(), file_name: file_name.into(), mime: "image/jpeg".to_owned() }
    }

    /// Same file uploaded under another name.
    pub fn renamed(&self, file_name: impl Into<String>) -> Self {
        Self { file_name: file_name.into(), ..self.clone() }
    }
}

/// One part of a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    /// Plain text field.
    Text {
        /// Field name.
        name: &'static str,
        /// Field value.
        value: String,
    },
    /// File field.
    File {
        /// Field name.
        name: &'static str,
        /// File to upload.
        attachment: Attachment,
    },
}

impl Part {
    fn text(name: &'static str, value: impl Into<String>) -> Self {
        Self::Text { name, value: value.into() }
    }

    fn file(name: &'static str, attachment: Attachment) -> Self {
        Self::File { name, attachment }
    }
}

/// Encoded request body.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// No body.
    Empty,
    /// JSON document.
    Json(Value),
    /// `multipart/form-data`.
    Multipart(Vec<Part>),
}

/// A backend call with its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Endpoint {
    /// `POST /api/loginRider`
    Login(LoginRequest),
    /// `POST /api/forgot-password`
    ForgotPassword(ForgotPasswordRequest),
    /// `POST /api/verify-code`
    VerifyCode(VerifyCodeRequest),
    /// `POST /api/change-password`
    ChangePassword(ChangePasswordRequest),
    /// `GET /api/getAllDelivery`
    Orders,
    /// `PATCH /api/riderDeleteOrders`
    DeleteOrders(Vec<OrderId>),
    /// `PATCH /api/updateRiderStatusDelivery`
    UpdateDeliveryStatus {
        /// Order to advance.
        order: OrderId,
        /// Target status.
        status: DeliveryStatus,
        /// Proof-of-pickup or proof-of-delivery photo.
        proof: Option<Attachment>,
        /// Payment receipt photo.
        receipt: Option<Attachment>,
    },
    /// `GET /api/getRiderInboxChat`
    Inbox,
    /// `PATCH /api/updateMarkAsReadFromRider/{id}`
    MarkThreadRead(ThreadId),
    /// `PATCH /api/deleteChat/{id}`
    DeleteThread(ThreadId),
    /// `GET /api/getRiderMessages/{id}`
    Messages(ThreadId),
    /// `POST /api/riderSendMessage`
    SendMessage(OutgoingMessage),
    /// `POST /api/getRiderChatId`
    OpenChat(OpenChatRequest),
    /// `GET /api/getPayouts`
    Payouts,
    /// `PATCH /api/riderDeletePayout`
    DeletePayouts(Vec<PayoutId>),
    /// `GET /api/getProfile`
    Profile,
    /// `PATCH /api/updateProfile`
    UpdateProfile(ProfileUpdate),
    /// `PATCH /api/updateActiveStatus`
    SetAvailability(Availability),
    /// `GET /api/getRiderQrPayment`
    QrPayments,
}

impl Endpoint {
    /// HTTP method.
    pub fn method(&self) -> Method {
        match self {
            Self::Orders
            | Self::Inbox
            | Self::Messages(_)
            | Self::Payouts
            | Self::Profile
            | Self::QrPayments => Method::Get,
            Self::Login(_)
            | Self::ForgotPassword(_)
            | Self::VerifyCode(_)
            | Self::ChangePassword(_)
            | Self::SendMessage(_)
            | Self::OpenChat(_) => Method::Post,
            Self::DeleteOrders(_)
            | Self::UpdateDeliveryStatus { .. }
            | Self::MarkThreadRead(_)
            | Self::DeleteThread(_)
            | Self::DeletePayouts(_)
            | Self::UpdateProfile(_)
            | Self::SetAvailability(_) => Method::Patch,
        }
    }

    /// Path relative to the API base URL.
    pub fn path(&self) -> String {
        match self {
            Self::Login(_) => "/api/loginRider".to_owned(),
            Self::ForgotPassword(_) => "/api/forgot-password".to_owned(),
            Self::VerifyCode(_) => "/api/verify-code".to_owned(),
            Self::ChangePassword(_) => "/api/change-password".to_owned(),
            Self::Orders => "/api/getAllDelivery".to_owned(),
            Self::DeleteOrders(_) => "/api/riderDeleteOrders".to_owned(),
            Self::UpdateDeliveryStatus { .. } => "/api/updateRiderStatusDelivery".to_owned(),
            Self::Inbox => "/api/getRiderInboxChat".to_owned(),
            Self::MarkThreadRead(id) => format!("/api/updateMarkAsReadFromRider/{id}"),
            Self::DeleteThread(id) => format!("/api/deleteChat/{id}"),
            Self::Messages(id) => format!("/api/getRiderMessages/{id}"),
            Self::SendMessage(_) => "/api/riderSendMessage".to_owned(),
            Self::OpenChat(_) => "/api/getRiderChatId".to_owned(),
            Self::Payouts => "/api/getPayouts".to_owned(),
            Self::DeletePayouts(_) => "/api/riderDeletePayout".to_owned(),
            Self::Profile => "/api/getProfile".to_owned(),
            Self::UpdateProfile(_) => "/api/updateProfile".to_owned(),
            Self::SetAvailability(_) => "/api/updateActiveStatus".to_owned(),
            Self::QrPayments => "/api/getRiderQrPayment".to_owned(),
        }
    }

    /// Absolute URL under `base`.
    pub fn url(&self, base: &str) -> String {
        format!("{}{}", base.trim_end_matches('/'), self.path())
    }

    /// Whether the call carries the bearer token.
    pub fn requires_auth(&self) -> bool {
        !matches!(
            self,
            Self::Login(_) | Self::ForgotPassword(_) | Self::VerifyCode(_) | Self::ChangePassword(_)
        )
    }

    /// Short stable name for logs and test assertions.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Login(_) => "auth.login",
            Self::ForgotPassword(_) => "auth.forgot_password",
            Self::VerifyCode(_) => "auth.verify_code",
            Self::ChangePassword(_) => "auth.change_password",
            Self::Orders => "orders.fetch",
            Self::DeleteOrders(_) => "orders.delete",
            Self::UpdateDeliveryStatus { .. } => "orders.update_status",
            Self::Inbox => "inbox.fetch",
            Self::MarkThreadRead(_) => "inbox.mark_read",
            Self::DeleteThread(_) => "inbox.delete",
            Self::Messages(_) => "chat.fetch",
            Self::SendMessage(_) => "chat.send",
            Self::OpenChat(_) => "chat.open",
            Self::Payouts => "payouts.fetch",
            Self::DeletePayouts(_) => "payouts.delete",
            Self::Profile => "profile.fetch",
            Self::UpdateProfile(_) => "profile.update",
            Self::SetAvailability(_) => "profile.availability",
            Self::QrPayments => "profile.qr_payments",
        }
    }

    /// Encode the request body.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ProtocolError::Json`] if a JSON payload cannot be
    /// serialized.
    pub fn body(&self) -> Result<Body> {
        let body = match self {
            Self::Login(req) => json(req)?,
            Self::ForgotPassword(req) => json(req)?,
            Self::VerifyCode(req) => json(req)?,
            Self::ChangePassword(req) => json(req)?,
            Self::DeleteOrders(ids) => json(&DeleteItems { items: ids.clone() })?,
            Self::DeletePayouts(ids) => json(&DeleteItems { items: ids.clone() })?,
            Self::OpenChat(req) => json(req)?,
            Self::SetAvailability(status) => json(&AvailabilityRequest { status: *status })?,
            Self::UpdateDeliveryStatus { order, status, proof, receipt } => {
                let mut parts =
                    vec![
                        Part::text("id", order.as_str()),
                        Part::text("newStatus", status.as_str()),
                    ];
                if let Some(proof) = proof {
                    parts.push(Part::file("image", proof.renamed(format!("proof{order}.jpeg"))));
                }
                if let Some(receipt) = receipt {
                    parts.push(Part::file(
                        "paymentReceipt",
                        receipt.renamed(format!("receipt{order}.jpeg")),
                    ));
                }
                Body::Multipart(parts)
            },
            Self::SendMessage(msg) => {
                let mut parts = vec![
                    Part::text("receiverId", msg.receiver_id.clone()),
                    Part::text("receiverRole", msg.receiver_role.as_str()),
                    Part::text("textMessage", msg.text.clone()),
                ];
                parts.extend(msg.images.iter().cloned().map(|img| Part::file("images", img)));
                Body::Multipart(parts)
            },
            Self::UpdateProfile(update) => {
                let mut parts = Vec::with_capacity(7);
                if let Some(image) = &update.image {
                    parts.push(Part::file("image", image.clone()));
                }
                parts.extend([
                    Part::text("firstname", update.firstname.clone()),
                    Part::text("lastname", update.lastname.clone()),
                    Part::text("email", update.email.clone()),
                    Part::text("contact", update.contact.clone()),
                    Part::text("wallet_number", update.wallet_number.clone()),
                    Part::text("wallet_type", update.wallet_type.clone()),
                ]);
                Body::Multipart(parts)
            },
            Self::Orders
            | Self::Inbox
            | Self::MarkThreadRead(_)
            | Self::DeleteThread(_)
            | Self::Messages(_)
            | Self::Payouts
            | Self::Profile
            | Self::QrPayments => Body::Empty,
        };
        Ok(body)
    }
}

fn json<T: Serialize>(value: &T) -> Result<Body> {
    Ok(Body::Json(serde_json::to_value(value)?))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::inbox::Role;

    #[test]
    fn thread_paths_embed_id() {
        let id = ThreadId::new("t42");
        assert_eq!(
            Endpoint::MarkThreadRead(id.clone()).path(),
            "/api/updateMarkAsReadFromRider/t42"
        );
        assert_eq!(Endpoint::DeleteThread(id.clone()).method(), Method::Patch);
        assert_eq!(
            Endpoint::Messages(id).url("https://api.example.com/"),
            "https://api.example.com/api/getRiderMessages/t42"
        );
    }

    #[test]
    fn delete_orders_wraps_items() {
        let body =
            Endpoint::DeleteOrders(vec![OrderId::new("a"), OrderId::new("b")]).body().unwrap();
        assert_eq!(body, Body::Json(json!({"items": ["a", "b"]})));
    }

    #[test]
    fn status_update_names_evidence_after_order() {
        let endpoint = Endpoint::UpdateDeliveryStatus {
            order: OrderId::new("o1"),
            status: DeliveryStatus::Delivered,
            proof: None,
            receipt: Some(Attachment::jpeg("file:///tmp/r.jpg", "r.jpg")),
        };

        let Body::Multipart(parts) = endpoint.body().unwrap() else {
            panic!("expected multipart body");
        };
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1], Part::Text { name: "newStatus", value: "delivered".into() });
        match &parts[2] {
            Part::File { name, attachment } => {
                assert_eq!(*name, "paymentReceipt");
                assert_eq!(attachment.file_name, "receipto1.jpeg");
            },
            other => panic!("unexpected part {other:?}"),
        }
    }

    #[test]
    fn only_auth_flows_are_anonymous() {
        let login = Endpoint::Login(LoginRequest { email: "a".into(), password: "b".into() });
        assert!(!login.requires_auth());
        assert!(Endpoint::Orders.requires_auth());

        let send = Endpoint::SendMessage(OutgoingMessage {
            receiver_id: "u1".into(),
            receiver_role: Role::User,
            text: "hi".into(),
            images: Vec::new(),
        });
        assert!(send.requires_auth());
        assert_eq!(send.method(), Method::Post);
    }
}
