//! Rider profile, availability and payment QR payloads.

use serde::{Deserialize, Serialize};

use crate::{api::Attachment, ids::AccountId, payout::EWallet};

/// Whether the rider accepts new deliveries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    /// Accepting deliveries.
    #[serde(alias = "online")]
    Available,
    /// Not accepting deliveries.
    #[default]
    #[serde(other)]
    Offline,
}

impl Availability {
    /// Wire string.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Offline => "offline",
        }
    }

    /// The opposite state.
    pub const fn toggled(self) -> Self {
        match self {
            Self::Available => Self::Offline,
            Self::Offline => Self::Available,
        }
    }
}

/// Rider profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Account id.
    #[serde(rename = "_id")]
    pub id: AccountId,
    /// Avatar URL.
    #[serde(default)]
    pub image_file: Option<String>,
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
    /// Availability toggle.
    #[serde(default)]
    pub status: Availability,
    /// Wallet payouts are sent to.
    #[serde(default, rename = "e_WalletAcc")]
    pub wallet: EWallet,
}

/// Edited profile fields submitted by the rider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    /// New avatar, if changed.
    pub image: Option<Attachment>,
    /// Given name. Required.
    pub firstname: String,
    /// Family name. Required.
    pub lastname: String,
    /// Email address. Required.
    pub email: String,
    /// Phone number.
    pub contact: String,
    /// Wallet number.
    pub wallet_number: String,
    /// Wallet provider.
    pub wallet_type: String,
}

impl ProfileUpdate {
    /// Name of the first required field that is blank.
    pub fn missing_field(&self) -> Option<&'static str> {
        [("firstname", &self.firstname), ("lastname", &self.lastname), ("email", &self.email)]
            .into_iter()
            .find(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name)
    }
}

/// Reply of `PATCH /api/updateProfile`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdateReply {
    /// Profile after the update.
    pub rider: Profile,
}

/// Body of `PATCH /api/updateActiveStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityRequest {
    /// Requested state.
    pub status: Availability,
}

/// Generic `{ message }` reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageReply {
    /// Human-readable outcome.
    #[serde(default)]
    pub message: String,
}

/// E-wallet provider of a payment QR code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QrMethod {
    /// GCash.
    Gcash,
    /// Maya.
    Maya,
}

/// Payment QR code the rider shows the buyer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCode {
    /// Wallet provider.
    pub method: QrMethod,
    /// Image URL of the code.
    pub image_url: String,
}

/// Reply of `GET /api/getRiderQrPayment`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrPaymentReply {
    /// Configured codes.
    #[serde(default)]
    pub data: QrPaymentData,
}

/// Payload of [`QrPaymentReply`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrPaymentData {
    /// GCash code URL.
    #[serde(default)]
    pub gcash_qr: Option<String>,
    /// Maya code URL.
    #[serde(default)]
    pub maya_qr: Option<String>,
}

impl QrPaymentReply {
    /// Configured codes, GCash first. Blank URLs are skipped.
    pub fn into_codes(self) -> Vec<QrCode> {
        [(QrMethod::Gcash, self.data.gcash_qr), (QrMethod::Maya, self.data.maya_qr)]
            .into_iter()
            .filter_map(|(method, url)| {
                url.filter(|u| !u.trim().is_empty()).map(|image_url| QrCode { method, image_url })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn online_is_available() {
        let status: Availability = serde_json::from_str(r#""online""#).unwrap();
        assert_eq!(status, Availability::Available);

        let status: Availability = serde_json::from_str(r#""busy""#).unwrap();
        assert_eq!(status, Availability::Offline);
        assert_eq!(status.toggled(), Availability::Available);
    }

    #[test]
    fn qr_codes_skip_missing() {
        let reply: QrPaymentReply =
            serde_json::from_str(r#"{"data": {"gcashQr": "", "mayaQr": "https://cdn/m.png"}}"#)
                .unwrap();

        let codes = reply.into_codes();
        assert_eq!(codes.len(), 1);
        assert_eq!(codes[0].method, QrMethod::Maya);
    }

    #[test]
    fn missing_required_profile_field() {
        let update = ProfileUpdate {
            firstname: "Jo".into(),
            lastname: " ".into(),
            email: "jo@example.com".into(),
            ..ProfileUpdate::default()
        };
        assert_eq!(update.missing_field(), Some("lastname"));
    }
}
