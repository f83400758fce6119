//! REST request and response bodies.
//!
//! Response types are lenient: every field the client does not strictly need
//! has a default, so a server that adds, drops, or nulls fields does not break
//! decoding.

use matchhub_core::{RoomId, Timestamp};
use serde::{Deserialize, Deserializer, Serialize};

/// Access and refresh JWTs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTokens {
    /// Short-lived bearer token
    pub access: String,
    /// Long-lived token for renewing `access`
    pub refresh: String,
}

/// Result of a successful OTP verification.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuthSession {
    /// Verified account
    pub user: User,
    /// Short-lived bearer token
    pub access: String,
    /// Long-lived token for renewing `access`
    pub refresh: String,
}

impl AuthSession {
    /// The token pair, for persisting.
    pub fn tokens(&self) -> AuthTokens {
        AuthTokens { access: self.access.clone(), refresh: self.refresh.clone() }
    }
}

/// Informational reply such as `{"message": "OTP sent to email"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Notice {
    /// Server message
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    /// Email the notice concerns, if echoed
    #[serde(default)]
    pub email: Option<String>,
}

/// A user's own profile.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct User {
    /// Stable public id, used as `target_user_id` when matching
    #[serde(default, deserialize_with = "lenient_string")]
    pub user_uuid: String,
    /// Pseudonym shown to other users
    #[serde(default, deserialize_with = "null_as_default")]
    pub anonymous_handle: String,
    /// Login email, when the server includes it
    #[serde(default)]
    pub email: Option<String>,
    /// Gender code (`M`, `F`, `O`)
    #[serde(default)]
    pub gender: Option<String>,
    /// Age in years
    #[serde(default)]
    pub age: Option<u32>,
    /// Height in centimetres
    #[serde(default)]
    pub height_cm: Option<u32>,
    /// Degree or course
    #[serde(default)]
    pub degree: Option<String>,
    /// Profession
    #[serde(default)]
    pub profession: Option<String>,
    /// City
    #[serde(default)]
    pub city: Option<String>,
    /// State or region
    #[serde(default)]
    pub state: Option<String>,
    /// Free-form bio
    #[serde(default)]
    pub bio: Option<String>,
    /// Interest tags
    #[serde(default, deserialize_with = "null_as_default")]
    pub interests: Vec<String>,
    /// Photo URLs
    #[serde(default, deserialize_with = "null_as_default")]
    pub photos: Vec<String>,
    /// Spendable token balance
    #[serde(default, alias = "tokens", deserialize_with = "null_as_default")]
    pub tokens_balance: i64,
    /// Email verified
    #[serde(default, alias = "email_verified", deserialize_with = "null_as_default")]
    pub is_verified: bool,
    /// Account creation time
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

/// Fields to change on the own profile. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    /// Gender code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    /// Age in years
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    /// Height in centimetres
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_cm: Option<u32>,
    /// Degree or course
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degree: Option<String>,
    /// Profession
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profession: Option<String>,
    /// City
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// State or region
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Free-form bio
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    /// Interest tags
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interests: Option<Vec<String>>,
}

impl ProfileUpdate {
    /// True when nothing would change.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A chat room between two matched users.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatRoom {
    /// Room id, used for the socket endpoint and history
    pub id: RoomId,
    /// Pseudonym of the first participant
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_a_handle: String,
    /// Pseudonym of the second participant
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_b_handle: String,
    /// Creation time
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    /// End of the free period
    #[serde(default)]
    pub expires_at: Option<Timestamp>,
    /// Locked until a subscription is paid
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_locked: bool,
    /// Days until expiry
    #[serde(default)]
    pub days_remaining: Option<i64>,
    /// Time of the latest message
    #[serde(default)]
    pub last_activity: Option<Timestamp>,
}

impl ChatRoom {
    /// Pseudonym of the participant who is not `own_handle`.
    pub fn peer_handle(&self, own_handle: &str) -> &str {
        if self.user_a_handle == own_handle { &self.user_b_handle } else { &self.user_a_handle }
    }
}

/// A potential match from the discover feed.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Candidate {
    /// Id to pass to `create_match`
    #[serde(default, deserialize_with = "lenient_string")]
    pub user_uuid: String,
    /// Pseudonym
    #[serde(default, deserialize_with = "null_as_default")]
    pub anonymous_handle: String,
    /// Gender code
    #[serde(default)]
    pub gender: Option<String>,
    /// Age in years
    #[serde(default)]
    pub age: Option<u32>,
    /// Height in centimetres
    #[serde(default)]
    pub height_cm: Option<u32>,
    /// Degree or course
    #[serde(default)]
    pub degree: Option<String>,
    /// Profession
    #[serde(default)]
    pub profession: Option<String>,
    /// City
    #[serde(default)]
    pub city: Option<String>,
    /// Interest tags
    #[serde(default, deserialize_with = "null_as_default")]
    pub interests: Vec<String>,
}

/// Kind of match requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Friendship
    #[default]
    Friend,
    /// Dating
    Hookup,
}

impl MatchMode {
    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Friend => "friend",
            Self::Hookup => "hookup",
        }
    }
}

impl std::str::FromStr for MatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "friend" => Ok(Self::Friend),
            "hookup" => Ok(Self::Hookup),
            other => Err(format!("unknown match mode {other:?}")),
        }
    }
}

/// A created (or existing) match.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Match {
    /// Match id
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    /// Pseudonym of the first participant
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_a_handle: String,
    /// Pseudonym of the second participant
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_b_handle: String,
    /// Requested mode
    #[serde(default)]
    pub mode: MatchMode,
    /// Creation time
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    /// Expiry time
    #[serde(default)]
    pub expires_at: Option<Timestamp>,
}

/// How a subscription is paid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// UPI deep link
    #[default]
    Upi,
    /// Hosted card checkout
    Card,
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "upi" => Ok(Self::Upi),
            "card" => Ok(Self::Card),
            other => Err(format!("unknown payment method {other:?}")),
        }
    }
}

/// Price of unlocking a chat room, in paise.
pub const DEFAULT_AMOUNT_PAISE: u64 = 5000;

/// Currency of the default subscription.
pub const DEFAULT_CURRENCY: &str = "INR";

/// Request to unlock a chat room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentRequest {
    /// Room to unlock
    pub chat_room_id: RoomId,
    /// Amount in the smallest currency unit
    pub amount_paise: u64,
    /// ISO currency code
    pub currency: String,
    /// Payment method
    pub payment_method: PaymentMethod,
}

impl PaymentRequest {
    /// Standard subscription for `room` paid with `method`.
    pub fn subscription(room: RoomId, method: PaymentMethod) -> Self {
        Self {
            chat_room_id: room,
            amount_paise: DEFAULT_AMOUNT_PAISE,
            currency: DEFAULT_CURRENCY.to_owned(),
            payment_method: method,
        }
    }
}

/// Where to send the user to complete a payment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PaymentInitiation {
    /// Payment id, if returned
    #[serde(default)]
    pub payment_id: Option<String>,
    /// UPI deep link
    #[serde(default)]
    pub upi_link: Option<String>,
    /// Card checkout page
    #[serde(default)]
    pub checkout_url: Option<String>,
    /// Payment status
    #[serde(default)]
    pub status: Option<String>,
}

impl PaymentInitiation {
    /// The link matching `method`, if the server returned one.
    pub fn redirect(&self, method: PaymentMethod) -> Option<&str> {
        match method {
            PaymentMethod::Upi => self.upi_link.as_deref(),
            PaymentMethod::Card => self.checkout_url.as_deref(),
        }
    }
}

/// Reply of the token refresh endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct RefreshedTokens {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Reply of the upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct UploadResponse {
    pub url: String,
}

/// `null` decodes as the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Ids arrive as strings or numbers.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Null(()),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Int(n) => n.to_string(),
        Raw::Null(()) => String::new(),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn user_profile_decodes_with_nulls_and_missing_fields() {
        let user: User = serde_json::from_value(json!({
            "user_uuid": "5f0c",
            "anonymous_handle": "quiet-otter",
            "age": 24,
            "bio": null,
            "interests": null,
            "tokens_balance": 12,
            "is_verified": true,
            "created_at": "2024-05-01T10:00:00Z",
            "match_profile": {"is_active": true}
        }))
        .unwrap();

        assert_eq!(user.user_uuid, "5f0c");
        assert_eq!(user.anonymous_handle, "quiet-otter");
        assert_eq!(user.age, Some(24));
        assert_eq!(user.bio, None);
        assert!(user.interests.is_empty());
        assert_eq!(user.tokens_balance, 12);
        assert!(user.is_verified);
    }

    #[test]
    fn chat_room_peer_handle() {
        let room: ChatRoom = serde_json::from_value(json!({
            "id": 7,
            "user_a_handle": "quiet-otter",
            "user_b_handle": "blue-fox",
            "is_locked": false,
            "days_remaining": 3
        }))
        .unwrap();

        assert_eq!(room.id.as_str(), "7");
        assert_eq!(room.peer_handle("quiet-otter"), "blue-fox");
        assert_eq!(room.peer_handle("blue-fox"), "quiet-otter");
    }

    #[test]
    fn match_accepts_numeric_id() {
        let m: Match = serde_json::from_value(json!({
            "id": 31,
            "user_a_handle": "a",
            "user_b_handle": "b",
            "mode": "hookup"
        }))
        .unwrap();
        assert_eq!(m.id, "31");
        assert_eq!(m.mode, MatchMode::Hookup);
    }

    #[test]
    fn payment_request_body() {
        let body = serde_json::to_value(PaymentRequest::subscription(
            RoomId::new("r1"),
            PaymentMethod::Card,
        ))
        .unwrap();
        assert_eq!(
            body,
            json!({
                "chat_room_id": "r1",
                "amount_paise": 5000,
                "currency": "INR",
                "payment_method": "card"
            })
        );
    }

    #[test]
    fn payment_redirect_follows_method() {
        let init = PaymentInitiation {
            upi_link: Some("upi://pay?pa=x".into()),
            ..PaymentInitiation::default()
        };
        assert_eq!(init.redirect(PaymentMethod::Upi), Some("upi://pay?pa=x"));
        assert_eq!(init.redirect(PaymentMethod::Card), None);
    }

    #[test]
    fn profile_update_skips_unset_fields() {
        let update = ProfileUpdate { city: Some("Pune".into()), ..ProfileUpdate::default() };
        assert!(!update.is_empty());
        assert_eq!(serde_json::to_value(&update).unwrap(), json!({"city": "Pune"}));
        assert!(ProfileUpdate::default().is_empty());
    }

    #[test]
    fn modes_parse_case_insensitively() {
        assert_eq!("Friend".parse::<MatchMode>(), Ok(MatchMode::Friend));
        assert_eq!(" HOOKUP ".parse::<MatchMode>(), Ok(MatchMode::Hookup));
        assert!("date".parse::<MatchMode>().is_err());
        assert_eq!("card".parse::<PaymentMethod>(), Ok(PaymentMethod::Card));
    }
}
