//! Typed model of the provider webhook events we act on.
//!
//! Only the fields the reconciliation flow reads are modelled. Everything else in the payload is ignored, except the
//! session `metadata`, which is kept verbatim for auditing.
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

pub const SESSION_COMPLETED: &str = "checkout.session.completed";
pub const SESSION_EXPIRED: &str = "checkout.session.expired";
pub const PAYMENT_FAILED: &str = "payment_intent.payment_failed";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("The event payload is not a valid provider event: {0}")]
    MalformedEvent(String),
    #[error("The {0} event object is malformed: {1}")]
    MalformedObject(String, String),
    #[error("The checkout session has no session id")]
    MissingSessionId,
}

/// A verified provider event. Unknown event types all land in [`WebhookEvent::Ignored`].
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookEvent {
    SessionCompleted(CheckoutSessionObject),
    SessionExpired(CheckoutSessionObject),
    PaymentFailed(PaymentIntentObject),
    Ignored { event_type: String },
}

#[derive(Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    livemode: bool,
    data: RawEventData,
}

#[derive(Deserialize)]
struct RawEventData {
    object: Value,
}

impl WebhookEvent {
    /// Parses a raw webhook body. Only call this once the signature over `body` has been verified.
    pub fn from_slice(body: &[u8]) -> Result<Self, PayloadError> {
        let raw: RawEvent = serde_json::from_slice(body).map_err(|e| PayloadError::MalformedEvent(e.to_string()))?;
        let RawEvent { event_type, livemode, data } = raw;
        let object = data.object;
        let event = match event_type.as_str() {
            SESSION_COMPLETED => {
                Self::SessionCompleted(CheckoutSessionObject::from_value(&event_type, object, livemode)?)
            },
            SESSION_EXPIRED => Self::SessionExpired(CheckoutSessionObject::from_value(&event_type, object, livemode)?),
            PAYMENT_FAILED => Self::PaymentFailed(PaymentIntentObject::from_value(&event_type, object, livemode)?),
            _ => Self::Ignored { event_type },
        };
        Ok(event)
    }

    pub fn event_type(&self) -> &str {
        match self {
            Self::SessionCompleted(_) => SESSION_COMPLETED,
            Self::SessionExpired(_) => SESSION_EXPIRED,
            Self::PaymentFailed(_) => PAYMENT_FAILED,
            Self::Ignored { event_type } => event_type.as_str(),
        }
    }
}

/// The provider's `checkout.session` object
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CheckoutSessionObject {
    #[serde(default)]
    pub id: String,
    pub amount_total: Option<i64>,
    pub amount_subtotal: Option<i64>,
    pub currency: Option<String>,
    pub customer_email: Option<String>,
    pub customer_details: Option<CustomerDetails>,
    pub shipping_details: Option<ShippingDetails>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub payment_status: Option<String>,
    #[serde(default, deserialize_with = "expandable_id")]
    pub payment_intent: Option<String>,
    pub status: Option<String>,
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub livemode: bool,
}

impl CheckoutSessionObject {
    fn from_value(event_type: &str, object: Value, livemode: bool) -> Result<Self, PayloadError> {
        let mut session: Self = serde_json::from_value(object)
            .map_err(|e| PayloadError::MalformedObject(event_type.to_string(), e.to_string()))?;
        session.livemode |= livemode;
        Ok(session)
    }

    /// Returns the metadata entry for `key` if it is a non-empty string
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str).map(str::trim).filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CustomerDetails {
    pub email: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<ProviderAddress>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ShippingDetails {
    pub name: Option<String>,
    pub address: Option<ProviderAddress>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProviderAddress {
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

/// The provider's `payment_intent` object
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PaymentIntentObject {
    #[serde(default)]
    pub id: String,
    pub amount: Option<i64>,
    pub currency: Option<String>,
    pub receipt_email: Option<String>,
    pub last_payment_error: Option<PaymentError>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub livemode: bool,
}

impl PaymentIntentObject {
    fn from_value(event_type: &str, object: Value, livemode: bool) -> Result<Self, PayloadError> {
        let mut intent: Self = serde_json::from_value(object)
            .map_err(|e| PayloadError::MalformedObject(event_type.to_string(), e.to_string()))?;
        intent.livemode |= livemode;
        Ok(intent)
    }

    pub fn failure_message(&self) -> Option<&str> {
        self.last_payment_error.as_ref().and_then(|e| e.message.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PaymentError {
    pub code: Option<String>,
    pub message: Option<String>,
}

/// The provider sends either an object id or, when expanded, the whole object. We only keep the id.
fn expandable_id<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    let id = match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Object(o)) => o.get("id").and_then(Value::as_str).map(String::from),
        _ => None,
    };
    Ok(id)
}
