use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use feg_common::Money;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
pub use sqlx::types::Json;
use sqlx::{FromRow, Type};
use thiserror::Error;

pub const DEFAULT_COUNTRY: &str = "US";

#[derive(Debug, Clone, Error)]
#[error("Invalid value for {0}: {1}")]
pub struct ConversionError(&'static str, String);

//--------------------------------------      SessionId       ---------------------------------------------------------
/// The payment provider's checkout session identifier. This is the idempotency key for order creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S: Into<String>> From<S> for SessionId {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------     OrderNumber      ---------------------------------------------------------
/// The human-facing order number, e.g. `FEG-1718000000000-X4K9QZ`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderNumber(pub String);

impl OrderNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for OrderNumber {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderNumber {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatusType {
    /// The order has been recorded and awaits fulfilment
    #[default]
    Pending,
    /// The order is being picked and packed
    Processing,
    /// The order has been handed to the carrier
    Shipped,
    /// The order has been delivered to the customer
    Delivered,
    /// The order has been cancelled by the customer or an admin
    Cancelled,
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "pending"),
            OrderStatusType::Processing => write!(f, "processing"),
            OrderStatusType::Shipped => write!(f, "shipped"),
            OrderStatusType::Delivered => write!(f, "delivered"),
            OrderStatusType::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError("order status", s.to_string())),
        }
    }
}

//--------------------------------------    PaymentStatus      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    /// Maps the provider's session `payment_status` onto our payment status. Anything that is not a completed
    /// payment is treated as pending.
    pub fn from_provider(status: Option<&str>) -> Self {
        match status {
            Some("paid") | Some("no_payment_required") => Self::Paid,
            _ => Self::Pending,
        }
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Paid => write!(f, "paid"),
            PaymentStatus::Failed => write!(f, "failed"),
            PaymentStatus::Refunded => write!(f, "refunded"),
        }
    }
}

//--------------------------------------    SessionStatus      ---------------------------------------------------------
/// Status of a checkout-session tracking row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Open,
    Complete,
    Expired,
    Failed,
}

impl Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Open => write!(f, "open"),
            SessionStatus::Complete => write!(f, "complete"),
            SessionStatus::Expired => write!(f, "expired"),
            SessionStatus::Failed => write!(f, "failed"),
        }
    }
}

//--------------------------------------    ProductVariant     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProductVariant {
    #[default]
    TotalEssential,
    TotalEssentialPlus,
}

impl ProductVariant {
    /// Resolves a product-type tag from the checkout metadata.
    ///
    /// Unrecognised or missing tags are coerced to [`ProductVariant::TotalEssential`] rather than rejected.
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag {
            Some(t) => t.parse().unwrap_or_else(|_| {
                debug!("Unrecognised product type '{t}'. Using the default variant");
                Self::default()
            }),
            None => Self::default(),
        }
    }
}

impl FromStr for ProductVariant {
    type Err = ConversionError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "total_essential" => Ok(Self::TotalEssential),
            "total_essential_plus" => Ok(Self::TotalEssentialPlus),
            s => Err(ConversionError("product variant", s.to_string())),
        }
    }
}

impl Display for ProductVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductVariant::TotalEssential => write!(f, "total_essential"),
            ProductVariant::TotalEssentialPlus => write!(f, "total_essential_plus"),
        }
    }
}

//--------------------------------------   ShippingAddress     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    #[serde(default)]
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_country() -> String {
    DEFAULT_COUNTRY.to_string()
}

impl Default for ShippingAddress {
    fn default() -> Self {
        Self {
            line1: String::default(),
            line2: None,
            city: String::default(),
            state: String::default(),
            postal_code: String::default(),
            country: default_country(),
        }
    }
}

impl ShippingAddress {
    pub fn is_blank(&self) -> bool {
        self.line1.is_empty() && self.city.is_empty() && self.postal_code.is_empty()
    }
}

impl Display for ShippingAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.line1)?;
        if let Some(line2) = self.line2.as_ref().filter(|l| !l.is_empty()) {
            write!(f, ", {line2}")?;
        }
        write!(f, ", {}, {} {}, {}", self.city, self.state, self.postal_code, self.country)
    }
}

//--------------------------------------        Order         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Order {
    pub id: i64,
    pub order_number: OrderNumber,
    pub session_id: SessionId,
    pub customer_id: Option<i64>,
    pub customer_email: String,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub status: OrderStatusType,
    pub payment_status: PaymentStatus,
    pub payment_intent: Option<String>,
    pub subtotal: Money,
    pub tax: Money,
    pub shipping: Money,
    pub discount: Money,
    pub total: Money,
    pub currency: String,
    pub shipping_address: Json<ShippingAddress>,
    pub billing_address: Json<ShippingAddress>,
    pub metadata: Json<Value>,
    pub test_mode: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------       NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_number: OrderNumber,
    /// The provider session id. Only one order may ever exist per session.
    pub session_id: SessionId,
    pub customer_id: Option<i64>,
    pub customer_email: String,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub payment_status: PaymentStatus,
    pub payment_intent: Option<String>,
    pub subtotal: Money,
    pub tax: Money,
    pub shipping: Money,
    pub discount: Money,
    pub total: Money,
    pub currency: String,
    pub shipping_address: ShippingAddress,
    /// Defaults to the shipping address when not set
    pub billing_address: Option<ShippingAddress>,
    /// The raw checkout metadata, kept for audit purposes
    pub metadata: Value,
    pub test_mode: bool,
}

impl NewOrder {
    pub fn new(order_number: OrderNumber, session_id: SessionId, total: Money) -> Self {
        Self {
            order_number,
            session_id,
            customer_id: None,
            customer_email: String::default(),
            customer_name: String::default(),
            customer_phone: None,
            payment_status: PaymentStatus::Pending,
            payment_intent: None,
            subtotal: total,
            tax: Money::default(),
            shipping: Money::default(),
            discount: Money::default(),
            total,
            currency: feg_common::DEFAULT_CURRENCY_CODE.to_string(),
            shipping_address: ShippingAddress::default(),
            billing_address: None,
            metadata: Value::Null,
            test_mode: false,
        }
    }

    pub fn billing_address(&self) -> &ShippingAddress {
        self.billing_address.as_ref().unwrap_or(&self.shipping_address)
    }
}

//--------------------------------------      OrderItem       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: String,
    pub product_name: String,
    pub variant: ProductVariant,
    pub quantity: i64,
    pub unit_price: Money,
    pub total_price: Money,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub product_id: String,
    pub product_name: String,
    pub variant: ProductVariant,
    pub quantity: i64,
    pub unit_price: Money,
}

impl NewOrderItem {
    /// Saturates instead of overflowing. Items coming from the normalizer always fit.
    pub fn line_total(&self) -> Money {
        self.unit_price.saturating_mul(self.quantity)
    }
}

//--------------------------------------       Customer       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Customer {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

impl NewCustomer {
    /// Splits a display name on whitespace. The first token is the first name and the remainder is the last name.
    pub fn from_display_name(email: &str, name: &str, phone: Option<String>) -> Self {
        let mut parts = name.split_whitespace();
        let first_name = parts.next().unwrap_or_default().to_string();
        let last_name = parts.collect::<Vec<_>>().join(" ");
        Self { email: email.to_string(), first_name, last_name, phone }
    }
}

//--------------------------------------   CheckoutSession     ---------------------------------------------------------
/// The checkout tracking row. It is written when the customer starts a checkout and updated by webhook events.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct CheckoutSession {
    pub id: i64,
    pub session_id: SessionId,
    pub customer_email: String,
    pub amount_total: Money,
    pub currency: String,
    pub payment_intent: Option<String>,
    pub metadata: Json<Value>,
    pub status: SessionStatus,
    pub payment_status: PaymentStatus,
    pub test_mode: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CheckoutSessionUpdate {
    pub session_id: SessionId,
    pub customer_email: String,
    pub amount_total: Money,
    pub currency: String,
    pub payment_intent: Option<String>,
    pub metadata: Value,
    pub status: SessionStatus,
    pub payment_status: PaymentStatus,
    pub test_mode: bool,
}

//--------------------------------------   StockAdjustment     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockAdjustment {
    pub product_name: String,
    pub variant: ProductVariant,
    pub quantity: i64,
}

impl Display for StockAdjustment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} x{} ({})", self.product_name, self.quantity, self.variant)
    }
}
