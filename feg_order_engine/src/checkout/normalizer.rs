//! Projection of a verified checkout session onto the typed [`NormalizedCheckout`] the reconciler works with.
//!
//! Sub-fields degrade gracefully. A bad `order_items` or `shipping_address` blob is logged and replaced with an empty
//! value rather than failing the event, so that the order still gets recorded and can be fixed up by hand. The only
//! hard failure is a session without an id, since there is nothing to key the order on.
use chrono::{DateTime, Utc};
use feg_common::{Money, DEFAULT_CURRENCY_CODE};
use log::*;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    checkout::event::{CheckoutSessionObject, PayloadError, PaymentIntentObject, ProviderAddress},
    db_types::{
        CheckoutSessionUpdate,
        NewOrder,
        NewOrderItem,
        OrderNumber,
        PaymentStatus,
        ProductVariant,
        SessionId,
        SessionStatus,
        ShippingAddress,
        StockAdjustment,
        DEFAULT_COUNTRY,
    },
    helpers::{generate_order_number, normalize_email, sanitize_name},
};

pub const ORDER_ITEMS_KEY: &str = "order_items";
pub const SHIPPING_ADDRESS_KEY: &str = "shipping_address";

/// A single validated line item from the checkout cart snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    pub product_id: String,
    pub name: String,
    pub quantity: i64,
    pub price: Money,
    pub variant: ProductVariant,
}

impl LineItem {
    pub fn line_total(&self) -> Money {
        self.price.saturating_mul(self.quantity)
    }
}

impl From<&LineItem> for NewOrderItem {
    fn from(item: &LineItem) -> Self {
        Self {
            product_id: item.product_id.clone(),
            product_name: item.name.clone(),
            variant: item.variant,
            quantity: item.quantity,
            unit_price: item.price,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedCheckout {
    pub session_id: SessionId,
    /// Lower-cased and validated. Empty if the event carried no usable address.
    pub customer_email: String,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub items: Vec<LineItem>,
    pub shipping_address: ShippingAddress,
    pub order_number: OrderNumber,
    pub payment_status: PaymentStatus,
    pub payment_intent: Option<String>,
    /// Upper-case ISO currency code
    pub currency: String,
    pub total: Money,
    pub subtotal: Money,
    pub test_mode: bool,
    pub expires_at: Option<DateTime<Utc>>,
    /// The verbatim session metadata
    pub metadata: Value,
}

impl NormalizedCheckout {
    pub fn new_order(&self, customer_id: Option<i64>) -> NewOrder {
        NewOrder {
            order_number: self.order_number.clone(),
            session_id: self.session_id.clone(),
            customer_id,
            customer_email: self.customer_email.clone(),
            customer_name: self.customer_name.clone(),
            customer_phone: self.customer_phone.clone(),
            payment_status: self.payment_status,
            payment_intent: self.payment_intent.clone(),
            subtotal: self.subtotal,
            tax: Money::default(),
            shipping: Money::default(),
            discount: Money::default(),
            total: self.total,
            currency: self.currency.clone(),
            shipping_address: self.shipping_address.clone(),
            billing_address: None,
            metadata: self.metadata.clone(),
            test_mode: self.test_mode,
        }
    }

    pub fn order_items(&self) -> Vec<NewOrderItem> {
        self.items.iter().map(NewOrderItem::from).collect()
    }

    pub fn session_update(&self, status: SessionStatus) -> CheckoutSessionUpdate {
        CheckoutSessionUpdate {
            session_id: self.session_id.clone(),
            customer_email: self.customer_email.clone(),
            amount_total: self.total,
            currency: self.currency.clone(),
            payment_intent: self.payment_intent.clone(),
            metadata: self.metadata.clone(),
            status,
            payment_status: self.payment_status,
            test_mode: self.test_mode,
        }
    }

    /// One adjustment per distinct (product name, variant) pair, with quantities summed.
    pub fn stock_adjustments(&self) -> Vec<StockAdjustment> {
        let mut result: Vec<StockAdjustment> = Vec::with_capacity(self.items.len());
        for item in &self.items {
            match result.iter_mut().find(|a| a.product_name == item.name && a.variant == item.variant) {
                Some(adj) => adj.quantity = adj.quantity.saturating_add(item.quantity),
                None => result.push(StockAdjustment {
                    product_name: item.name.clone(),
                    variant: item.variant,
                    quantity: item.quantity,
                }),
            }
        }
        result
    }
}

/// The normalized form of a `payment_intent.payment_failed` event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedPayment {
    pub payment_intent: String,
    pub amount: Money,
    pub currency: String,
    pub failure_reason: String,
    pub customer_email: String,
    pub test_mode: bool,
}

pub const UNKNOWN_FAILURE_REASON: &str = "Unknown error";

pub fn normalize_checkout(session: &CheckoutSessionObject) -> Result<NormalizedCheckout, PayloadError> {
    let session_id = session.id.trim();
    if session_id.is_empty() {
        return Err(PayloadError::MissingSessionId);
    }
    let items = parse_order_items(session.metadata_str(ORDER_ITEMS_KEY), session_id);
    let shipping_address = shipping_address(session);
    let order_number = session.metadata_str("order_number").map(|s| OrderNumber(s.to_string())).unwrap_or_else(|| {
        let n = generate_order_number();
        debug!("🧾️ Session {session_id} has no order number. Generated {n}");
        n
    });
    let email = session
        .customer_details
        .as_ref()
        .and_then(|c| c.email.as_deref())
        .or(session.customer_email.as_deref())
        .or(session.metadata_str("customer_email"))
        .unwrap_or_default();
    let customer_email = normalize_email(email);
    if customer_email.is_empty() && !email.trim().is_empty() {
        warn!("🧾️ Session {session_id} carries an invalid customer email address. It will be ignored.");
    }
    let name = session
        .metadata_str("customer_name")
        .or(session.customer_details.as_ref().and_then(|c| c.name.as_deref()))
        .or(session.shipping_details.as_ref().and_then(|s| s.name.as_deref()))
        .unwrap_or_default();
    let customer_phone = session
        .metadata_str("customer_phone")
        .or(session.customer_details.as_ref().and_then(|c| c.phone.as_deref()))
        .map(String::from);
    let total = Money::from_cents(session.amount_total.unwrap_or(0));
    let subtotal = Money::from_cents(session.amount_subtotal.or(session.amount_total).unwrap_or(0));
    let expires_at = session.expires_at.and_then(|ts| DateTime::from_timestamp(ts, 0));
    Ok(NormalizedCheckout {
        session_id: SessionId::from(session_id),
        customer_email,
        customer_name: sanitize_name(name),
        customer_phone,
        items,
        shipping_address,
        order_number,
        payment_status: PaymentStatus::from_provider(session.payment_status.as_deref()),
        payment_intent: session.payment_intent.clone(),
        currency: currency_code(session.currency.as_deref()),
        total,
        subtotal,
        test_mode: !session.livemode,
        expires_at,
        metadata: Value::Object(session.metadata.clone()),
    })
}

pub fn normalize_payment_failure(intent: &PaymentIntentObject) -> Result<FailedPayment, PayloadError> {
    let payment_intent = intent.id.trim();
    if payment_intent.is_empty() {
        return Err(PayloadError::MalformedObject("payment_intent".into(), "missing id".into()));
    }
    Ok(FailedPayment {
        payment_intent: payment_intent.to_string(),
        amount: Money::from_cents(intent.amount.unwrap_or(0)),
        currency: currency_code(intent.currency.as_deref()),
        failure_reason: intent.failure_message().unwrap_or(UNKNOWN_FAILURE_REASON).to_string(),
        customer_email: normalize_email(intent.receipt_email.as_deref().unwrap_or_default()),
        test_mode: !intent.livemode,
    })
}

fn currency_code(currency: Option<&str>) -> String {
    currency.map(str::trim).filter(|c| !c.is_empty()).unwrap_or(DEFAULT_CURRENCY_CODE).to_uppercase()
}

#[derive(Deserialize)]
struct RawItem {
    id: String,
    name: String,
    quantity: i64,
    price: f64,
    product_type: Option<String>,
}

impl TryFrom<RawItem> for LineItem {
    type Error = String;

    fn try_from(raw: RawItem) -> Result<Self, Self::Error> {
        if raw.quantity < 1 {
            return Err(format!("item {} has quantity {}", raw.id, raw.quantity));
        }
        if raw.price < 0.0 {
            return Err(format!("item {} has a negative price", raw.id));
        }
        let price = Money::from_major(raw.price).map_err(|e| e.to_string())?;
        if price.checked_mul(raw.quantity).is_none() {
            return Err(format!("item {} has a line total that is too large ({} x {price})", raw.id, raw.quantity));
        }
        Ok(Self {
            product_id: raw.id,
            name: raw.name,
            quantity: raw.quantity,
            price,
            variant: ProductVariant::from_tag(raw.product_type.as_deref()),
        })
    }
}

/// Parses the JSON-encoded cart snapshot. Any failure, in the JSON or in a single item, yields an empty list.
fn parse_order_items(raw: Option<&str>, session_id: &str) -> Vec<LineItem> {
    let Some(raw) = raw else {
        debug!("🧾️ Session {session_id} carries no order items");
        return Vec::new();
    };
    let items = serde_json::from_str::<Vec<RawItem>>(raw)
        .map_err(|e| e.to_string())
        .and_then(|items| items.into_iter().map(LineItem::try_from).collect::<Result<Vec<_>, _>>())
        .and_then(check_cart_totals);
    items.unwrap_or_else(|e| {
        warn!("🧾️ Could not parse the order items for session {session_id}. Recording the order without items. {e}");
        Vec::new()
    })
}

/// The cart as a whole must also fit: the summed quantities feed the stock adjustments, and the summed line totals
/// are what the order is worth.
fn check_cart_totals(items: Vec<LineItem>) -> Result<Vec<LineItem>, String> {
    let mut quantity = 0i64;
    let mut total = Money::default();
    for item in &items {
        let line_total = item.price.checked_mul(item.quantity);
        match (quantity.checked_add(item.quantity), line_total.and_then(|t| total.checked_add(t))) {
            (Some(q), Some(t)) => {
                quantity = q;
                total = t;
            },
            _ => return Err("the cart quantities or totals are too large".to_string()),
        }
    }
    Ok(items)
}

#[derive(Deserialize)]
struct RawAddress {
    line1: String,
    line2: Option<String>,
    city: String,
    state: String,
    postal_code: String,
    country: Option<String>,
}

impl From<RawAddress> for ShippingAddress {
    fn from(raw: RawAddress) -> Self {
        Self {
            line1: raw.line1,
            line2: raw.line2.filter(|l| !l.is_empty()),
            city: raw.city,
            state: raw.state,
            postal_code: raw.postal_code,
            country: raw.country.filter(|c| !c.is_empty()).unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
        }
    }
}

impl From<&ProviderAddress> for ShippingAddress {
    fn from(addr: &ProviderAddress) -> Self {
        let field = |f: &Option<String>| f.clone().unwrap_or_default();
        Self {
            line1: field(&addr.line1),
            line2: addr.line2.clone().filter(|l| !l.is_empty()),
            city: field(&addr.city),
            state: field(&addr.state),
            postal_code: field(&addr.postal_code),
            country: addr.country.clone().filter(|c| !c.is_empty()).unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
        }
    }
}

/// The metadata address wins. When it is absent, the address collected by the provider is used instead.
fn shipping_address(session: &CheckoutSessionObject) -> ShippingAddress {
    match session.metadata_str(SHIPPING_ADDRESS_KEY) {
        Some(raw) => serde_json::from_str::<RawAddress>(raw).map(ShippingAddress::from).unwrap_or_else(|e| {
            warn!("🧾️ Could not parse the shipping address for session {}. Using a blank address. {e}", session.id);
            ShippingAddress::default()
        }),
        None => session
            .shipping_details
            .as_ref()
            .and_then(|s| s.address.as_ref())
            .or(session.customer_details.as_ref().and_then(|c| c.address.as_ref()))
            .map(ShippingAddress::from)
            .unwrap_or_default(),
    }
}
