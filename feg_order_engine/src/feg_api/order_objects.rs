use serde::Serialize;

use crate::db_types::{Order, OrderItem};

/// An order together with its line items
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderDetails {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

impl OrderDetails {
    pub fn new(order: Order, items: Vec<OrderItem>) -> Self {
        Self { order, items }
    }
}

/// What a single reconciliation pass did
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    /// A new order was recorded for the session. `items` holds the rows that were actually stored.
    OrderCreated(OrderDetails),
    /// The session already had an order. Nothing was written and no notifications were sent.
    AlreadyProcessed(Order),
    /// `updated` is false when there was no open checkout session to expire.
    SessionExpired { updated: bool },
    /// `updated` is false when no checkout session carries the failed payment intent.
    PaymentFailed { updated: bool },
    Ignored { event_type: String },
}

impl ReconcileOutcome {
    pub fn order(&self) -> Option<&Order> {
        match self {
            Self::OrderCreated(details) => Some(&details.order),
            Self::AlreadyProcessed(order) => Some(order),
            _ => None,
        }
    }
}
