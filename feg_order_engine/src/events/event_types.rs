use crate::{
    checkout::FailedPayment,
    db_types::{CheckoutSession, Order, OrderItem},
    traits::CustomerInfo,
};

/// Published once, when an order is recorded for a session for the first time. Replays never publish it.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderCreatedEvent {
    pub order: Order,
    /// The items that were actually stored. Empty if the cart snapshot was unusable or the item insert failed.
    pub items: Vec<OrderItem>,
    pub customer: CustomerInfo,
}

impl OrderCreatedEvent {
    pub fn new(order: Order, items: Vec<OrderItem>, customer: CustomerInfo) -> Self {
        Self { order, items, customer }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentFailedEvent {
    pub payment: FailedPayment,
    /// The checkout-session row that was marked as failed, if there was one
    pub session: Option<CheckoutSession>,
}

impl PaymentFailedEvent {
    pub fn new(payment: FailedPayment, session: Option<CheckoutSession>) -> Self {
        Self { payment, session }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventType {
    OrderCreated(OrderCreatedEvent),
    PaymentFailed(PaymentFailedEvent),
}
