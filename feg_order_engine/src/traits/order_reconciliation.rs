use thiserror::Error;

use crate::{
    db_types::{
        CheckoutSession,
        CheckoutSessionUpdate,
        Customer,
        NewCustomer,
        NewOrder,
        NewOrderItem,
        OrderItem,
        SessionId,
    },
    traits::InsertOrderResult,
};

#[derive(Debug, Clone, Error)]
pub enum ReconciliationDbError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("Cannot insert items for order {0}, since the order does not exist")]
    OrderNotFound(i64),
    #[error("The customer record for {0} could not be created")]
    CustomerNotCreated(String),
}

impl From<sqlx::Error> for ReconciliationDbError {
    fn from(e: sqlx::Error) -> Self {
        ReconciliationDbError::DatabaseError(e.to_string())
    }
}

/// The write side of the order store, as used by the reconciliation flow.
#[allow(async_fn_in_trait)]
pub trait OrderReconciliation {
    /// Returns the customer with the given email, creating the record if it does not exist yet.
    async fn fetch_or_create_customer(&self, customer: NewCustomer) -> Result<Customer, ReconciliationDbError>;

    /// Updates the checkout-session tracking row for `update.session_id`, creating it if it was never written.
    async fn upsert_checkout_session(
        &self,
        update: CheckoutSessionUpdate,
    ) -> Result<CheckoutSession, ReconciliationDbError>;

    /// Inserts the order, unless an order for the same session id already exists.
    ///
    /// This is atomic with respect to concurrent calls for the same session id: exactly one caller receives
    /// [`InsertOrderResult::Inserted`], and every other caller receives [`InsertOrderResult::AlreadyExists`] with the
    /// stored order.
    async fn insert_order(&self, order: NewOrder) -> Result<InsertOrderResult, ReconciliationDbError>;

    /// Inserts all the line items for an order in a single transaction. Either all items are stored, or none are.
    async fn insert_order_items(
        &self,
        order_id: i64,
        items: &[NewOrderItem],
    ) -> Result<Vec<OrderItem>, ReconciliationDbError>;

    /// Marks the checkout-session row as expired. Returns `false` if no row exists for the session.
    async fn expire_checkout_session(&self, session_id: &SessionId) -> Result<bool, ReconciliationDbError>;

    /// Marks the checkout-session row with the given payment intent as failed, recording the reason.
    /// Returns the updated row, or `None` if there is no session for the payment intent. Completed sessions are never
    /// marked as failed.
    async fn fail_checkout_session(
        &self,
        payment_intent: &str,
        reason: &str,
    ) -> Result<Option<CheckoutSession>, ReconciliationDbError>;
}
