use crate::{
    db_types::{CheckoutSession, Order, OrderItem, OrderNumber, SessionId},
    traits::ReconciliationDbError,
};

/// The `OrderManagement` trait defines the behaviour for querying information about orders in the database backend.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    async fn fetch_order_by_session_id(&self, session_id: &SessionId) -> Result<Option<Order>, ReconciliationDbError>;

    async fn fetch_order_by_order_number(
        &self,
        order_number: &OrderNumber,
    ) -> Result<Option<Order>, ReconciliationDbError>;

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, ReconciliationDbError>;

    async fn fetch_checkout_session(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<CheckoutSession>, ReconciliationDbError>;
}
