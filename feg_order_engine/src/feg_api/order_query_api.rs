use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Order, OrderNumber, SessionId},
    feg_api::order_objects::OrderDetails,
    traits::{OrderManagement, ReconciliationDbError},
};

/// Read-only access to recorded orders, for the storefront's order confirmation and lookup pages.
pub struct OrderQueryApi<B> {
    db: B,
}

impl<B> Debug for OrderQueryApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderQueryApi")
    }
}

impl<B> OrderQueryApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> OrderQueryApi<B>
where B: OrderManagement
{
    pub async fn order_for_session(&self, session_id: &SessionId) -> Result<Option<OrderDetails>, ReconciliationDbError> {
        let order = self.db.fetch_order_by_session_id(session_id).await?;
        self.with_items(order).await
    }

    pub async fn order_by_number(&self, number: &OrderNumber) -> Result<Option<OrderDetails>, ReconciliationDbError> {
        let order = self.db.fetch_order_by_order_number(number).await?;
        self.with_items(order).await
    }

    async fn with_items(&self, order: Option<Order>) -> Result<Option<OrderDetails>, ReconciliationDbError> {
        let Some(order) = order else {
            return Ok(None);
        };
        let items = self.db.fetch_order_items(order.id).await?;
        trace!("📦️ Order {} has {} items", order.order_number, items.len());
        Ok(Some(OrderDetails::new(order, items)))
    }
}
