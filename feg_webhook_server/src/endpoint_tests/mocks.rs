use feg_order_engine::{
    db_types::{
        CheckoutSession,
        CheckoutSessionUpdate,
        Customer,
        NewCustomer,
        NewOrder,
        NewOrderItem,
        Order,
        OrderItem,
        OrderNumber,
        SessionId,
        StockAdjustment,
    },
    traits::{
        InsertOrderResult,
        InventoryError,
        InventoryManagement,
        OrderManagement,
        OrderReconciliation,
        ReconciliationDbError,
    },
};
use mockall::mock;

mock! {
    pub OrderStore {}
    impl OrderReconciliation for OrderStore {
        async fn fetch_or_create_customer(&self, customer: NewCustomer) -> Result<Customer, ReconciliationDbError>;
        async fn upsert_checkout_session(&self, update: CheckoutSessionUpdate) -> Result<CheckoutSession, ReconciliationDbError>;
        async fn insert_order(&self, order: NewOrder) -> Result<InsertOrderResult, ReconciliationDbError>;
        async fn insert_order_items(&self, order_id: i64, items: &[NewOrderItem]) -> Result<Vec<OrderItem>, ReconciliationDbError>;
        async fn expire_checkout_session(&self, session_id: &SessionId) -> Result<bool, ReconciliationDbError>;
        async fn fail_checkout_session(&self, payment_intent: &str, reason: &str) -> Result<Option<CheckoutSession>, ReconciliationDbError>;
    }
}

mock! {
    pub OrderQueries {}
    impl OrderManagement for OrderQueries {
        async fn fetch_order_by_session_id(&self, session_id: &SessionId) -> Result<Option<Order>, ReconciliationDbError>;
        async fn fetch_order_by_order_number(&self, order_number: &OrderNumber) -> Result<Option<Order>, ReconciliationDbError>;
        async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, ReconciliationDbError>;
        async fn fetch_checkout_session(&self, session_id: &SessionId) -> Result<Option<CheckoutSession>, ReconciliationDbError>;
    }
}

mock! {
    pub Inventory {}
    impl InventoryManagement for Inventory {
        async fn decrement_stock(&self, adjustment: &StockAdjustment) -> Result<bool, InventoryError>;
    }
}
