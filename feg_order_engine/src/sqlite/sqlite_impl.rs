//! `SqliteDatabase` is the concrete SQLite implementation of the order engine backend.
//!
//! It implements every backend trait in [`crate::traits`], including the inventory ledger, so a single database file
//! holds the whole reconciliation state.
use std::fmt::Debug;

use feg_common::Secret;
use log::*;
use sqlx::{migrate::MigrateError, SqlitePool};

use super::db::{checkout_sessions, customers, db_url, inventory, new_pool, order_items, orders, secrets};
use crate::{
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
        ProductVariant,
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
        SecretStore,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in `FEG_DATABASE_URL`, or the default.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        trace!("🗃️ Created new DB pool for {url}");
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&mut self) -> Result<(), sqlx::Error> {
        self.pool.close().await;
        Ok(())
    }

    /// Brings the schema up to date with the migrations embedded in this crate.
    pub async fn run_migrations(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub async fn store_secret(&self, key: &str, value: &Secret<String>) -> Result<(), ReconciliationDbError> {
        let mut conn = self.pool.acquire().await?;
        secrets::store_secret(key, value.reveal(), &mut conn).await?;
        debug!("🗃️ Secret '{key}' stored");
        Ok(())
    }

    pub async fn set_stock(&self, product_name: &str, variant: ProductVariant, stock: i64) -> Result<(), InventoryError> {
        let mut conn = self.pool.acquire().await?;
        inventory::set_stock(product_name, variant, stock, &mut conn).await?;
        Ok(())
    }

    pub async fn fetch_stock(&self, product_name: &str, variant: ProductVariant) -> Result<Option<i64>, InventoryError> {
        let mut conn = self.pool.acquire().await?;
        let stock = inventory::fetch_stock(product_name, variant, &mut conn).await?;
        Ok(stock)
    }

    pub async fn count_orders_for_session(&self, session_id: &SessionId) -> Result<i64, ReconciliationDbError> {
        let mut conn = self.pool.acquire().await?;
        let count = orders::count_orders_for_session(session_id, &mut conn).await?;
        Ok(count)
    }
}

impl OrderReconciliation for SqliteDatabase {
    async fn fetch_or_create_customer(&self, customer: NewCustomer) -> Result<Customer, ReconciliationDbError> {
        let mut conn = self.pool.acquire().await?;
        let email = customer.email.clone();
        customers::fetch_or_create_customer(customer, &mut conn)
            .await?
            .ok_or(ReconciliationDbError::CustomerNotCreated(email))
    }

    async fn upsert_checkout_session(
        &self,
        update: CheckoutSessionUpdate,
    ) -> Result<CheckoutSession, ReconciliationDbError> {
        let mut conn = self.pool.acquire().await?;
        let session = checkout_sessions::upsert_checkout_session(update, &mut conn).await?;
        trace!("🗃️ Checkout session {} is now {}", session.session_id, session.status);
        Ok(session)
    }

    async fn insert_order(&self, order: NewOrder) -> Result<InsertOrderResult, ReconciliationDbError> {
        let mut conn = self.pool.acquire().await?;
        orders::idempotent_insert(order, &mut conn).await
    }

    async fn insert_order_items(
        &self,
        order_id: i64,
        items: &[NewOrderItem],
    ) -> Result<Vec<OrderItem>, ReconciliationDbError> {
        let mut tx = self.pool.begin().await?;
        let items = order_items::insert_order_items(order_id, items, &mut tx).await.map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                ReconciliationDbError::OrderNotFound(order_id)
            },
            e => e.into(),
        })?;
        tx.commit().await?;
        debug!("🗃️ {} items saved for order #{order_id}", items.len());
        Ok(items)
    }

    async fn expire_checkout_session(&self, session_id: &SessionId) -> Result<bool, ReconciliationDbError> {
        let mut conn = self.pool.acquire().await?;
        let updated = checkout_sessions::expire_checkout_session(session_id, &mut conn).await?;
        Ok(updated)
    }

    async fn fail_checkout_session(
        &self,
        payment_intent: &str,
        reason: &str,
    ) -> Result<Option<CheckoutSession>, ReconciliationDbError> {
        let mut conn = self.pool.acquire().await?;
        let session = checkout_sessions::fail_checkout_session(payment_intent, reason, &mut conn).await?;
        Ok(session)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order_by_session_id(&self, session_id: &SessionId) -> Result<Option<Order>, ReconciliationDbError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_session_id(session_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_by_order_number(
        &self,
        order_number: &OrderNumber,
    ) -> Result<Option<Order>, ReconciliationDbError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_order_number(order_number, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, ReconciliationDbError> {
        let mut conn = self.pool.acquire().await?;
        let items = order_items::fetch_items_for_order(order_id, &mut conn).await?;
        Ok(items)
    }

    async fn fetch_checkout_session(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<CheckoutSession>, ReconciliationDbError> {
        let mut conn = self.pool.acquire().await?;
        let session = checkout_sessions::fetch_checkout_session(session_id, &mut conn).await?;
        Ok(session)
    }
}

impl SecretStore for SqliteDatabase {
    async fn fetch_secret(&self, name: &str) -> Result<Option<Secret<String>>, ReconciliationDbError> {
        let mut conn = self.pool.acquire().await?;
        let value = secrets::fetch_secret(name, &mut conn).await?;
        Ok(value.map(Secret::new))
    }
}

impl InventoryManagement for SqliteDatabase {
    async fn decrement_stock(&self, adjustment: &StockAdjustment) -> Result<bool, InventoryError> {
        let mut tx = self.pool.begin().await?;
        let complete = inventory::decrement_stock(adjustment, &mut tx).await?;
        tx.commit().await?;
        Ok(complete)
    }
}
