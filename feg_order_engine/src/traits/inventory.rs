use thiserror::Error;

use crate::db_types::StockAdjustment;

#[derive(Debug, Clone, Error)]
pub enum InventoryError {
    #[error("Could not adjust the stock for {0}: {1}")]
    AdjustmentFailed(String, String),
    #[error("Inventory store error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for InventoryError {
    fn from(e: sqlx::Error) -> Self {
        InventoryError::DatabaseError(e.to_string())
    }
}

/// Stock bookkeeping. Failures here are never fatal to order reconciliation.
#[allow(async_fn_in_trait)]
pub trait InventoryManagement {
    /// Reduces the available stock of a product by `adjustment.quantity`.
    ///
    /// Returns `true` if the full quantity was taken from stock, and `false` for a partial success (the product is
    /// not tracked, or there was less stock available than requested and the level was clamped at zero).
    async fn decrement_stock(&self, adjustment: &StockAdjustment) -> Result<bool, InventoryError>;
}
