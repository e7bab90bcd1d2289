use log::{trace, warn};
use sqlx::SqliteConnection;

use crate::db_types::{ProductVariant, StockAdjustment};

pub async fn fetch_stock(
    product_name: &str,
    variant: ProductVariant,
    conn: &mut SqliteConnection,
) -> Result<Option<i64>, sqlx::Error> {
    let stock = sqlx::query_scalar("SELECT stock FROM inventory WHERE product_name = $1 AND variant = $2")
        .bind(product_name)
        .bind(variant)
        .fetch_optional(conn)
        .await?;
    Ok(stock)
}

pub async fn set_stock(
    product_name: &str,
    variant: ProductVariant,
    stock: i64,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            INSERT INTO inventory (product_name, variant, stock) VALUES ($1, $2, $3)
            ON CONFLICT (product_name, variant) DO UPDATE SET stock = excluded.stock, updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(product_name)
    .bind(variant)
    .bind(stock.max(0))
    .execute(conn)
    .await?;
    Ok(())
}

/// Takes `adjustment.quantity` units out of stock, clamping the level at zero.
///
/// Returns `false` if the product is not tracked, or if the stock on hand was less than the quantity requested.
/// Call this inside a transaction so that the read and the write see the same stock level.
pub async fn decrement_stock(adjustment: &StockAdjustment, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let StockAdjustment { product_name, variant, quantity } = adjustment;
    let Some(stock) = fetch_stock(product_name, *variant, conn).await? else {
        warn!("🗃️ {product_name} ({variant}) is not tracked in the inventory. Stock was not adjusted.");
        return Ok(false);
    };
    let remaining = (stock - quantity).max(0);
    sqlx::query(
        r#"
            UPDATE inventory SET stock = $3, updated_at = CURRENT_TIMESTAMP
            WHERE product_name = $1 AND variant = $2
        "#,
    )
    .bind(product_name)
    .bind(variant)
    .bind(remaining)
    .execute(conn)
    .await?;
    trace!("🗃️ Stock for {product_name} ({variant}) went from {stock} to {remaining}");
    if stock < *quantity {
        warn!("🗃️ Only {stock} units of {product_name} ({variant}) were in stock, but {quantity} were ordered.");
    }
    Ok(stock >= *quantity)
}
