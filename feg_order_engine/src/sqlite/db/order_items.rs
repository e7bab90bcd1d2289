use log::trace;
use sqlx::SqliteConnection;

use crate::db_types::{NewOrderItem, OrderItem};

/// Inserts the items for an order. This is not atomic on its own; call it with `&mut *tx` to store all items or none.
pub async fn insert_order_items(
    order_id: i64,
    items: &[NewOrderItem],
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderItem>, sqlx::Error> {
    let mut result = Vec::with_capacity(items.len());
    for item in items {
        let row: OrderItem = sqlx::query_as(
            r#"
                INSERT INTO order_items (order_id, product_id, product_name, variant, quantity, unit_price, total_price)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *;
            "#,
        )
        .bind(order_id)
        .bind(&item.product_id)
        .bind(&item.product_name)
        .bind(item.variant)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.line_total())
        .fetch_one(&mut *conn)
        .await?;
        result.push(row);
    }
    trace!("🗃️ {} items inserted for order #{order_id}", result.len());
    Ok(result)
}

pub async fn fetch_items_for_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}
