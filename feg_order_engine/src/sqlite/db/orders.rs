use log::{debug, trace, warn};
use sqlx::{types::Json, SqliteConnection};

use crate::{
    db_types::{NewOrder, Order, OrderNumber, SessionId},
    helpers::generate_order_number,
    traits::{InsertOrderResult, ReconciliationDbError},
};

/// Inserts the order unless one already exists for the same session id, in which case the stored order is returned.
///
/// The check and the insert are a single statement (`ON CONFLICT DO NOTHING ... RETURNING`), so two concurrent
/// deliveries of the same session cannot both end up on the `Inserted` branch.
///
/// The checkout may declare its own order number. If another session already holds that number, the order is stored
/// under a freshly generated one instead.
pub async fn idempotent_insert(
    mut order: NewOrder,
    conn: &mut SqliteConnection,
) -> Result<InsertOrderResult, ReconciliationDbError> {
    let session_id = order.session_id.clone();
    let inserted = match insert_order(order.clone(), conn).await {
        Err(e) if is_order_number_conflict(&e) => {
            let replacement = generate_order_number();
            warn!(
                "🗃️ Order number {} is already taken. Storing the order for session {session_id} as {replacement}",
                order.order_number
            );
            order.order_number = replacement;
            insert_order(order, conn).await?
        },
        result => result?,
    };
    match inserted {
        Some(order) => {
            debug!("🗃️ Order [{}] inserted with id {} for session {session_id}", order.order_number, order.id);
            Ok(InsertOrderResult::Inserted(order))
        },
        None => {
            let existing = fetch_order_by_session_id(&session_id, conn).await?.ok_or_else(|| {
                ReconciliationDbError::DatabaseError(format!(
                    "Order insert for session {session_id} was skipped, but no order exists for it"
                ))
            })?;
            debug!("🗃️ Order [{}] already exists for session {session_id}", existing.order_number);
            Ok(InsertOrderResult::AlreadyExists(existing))
        },
    }
}

fn is_order_number_conflict(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => db.is_unique_violation() && db.message().contains("orders.order_number"),
        _ => false,
    }
}

/// Returns `None` when an order for the session already exists.
async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let billing = order.billing_address().clone();
    let order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_number,
                session_id,
                customer_id,
                customer_email,
                customer_name,
                customer_phone,
                payment_status,
                payment_intent,
                subtotal,
                tax,
                shipping,
                discount,
                total,
                currency,
                shipping_address,
                billing_address,
                metadata,
                test_mode
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            ON CONFLICT (session_id) DO NOTHING
            RETURNING *;
        "#,
    )
    .bind(order.order_number)
    .bind(order.session_id)
    .bind(order.customer_id)
    .bind(order.customer_email)
    .bind(order.customer_name)
    .bind(order.customer_phone)
    .bind(order.payment_status)
    .bind(order.payment_intent)
    .bind(order.subtotal)
    .bind(order.tax)
    .bind(order.shipping)
    .bind(order.discount)
    .bind(order.total)
    .bind(order.currency)
    .bind(Json(order.shipping_address))
    .bind(Json(billing))
    .bind(Json(order.metadata))
    .bind(order.test_mode)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

pub async fn fetch_order_by_session_id(
    session_id: &SessionId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    trace!("🗃️ Fetching order for session {session_id}");
    let order = sqlx::query_as("SELECT * FROM orders WHERE session_id = $1")
        .bind(session_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

pub async fn fetch_order_by_order_number(
    order_number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE order_number = $1")
        .bind(order_number.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

pub async fn count_orders_for_session(session_id: &SessionId, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE session_id = $1")
        .bind(session_id.as_str())
        .fetch_one(conn)
        .await?;
    Ok(count)
}
