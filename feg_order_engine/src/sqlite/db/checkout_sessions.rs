use sqlx::{types::Json, SqliteConnection};

use crate::db_types::{CheckoutSession, CheckoutSessionUpdate, SessionId};

pub async fn upsert_checkout_session(
    update: CheckoutSessionUpdate,
    conn: &mut SqliteConnection,
) -> Result<CheckoutSession, sqlx::Error> {
    let session = sqlx::query_as(
        r#"
            INSERT INTO checkout_sessions (
                session_id,
                customer_email,
                amount_total,
                currency,
                payment_intent,
                metadata,
                status,
                payment_status,
                test_mode
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (session_id) DO UPDATE SET
                customer_email = excluded.customer_email,
                amount_total = excluded.amount_total,
                currency = excluded.currency,
                payment_intent = COALESCE(excluded.payment_intent, checkout_sessions.payment_intent),
                metadata = excluded.metadata,
                status = excluded.status,
                payment_status = excluded.payment_status,
                test_mode = excluded.test_mode,
                updated_at = CURRENT_TIMESTAMP
            RETURNING *;
        "#,
    )
    .bind(update.session_id)
    .bind(update.customer_email)
    .bind(update.amount_total)
    .bind(update.currency)
    .bind(update.payment_intent)
    .bind(Json(update.metadata))
    .bind(update.status)
    .bind(update.payment_status)
    .bind(update.test_mode)
    .fetch_one(conn)
    .await?;
    Ok(session)
}

/// Marks an open session as expired. Completed sessions are left alone. Returns true if a row was changed.
pub async fn expire_checkout_session(session_id: &SessionId, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
            UPDATE checkout_sessions SET status = 'expired', updated_at = CURRENT_TIMESTAMP
            WHERE session_id = $1 AND status != 'complete'
        "#,
    )
    .bind(session_id.as_str())
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn fail_checkout_session(
    payment_intent: &str,
    reason: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<CheckoutSession>, sqlx::Error> {
    let session = sqlx::query_as(
        r#"
            UPDATE checkout_sessions SET
                status = 'failed',
                payment_status = 'failed',
                failure_reason = $2,
                updated_at = CURRENT_TIMESTAMP
            WHERE payment_intent = $1 AND status != 'complete'
            RETURNING *;
        "#,
    )
    .bind(payment_intent)
    .bind(reason)
    .fetch_optional(conn)
    .await?;
    Ok(session)
}

pub async fn fetch_checkout_session(
    session_id: &SessionId,
    conn: &mut SqliteConnection,
) -> Result<Option<CheckoutSession>, sqlx::Error> {
    let session = sqlx::query_as("SELECT * FROM checkout_sessions WHERE session_id = $1")
        .bind(session_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(session)
}
