use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{Customer, NewCustomer};

pub async fn fetch_customer_by_email(email: &str, conn: &mut SqliteConnection) -> Result<Option<Customer>, sqlx::Error> {
    let customer =
        sqlx::query_as("SELECT * FROM customers WHERE email = $1").bind(email).fetch_optional(conn).await?;
    Ok(customer)
}

/// Looks the customer up by email first, and only inserts a new record if none exists. If another request creates
/// the same customer in the meantime, that record is returned.
pub async fn fetch_or_create_customer(
    customer: NewCustomer,
    conn: &mut SqliteConnection,
) -> Result<Option<Customer>, sqlx::Error> {
    if let Some(existing) = fetch_customer_by_email(&customer.email, conn).await? {
        return Ok(Some(existing));
    }
    let inserted: Option<Customer> = sqlx::query_as(
        r#"
            INSERT INTO customers (email, first_name, last_name, phone) VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO NOTHING
            RETURNING *;
        "#,
    )
    .bind(&customer.email)
    .bind(&customer.first_name)
    .bind(&customer.last_name)
    .bind(&customer.phone)
    .fetch_optional(&mut *conn)
    .await?;
    match inserted {
        Some(c) => {
            debug!("🗃️ New customer #{} created for {}", c.id, c.email);
            Ok(Some(c))
        },
        None => fetch_customer_by_email(&customer.email, conn).await,
    }
}
