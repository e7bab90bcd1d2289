use sqlx::SqliteConnection;

pub async fn fetch_secret(key: &str, conn: &mut SqliteConnection) -> Result<Option<String>, sqlx::Error> {
    let value = sqlx::query_scalar("SELECT value FROM secrets WHERE key = $1").bind(key).fetch_optional(conn).await?;
    Ok(value)
}

pub async fn store_secret(key: &str, value: &str, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            INSERT INTO secrets (key, value) VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(key)
    .bind(value)
    .execute(conn)
    .await?;
    Ok(())
}
