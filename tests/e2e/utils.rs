use sqlx::Connection;

/// Connection string for the e2e database, if one is configured.
///
/// The suite is a no-op without it, so `cargo test` stays green on
/// machines with no PostgreSQL around.
pub(crate) fn postgres_url() -> Option<String> {
    let var_name =
        std::env::var("POSTGRES_PROVIDER").unwrap_or_else(|_| "POSTGRES_URL".to_string());
    std::env::var(var_name).ok()
}

pub(crate) async fn drop_schema(url: &str, schema: &str) -> Result<(), sqlx::Error> {
    let mut conn = sqlx::PgConnection::connect(url).await?;
    let r = sqlx::raw_sql(&format!("DROP SCHEMA IF EXISTS {} CASCADE", schema))
        .execute(&mut conn)
        .await;
    conn.close().await?;
    Ok(r.map(|_| ())?)
}
