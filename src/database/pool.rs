use crate::config::get_config;
use crate::error::Result;
use sqlx::{postgres::PgPoolOptions, PgPool};

pub async fn create_pool() -> Result<PgPool> {
    let config = get_config();
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(config.storage_timeout())
        .connect(&config.database_url)
        .await?;
    Ok(pool)
}

/// Pool that connects on first use; routes that never touch storage work without a database.
pub fn create_lazy_pool(database_url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect_lazy(database_url)?;
    Ok(pool)
}
