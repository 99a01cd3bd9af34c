//! Database pool construction.
//!
//! Production reads from Postgres; tests and local runs use SQLite. Both go
//! through sqlx's `Any` driver so the repository issues one set of queries.

use std::time::Duration;

use sqlx::any::{install_default_drivers, AnyPoolOptions};
use sqlx::AnyPool;

/// Default number of pooled connections.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

const TRAFFIC_DATA_SCHEMA: &str = "CREATE TABLE IF NOT EXISTS traffic_data (
    time_bin TEXT NOT NULL,
    direction INTEGER NOT NULL,
    volume INTEGER NOT NULL,
    location TEXT NOT NULL
)";

/// Open a pool with the default connection limit.
pub async fn create_pool(database_url: &str) -> Result<AnyPool, sqlx::Error> {
    create_pool_with(database_url, DEFAULT_MAX_CONNECTIONS).await
}

/// Open a pool for `database_url`.
///
/// SQLite databases get the `traffic_data` table created on first use. An
/// in-memory SQLite database lives only as long as its connection, so it is
/// pinned to a single connection that is never recycled.
pub async fn create_pool_with(
    database_url: &str,
    max_connections: u32,
) -> Result<AnyPool, sqlx::Error> {
    install_default_drivers();

    let in_memory = database_url.contains(":memory:");
    let options = if in_memory {
        AnyPoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        AnyPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
    };

    let pool = options.connect(database_url).await?;

    if database_url.starts_with("sqlite:") {
        sqlx::query(TRAFFIC_DATA_SCHEMA).execute(&pool).await?;
    }

    Ok(pool)
}
