//! Store construction: Postgres pool + migrations, or the in-memory store.

use std::sync::Arc;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::config::ServiceConfig;
use crate::store::{InMemoryStore, InventoryStore, PgStore, StoreError, StoreResult};

pub async fn connect(url: &str, max_connections: u32) -> StoreResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(url)
        .await
        .map_err(|source| StoreError::Database {
            operation: "connect",
            source,
        })
}

pub async fn run_migrations(pool: &PgPool) -> StoreResult<()> {
    sqlx::migrate!("../../migrations/postgres").run(pool).await?;
    Ok(())
}

/// Open the store the configuration asks for.
pub async fn open_store(config: &ServiceConfig) -> StoreResult<Arc<dyn InventoryStore>> {
    match &config.database_url {
        Some(url) => {
            let pool = connect(url, config.db_max_connections).await?;
            run_migrations(&pool).await?;
            info!(max_connections = config.db_max_connections, "using postgres store");
            Ok(Arc::new(PgStore::new(pool)))
        }
        None => {
            info!("DATABASE_URL not set, using in-memory store");
            Ok(Arc::new(InMemoryStore::new()))
        }
    }
}
