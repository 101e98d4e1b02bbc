use std::sync::Arc;

use anyhow::Context;

use stockbook_auth::Hs256Jwt;
use stockbook_infra::{ServiceConfig, db, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stockbook_observability::init();

    let config = ServiceConfig::from_env()?;
    if config.using_dev_secret {
        tracing::warn!("JWT_SECRET not set; using insecure dev default");
    }
    tracing::debug!(?config, "configuration loaded");

    let store = db::open_store(&config).await.context("failed to open store")?;
    seed::seed_users(store.as_ref(), &config)
        .await
        .context("failed to seed users")?;

    let jwt = Arc::new(Hs256Jwt::new(config.jwt_secret.as_bytes(), config.jwt_ttl));
    let app = stockbook_api::app::build_app(store, jwt);

    let listener = tokio::net::TcpListener::bind(&config.http_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.http_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
