//! Initial user accounts.

use tracing::info;

use stockbook_auth::{Role, User};

use crate::config::ServiceConfig;
use crate::error::ServiceResult;
use crate::store::InventoryStore;

/// Demo accounts seeded into a fresh in-memory store.
pub const DEMO_USERS: &[(&str, &str, Role)] = &[
    ("admin", "admin123", Role::Admin),
    ("secretaria", "secret123", Role::Secretaria),
];

/// Create the user unless the username already exists. Returns whether it was created.
pub async fn ensure_user(
    store: &dyn InventoryStore,
    username: &str,
    password: &str,
    role: Role,
) -> ServiceResult<bool> {
    if store.user_by_username(username.trim()).await?.is_some() {
        return Ok(false);
    }
    let user = User::register(username, password, role)?;
    store.insert_user(&user).await?;
    info!(username = %user.username, role = %user.role, "user created");
    Ok(true)
}

/// Bootstrap admin if configured; otherwise demo users on the in-memory store.
pub async fn seed_users(store: &dyn InventoryStore, config: &ServiceConfig) -> ServiceResult<()> {
    if let Some((username, password)) = &config.bootstrap_admin {
        ensure_user(store, username, password, Role::Admin).await?;
    } else if config.database_url.is_none() {
        for (username, password, role) in DEMO_USERS {
            ensure_user(store, username, password, *role).await?;
        }
    }
    Ok(())
}
