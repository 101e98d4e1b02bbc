//! Process configuration, read from the environment.

use anyhow::{Context, Result};
use chrono::Duration;

pub const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_JWT_TTL_MINUTES: i64 = 480;
const DEV_JWT_SECRET: &str = "stockbook-dev-secret-change-me";

#[derive(Clone)]
pub struct ServiceConfig {
    pub http_addr: String,
    /// Postgres when set, in-memory otherwise.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_ttl: Duration,
    /// `(username, password)` of an ADMIN to create if absent.
    pub bootstrap_admin: Option<(String, String)>,
    /// True when `JWT_SECRET` was not provided.
    pub using_dev_secret: bool,
}

impl core::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("http_addr", &self.http_addr)
            .field("database", &self.database_url.as_ref().map(|_| "postgres"))
            .field("db_max_connections", &self.db_max_connections)
            .field("jwt_ttl", &self.jwt_ttl)
            .field(
                "bootstrap_admin",
                &self.bootstrap_admin.as_ref().map(|(user, _)| user),
            )
            .finish_non_exhaustive()
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let http_addr = get("HTTP_ADDR").unwrap_or_else(|| DEFAULT_HTTP_ADDR.to_string());
        let database_url = get("DATABASE_URL");
        let db_max_connections = get("DB_MAX_CONNECTIONS")
            .map(|v| v.parse::<u32>())
            .transpose()
            .context("DB_MAX_CONNECTIONS must be a positive integer")?
            .unwrap_or(DEFAULT_MAX_CONNECTIONS);
        let ttl_minutes = get("JWT_TTL_MINUTES")
            .map(|v| v.parse::<i64>())
            .transpose()
            .context("JWT_TTL_MINUTES must be an integer")?
            .unwrap_or(DEFAULT_JWT_TTL_MINUTES);
        if ttl_minutes <= 0 {
            anyhow::bail!("JWT_TTL_MINUTES must be positive (got {ttl_minutes})");
        }

        let (jwt_secret, using_dev_secret) = match get("JWT_SECRET") {
            Some(secret) => (secret, false),
            None => (DEV_JWT_SECRET.to_string(), true),
        };

        let bootstrap_admin = match (get("BOOTSTRAP_ADMIN_USERNAME"), get("BOOTSTRAP_ADMIN_PASSWORD")) {
            (Some(user), Some(password)) => Some((user, password)),
            (None, None) => None,
            _ => anyhow::bail!(
                "BOOTSTRAP_ADMIN_USERNAME and BOOTSTRAP_ADMIN_PASSWORD must be set together"
            ),
        };

        Ok(Self {
            http_addr,
            database_url,
            db_max_connections,
            jwt_secret,
            jwt_ttl: Duration::minutes(ttl_minutes),
            bootstrap_admin,
            using_dev_secret,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<ServiceConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_to_in_memory_dev_setup() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.http_addr, DEFAULT_HTTP_ADDR);
        assert_eq!(cfg.database_url, None);
        assert_eq!(cfg.db_max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(cfg.jwt_ttl, Duration::minutes(DEFAULT_JWT_TTL_MINUTES));
        assert!(cfg.using_dev_secret);
        assert!(cfg.bootstrap_admin.is_none());
    }

    #[test]
    fn reads_overrides() {
        let cfg = config(&[
            ("HTTP_ADDR", "127.0.0.1:8080"),
            ("DATABASE_URL", "postgres://localhost/stockbook"),
            ("DB_MAX_CONNECTIONS", "4"),
            ("JWT_SECRET", "s3cret"),
            ("JWT_TTL_MINUTES", "15"),
            ("BOOTSTRAP_ADMIN_USERNAME", "root"),
            ("BOOTSTRAP_ADMIN_PASSWORD", "hunter2"),
        ])
        .unwrap();
        assert_eq!(cfg.http_addr, "127.0.0.1:8080");
        assert_eq!(cfg.database_url.as_deref(), Some("postgres://localhost/stockbook"));
        assert_eq!(cfg.db_max_connections, 4);
        assert_eq!(cfg.jwt_secret, "s3cret");
        assert!(!cfg.using_dev_secret);
        assert_eq!(cfg.jwt_ttl, Duration::minutes(15));
        assert_eq!(cfg.bootstrap_admin, Some(("root".to_string(), "hunter2".to_string())));
        assert!(!format!("{cfg:?}").contains("hunter2"));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(config(&[("DB_MAX_CONNECTIONS", "many")]).is_err());
        assert!(config(&[("JWT_TTL_MINUTES", "0")]).is_err());
        assert!(config(&[("BOOTSTRAP_ADMIN_USERNAME", "root")]).is_err());
    }
}
