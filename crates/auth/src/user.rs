//! User account record used by the login flow.

use serde::Serialize;

use stockbook_core::{DomainError, DomainResult, UserId};

use crate::{Principal, Role, hash_password};

/// A user account. The password is only ever held as an argon2 PHC hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

/// Public projection of a user, safe to return to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub role: Role,
}

impl User {
    /// Create a new account, hashing `password`.
    pub fn register(username: &str, password: &str, role: Role) -> DomainResult<Self> {
        let username = username.trim();
        if username.is_empty() {
            return Err(DomainError::validation("username cannot be empty"));
        }
        if password.is_empty() {
            return Err(DomainError::validation("password cannot be empty"));
        }
        let password_hash =
            hash_password(password).map_err(|e| DomainError::validation(e.to_string()))?;
        Ok(Self {
            id: UserId::new(),
            username: username.to_string(),
            password_hash,
            role,
        })
    }

    pub fn principal(&self) -> Principal {
        Principal {
            user_id: self.id,
            username: self.username.clone(),
            role: self.role,
        }
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            role: self.role,
        }
    }
}

impl From<&Principal> for UserProfile {
    fn from(p: &Principal) -> Self {
        Self {
            id: p.user_id,
            username: p.username.clone(),
            role: p.role,
        }
    }
}
