//! Login: credential check and token issuance.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::OnceCell;
use tracing::{instrument, warn};

use stockbook_auth::{IssuedToken, TokenIssuer, UserProfile, hash_password, verify_password};
use stockbook_core::DomainError;

use crate::error::ServiceResult;
use crate::store::InventoryStore;

/// Verified against when the username is unknown, so both failures cost one argon2 run.
static DUMMY_HASH: OnceCell<String> = OnceCell::const_new();

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub token: IssuedToken,
    pub user: UserProfile,
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn InventoryStore>,
    tokens: Arc<dyn TokenIssuer>,
}

impl AuthService {
    pub fn new(store: Arc<dyn InventoryStore>, tokens: Arc<dyn TokenIssuer>) -> Self {
        Self { store, tokens }
    }

    /// Unknown user and wrong password fail identically.
    #[instrument(skip(self, password), err)]
    pub async fn login(&self, username: &str, password: &str) -> ServiceResult<LoginOutcome> {
        let user = self.store.user_by_username(username.trim()).await?;
        let verified = match &user {
            Some(user) => verify_password(password, &user.password_hash)?,
            None => {
                let dummy = DUMMY_HASH
                    .get_or_try_init(|| async { hash_password("stockbook-unknown-user") })
                    .await?;
                verify_password(password, dummy)?;
                false
            }
        };
        let Some(user) = user.filter(|_| verified) else {
            warn!(username, "login failed");
            return Err(DomainError::unauthorized("invalid credentials").into());
        };

        let token = self.tokens.issue(&user.principal(), Utc::now())?;
        Ok(LoginOutcome {
            token,
            user: user.profile(),
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use stockbook_auth::{Hs256Jwt, JwtValidator, Role, User};

    use super::*;
    use crate::store::InMemoryStore;

    async fn service() -> (AuthService, Arc<Hs256Jwt>) {
        let store = Arc::new(InMemoryStore::new());
        let user = User::register("admin", "admin123", Role::Admin).unwrap();
        store.insert_user(&user).await.unwrap();
        let jwt = Arc::new(Hs256Jwt::new(b"test-secret", Duration::minutes(30)));
        (AuthService::new(store, jwt.clone()), jwt)
    }

    #[tokio::test]
    async fn valid_credentials_yield_a_verifiable_token() {
        let (auth, jwt) = service().await;
        let outcome = auth.login("admin", "admin123").await.unwrap();
        assert_eq!(outcome.user.username, "admin");
        assert_eq!(outcome.user.role, Role::Admin);

        let claims = jwt.validate(&outcome.token.token, Utc::now()).unwrap();
        assert_eq!(claims.username, "admin");
        assert_eq!(claims.role, Role::Admin);
    }

    #[tokio::test]
    async fn bad_password_and_unknown_user_are_unauthorized() {
        let (auth, _) = service().await;
        for (user, pw) in [("admin", "wrong"), ("nobody", "admin123")] {
            let err = auth.login(user, pw).await.unwrap_err();
            assert!(matches!(err.as_domain(), Some(DomainError::Unauthorized(_))));
        }
    }

    #[tokio::test]
    async fn unknown_user_still_pays_for_a_hash_check() {
        let (auth, _) = service().await;
        let err = auth.login("ghost", "admin123").await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::Unauthorized(_))));
        let dummy = DUMMY_HASH.get().expect("dummy hash is built on first unknown login");
        assert!(!verify_password("admin123", dummy).unwrap());
    }
}
