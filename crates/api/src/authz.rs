//! API-side authorization guard.
//!
//! Handlers call [`require`] before touching any service, so a refused
//! request never reaches the store.

use axum::{http::StatusCode, response::Response};
use tracing::warn;

use stockbook_auth::{Capability, authorize};

use crate::app::errors::json_error;
use crate::context::PrincipalContext;

/// Check that the caller holds `capability`; otherwise a ready 403 response.
pub fn require(principal: &PrincipalContext, capability: Capability) -> Result<(), Response> {
    authorize(principal.principal(), capability).map_err(|e| {
        warn!(username = principal.username(), %capability, "forbidden");
        json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use stockbook_auth::{Principal, Role};
    use stockbook_core::UserId;

    use super::*;

    fn ctx(role: Role) -> PrincipalContext {
        PrincipalContext::new(Principal {
            user_id: UserId::new(),
            username: "someone".to_string(),
            role,
        })
    }

    #[test]
    fn secretaria_cannot_manage_catalog() {
        let response = require(&ctx(Role::Secretaria), Capability::ManageCatalog).unwrap_err();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn both_roles_record_transactions() {
        assert!(require(&ctx(Role::Secretaria), Capability::RecordTransactions).is_ok());
        assert!(require(&ctx(Role::Admin), Capability::RecordTransactions).is_ok());
        assert!(require(&ctx(Role::Admin), Capability::ManageCatalog).is_ok());
    }
}
