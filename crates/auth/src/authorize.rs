use thiserror::Error;

use stockbook_core::UserId;

use crate::{Capability, Role};

/// A fully resolved principal for authorization decisions.
///
/// Built from verified token claims by whatever transport is in use; the
/// authorization check itself never touches storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("role {role} lacks capability '{capability}'")]
    Forbidden { role: Role, capability: Capability },
}

/// Capabilities granted to a role.
pub fn capabilities_for(role: Role) -> &'static [Capability] {
    match role {
        Role::Admin => &[
            Capability::ReadCatalog,
            Capability::ManageCatalog,
            Capability::RecordTransactions,
            Capability::ReadLedger,
        ],
        Role::Secretaria => &[
            Capability::ReadCatalog,
            Capability::RecordTransactions,
            Capability::ReadLedger,
        ],
    }
}

/// Check that `principal` may exercise `required`.
///
/// - No IO
/// - No panics
/// - Called before any mutation is attempted
pub fn authorize(principal: &Principal, required: Capability) -> Result<(), AuthzError> {
    if capabilities_for(principal.role).contains(&required) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden {
            role: principal.role,
            capability: required,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: Role) -> Principal {
        Principal {
            user_id: UserId::new(),
            username: "someone".to_string(),
            role,
        }
    }

    #[test]
    fn admin_holds_every_capability() {
        let admin = principal(Role::Admin);
        for cap in [
            Capability::ReadCatalog,
            Capability::ManageCatalog,
            Capability::RecordTransactions,
            Capability::ReadLedger,
        ] {
            assert!(authorize(&admin, cap).is_ok(), "admin denied {cap}");
        }
    }

    #[test]
    fn secretaria_cannot_manage_catalog() {
        let staff = principal(Role::Secretaria);
        assert!(authorize(&staff, Capability::ReadCatalog).is_ok());
        assert!(authorize(&staff, Capability::RecordTransactions).is_ok());
        assert!(authorize(&staff, Capability::ReadLedger).is_ok());

        let err = authorize(&staff, Capability::ManageCatalog).unwrap_err();
        assert_eq!(
            err.to_string(),
            "role SECRETARIA lacks capability 'catalog.manage'"
        );
    }
}
