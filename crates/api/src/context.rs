use stockbook_auth::Principal;

/// Principal context for a request (authenticated identity + role).
///
/// Inserted by the auth middleware; present on every protected route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
}

impl PrincipalContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn username(&self) -> &str {
        &self.principal.username
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }
}
