use thiserror::Error;

use stockbook_auth::{AuthzError, PasswordError, TokenError};
use stockbook_core::DomainError;

use crate::store::StoreError;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Everything an application service can fail with.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

/// A duplicate row is a conflict the caller can act on; everything else
/// stays a storage failure.
impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Duplicate(what) => {
                ServiceError::Domain(DomainError::conflict(format!("already exists: {what}")))
            }
            other => ServiceError::Store(other),
        }
    }
}

impl From<AuthzError> for ServiceError {
    fn from(value: AuthzError) -> Self {
        ServiceError::Domain(DomainError::forbidden(value.to_string()))
    }
}

impl ServiceError {
    /// The domain error inside, if this is one.
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            ServiceError::Domain(err) => Some(err),
            _ => None,
        }
    }
}
