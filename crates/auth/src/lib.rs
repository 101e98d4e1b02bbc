//! `stockbook-auth`: pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod password;
pub mod permissions;
pub mod roles;
pub mod user;

pub use authorize::{AuthzError, Principal, authorize, capabilities_for};
pub use claims::{AccessClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256Jwt, IssuedToken, JwtValidator, TokenError, TokenIssuer};
pub use password::{PasswordError, hash_password, verify_password};
pub use permissions::Capability;
pub use roles::Role;
pub use user::{User, UserProfile};
