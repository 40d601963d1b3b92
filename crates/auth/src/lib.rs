//! `letmebuy-auth` — pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod actor;
pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod password;
pub mod policy;
pub mod roles;
pub mod user;

pub use actor::Actor;
pub use authorize::{authorize, Decision};
pub use claims::{validate_claims, JwtClaims, TokenValidationError};
pub use jwt::{Hs256JwtValidator, JwtValidator, TokenError};
pub use password::{hash_password, verify_password, PasswordError};
pub use policy::{check_access, required_access, Access, AccessError, Operation};
pub use roles::{Role, RoleSet};
pub use user::{NewUser, User, UserFilter, UserUpdate};
