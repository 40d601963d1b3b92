use serde::Serialize;

use letmebuy_core::UserId;

use crate::claims::JwtClaims;
use crate::{Role, RoleSet};

/// Authenticated caller of an operation.
///
/// Resolved once per request from validated token claims and passed explicitly
/// into every core operation; never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Actor {
    id: UserId,
    roles: RoleSet,
}

impl Actor {
    pub fn new(id: UserId, roles: RoleSet) -> Self {
        Self { id, roles }
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn roles(&self) -> &RoleSet {
        &self.roles
    }

    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.has_role(role)
    }

    pub fn is_admin(&self) -> bool {
        self.roles.is_admin()
    }
}

impl From<&JwtClaims> for Actor {
    fn from(claims: &JwtClaims) -> Self {
        Self {
            id: claims.sub,
            roles: claims.roles.iter().cloned().collect(),
        }
    }
}
