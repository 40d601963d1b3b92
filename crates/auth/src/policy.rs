//! Route-level access table.
//!
//! A fixed mapping from (operation, resource kind) to the access an endpoint
//! family requires. Evaluated by the HTTP layer before any CRUD call; the
//! per-record self-or-admin rule lives in [`crate::authorize`].

use thiserror::Error;

use letmebuy_core::ResourceKind;

use crate::{Actor, Role};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Operation {
    Read,
    List,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Read => "read",
            Operation::List => "list",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }

    pub fn is_write(&self) -> bool {
        matches!(self, Operation::Create | Operation::Update | Operation::Delete)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    AnyRole(&'static [Role]),
}

const STAFF: &[Role] = &[Role::OPERATOR, Role::ADMIN];
const ADMIN_ONLY: &[Role] = &[Role::ADMIN];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("forbidden: {operation} on {kind} requires one of {required:?}")]
    Forbidden {
        operation: &'static str,
        kind: ResourceKind,
        required: Vec<String>,
    },
}

/// Access required for an operation on a kind of resource.
pub fn required_access(operation: Operation, kind: ResourceKind) -> Access {
    use ResourceKind::*;

    match (kind, operation) {
        // Users: listing and management are admin-only; single-record reads and
        // updates are open to any authenticated actor and then narrowed by the
        // self-or-admin rule.
        (User, Operation::Read | Operation::Update) => Access::Authenticated,
        (User, _) => Access::AnyRole(ADMIN_ONLY),

        (Order | Payment, Operation::Read | Operation::List) => Access::Authenticated,
        (Product | Category | Feedback | Costumer | Address, Operation::Read | Operation::List) => {
            Access::Public
        }

        (_, _) => Access::AnyRole(STAFF),
    }
}

/// Check an (optional) actor against the route table.
pub fn check_access(
    actor: Option<&Actor>,
    operation: Operation,
    kind: ResourceKind,
) -> Result<(), AccessError> {
    match required_access(operation, kind) {
        Access::Public => Ok(()),
        Access::Authenticated => actor.map(|_| ()).ok_or(AccessError::Unauthenticated),
        Access::AnyRole(roles) => {
            let actor = actor.ok_or(AccessError::Unauthenticated)?;
            if actor.roles().has_any(roles) {
                Ok(())
            } else {
                Err(AccessError::Forbidden {
                    operation: operation.as_str(),
                    kind,
                    required: roles.iter().map(|r| r.as_str().to_string()).collect(),
                })
            }
        }
    }
}
