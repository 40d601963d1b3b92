use letmebuy_core::ResourceRef;

use crate::Actor;

/// Result of a per-record access decision.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }
}

/// Self-or-admin rule for records owned by an actor.
///
/// - No IO
/// - No panics
/// - Deny when unauthenticated, or when a non-admin targets someone else's record.
pub fn authorize(actor: Option<&Actor>, target: ResourceRef) -> Decision {
    let Some(actor) = actor else {
        return Decision::Deny;
    };

    if actor.is_admin() || ResourceRef::from(actor.id()) == target {
        Decision::Allow
    } else {
        Decision::Deny
    }
}
