//! Entity trait: identity + continuity across state changes.

use core::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::id::Identifier;

/// Kind of record an operation targets.
///
/// Used by the route-level policy table and for log/diagnostic labels.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    User,
    Category,
    Product,
    Feedback,
    Costumer,
    Address,
    Order,
    Payment,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 8] = [
        ResourceKind::User,
        ResourceKind::Category,
        ResourceKind::Product,
        ResourceKind::Feedback,
        ResourceKind::Costumer,
        ResourceKind::Address,
        ResourceKind::Order,
        ResourceKind::Payment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::User => "user",
            ResourceKind::Category => "category",
            ResourceKind::Product => "product",
            ResourceKind::Feedback => "feedback",
            ResourceKind::Costumer => "costumer",
            ResourceKind::Address => "address",
            ResourceKind::Order => "order",
            ResourceKind::Payment => "payment",
        }
    }

    /// Records of this kind are owned by the actor whose id equals the record id.
    ///
    /// Reads and updates of such records go through the self-or-admin rule.
    pub fn is_actor_scoped(&self) -> bool {
        matches!(self, ResourceKind::User)
    }
}

impl core::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entity marker + minimal interface.
///
/// A freshly built entity has no id; the persistence gateway assigns one on
/// first save.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Strongly-typed entity identifier.
    type Id: Identifier;

    /// Criteria accepted by paged queries. `Default` means "no filtering".
    type Filter: Default + Clone + core::fmt::Debug + Send + Sync;

    const KIND: ResourceKind;

    /// Fields a page request may sort on.
    const SORTABLE: &'static [&'static str];

    /// Returns the entity identifier, if one has been assigned.
    fn id(&self) -> Option<Self::Id>;

    fn assign_id(&mut self, id: Self::Id);

    /// In-process evaluation of a filter (used by non-SQL gateways).
    fn matches(&self, filter: &Self::Filter) -> bool;

    /// Compare two records on a sortable field; `None` for unknown fields.
    fn compare_by(&self, other: &Self, field: &str) -> Option<Ordering>;
}

/// Validated input that builds a new (unsaved) entity.
pub trait NewEntity<E: Entity> {
    fn into_entity(self) -> E;
}

/// Validated input that overwrites fields of an existing entity, keeping its identity.
pub trait EntityPatch<E: Entity> {
    fn apply_to(self, entity: &mut E);
}
