//! `letmebuy-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod outcome;
pub mod page;
pub mod validate;

pub use entity::{Entity, EntityPatch, NewEntity, ResourceKind};
pub use error::{DomainError, DomainResult};
pub use id::{
    AddressId, CategoryId, CostumerId, FeedbackId, Identifier, OrderId, PaymentId, ProductId,
    ResourceRef, UserId,
};
pub use outcome::Outcome;
pub use page::{Direction, Page, PageRequest, Sort};
pub use validate::Validate;
