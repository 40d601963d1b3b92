//! Persistence gateway: key-based storage per entity kind.
//!
//! Absence and integrity problems are tagged results ([`GatewayError::NotFound`],
//! [`GatewayError::IntegrityViolation`]); anything else is a fatal
//! [`GatewayError::Backend`] that callers propagate unchanged.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use letmebuy_core::{Entity, Page, PageRequest};

pub mod in_memory;
pub mod postgres;
pub mod rows;
pub mod schema;

pub use in_memory::InMemoryRepository;
pub use postgres::{PgEntity, PgRepository};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The addressed row does not exist (delete of a missing id, or update of a row that vanished).
    #[error("record not found")]
    NotFound,

    /// A uniqueness or referential constraint rejected the write.
    #[error("integrity violation: {0}")]
    IntegrityViolation(String),

    /// Storage failure; not recoverable by the caller.
    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl GatewayError {
    pub fn integrity(msg: impl Into<String>) -> Self {
        Self::IntegrityViolation(msg.into())
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// Storage of one entity kind.
#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    async fn find_by_id(&self, id: E::Id) -> Result<Option<E>, GatewayError>;

    /// Insert when the entity has no id yet; otherwise overwrite the existing row.
    ///
    /// Overwriting a row that no longer exists is `NotFound`, never an insert.
    async fn save(&self, entity: E) -> Result<E, GatewayError>;

    async fn delete_by_id(&self, id: E::Id) -> Result<(), GatewayError>;

    async fn query(&self, page: &PageRequest, filter: &E::Filter) -> Result<Page<E>, GatewayError>;
}

#[async_trait]
impl<E, R> Repository<E> for Arc<R>
where
    E: Entity,
    R: Repository<E> + ?Sized,
{
    async fn find_by_id(&self, id: E::Id) -> Result<Option<E>, GatewayError> {
        (**self).find_by_id(id).await
    }

    async fn save(&self, entity: E) -> Result<E, GatewayError> {
        (**self).save(entity).await
    }

    async fn delete_by_id(&self, id: E::Id) -> Result<(), GatewayError> {
        (**self).delete_by_id(id).await
    }

    async fn query(&self, page: &PageRequest, filter: &E::Filter) -> Result<Page<E>, GatewayError> {
        (**self).query(page, filter).await
    }
}
