//! Infrastructure layer: persistence gateways and CRUD orchestration.

pub mod crud;
pub mod repositories;
pub mod repository;

pub use crud::CrudService;
pub use repositories::Repositories;
pub use repository::{GatewayError, InMemoryRepository, PgEntity, PgRepository, Repository};
