//! Service wiring: one CRUD service per resource over the chosen backend.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing::info;

use letmebuy_auth::User;
use letmebuy_catalog::{Category, Feedback, Product};
use letmebuy_customers::{Address, Costumer};
use letmebuy_infra::{CrudService, GatewayError, Repositories, Repository};
use letmebuy_sales::{Order, Payment};

use crate::config::ApiConfig;

const MAX_DB_CONNECTIONS: u32 = 10;

pub type Crud<E> = CrudService<E, Arc<dyn Repository<E>>>;

pub struct AppServices {
    pub users: Crud<User>,
    pub categories: Crud<Category>,
    pub products: Crud<Product>,
    pub feedbacks: Crud<Feedback>,
    pub costumers: Crud<Costumer>,
    pub addresses: Crud<Address>,
    pub orders: Crud<Order>,
    pub payments: Crud<Payment>,
}

impl AppServices {
    pub fn new(repos: Repositories) -> Self {
        Self {
            users: CrudService::new(repos.users),
            categories: CrudService::new(repos.categories),
            products: CrudService::new(repos.products),
            feedbacks: CrudService::new(repos.feedbacks),
            costumers: CrudService::new(repos.costumers),
            addresses: CrudService::new(repos.addresses),
            orders: CrudService::new(repos.orders),
            payments: CrudService::new(repos.payments),
        }
    }
}

/// Postgres when `DATABASE_URL` is configured, in-process tables otherwise.
pub async fn connect(config: &ApiConfig) -> Result<Repositories, GatewayError> {
    let Some(database_url) = config.database_url.as_deref() else {
        return Ok(Repositories::in_memory());
    };

    let pool = PgPoolOptions::new()
        .max_connections(MAX_DB_CONNECTIONS)
        .connect(database_url)
        .await
        .map_err(|e| GatewayError::backend(format!("failed to connect to Postgres: {e}")))?;
    info!(max_connections = MAX_DB_CONNECTIONS, "connected to Postgres");

    Repositories::postgres(pool).await
}
