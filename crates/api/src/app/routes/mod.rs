use axum::{routing::get, Router};

pub mod addresses;
pub mod categories;
pub mod common;
pub mod costumers;
pub mod feedbacks;
pub mod orders;
pub mod payments;
pub mod products;
pub mod system;
pub mod users;

/// Router for every resource; each handler applies the route policy itself.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/users", users::router())
        .nest("/categories", categories::router())
        .nest("/products", products::router())
        .nest("/feedbacks", feedbacks::router())
        .nest("/costumers", costumers::router())
        .nest("/addresses", addresses::router())
        .nest("/orders", orders::router())
        .nest("/payments", payments::router())
}
