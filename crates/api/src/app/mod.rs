//! HTTP application wiring (axum router + service wiring).
//!
//! - `services.rs`: backend selection and one CRUD service per resource
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request DTOs, query parameters and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{
    http::{header, Method},
    routing::get,
    Extension, Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};

use letmebuy_auth::Hs256JwtValidator;
use letmebuy_infra::Repositories;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router over the given repositories.
pub fn build_app(jwt_secret: impl AsRef<[u8]>, repositories: Repositories) -> Router {
    let jwt = Arc::new(Hs256JwtValidator::new(jwt_secret));
    let auth_state = middleware::AuthState { jwt };

    let services = Arc::new(services::AppServices::new(repositories));

    // Bearer tokens are optional here; each handler applies the route policy.
    let resources = routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(resources)
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::request_span))
                .layer(cors_layer()),
        )
}

/// Browser clients from any origin, with credentials; the origin is echoed back.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::PATCH])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}
