//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: the application services every handler shares
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{
    Extension, Router,
    routing::{get, post},
};
use tower::ServiceBuilder;

use stockbook_auth::Hs256Jwt;
use stockbook_infra::InventoryStore;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs` and the black-box tests).
pub fn build_app(store: Arc<dyn InventoryStore>, jwt: Arc<Hs256Jwt>) -> Router {
    let auth_state = middleware::AuthState { jwt: jwt.clone() };
    let services = Arc::new(services::build_services(store, jwt));

    // Protected routes: require a valid bearer token.
    let protected = routes::router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    Router::new()
        .route("/", get(routes::system::info))
        .route("/health", get(routes::system::health))
        .route("/api/auth/login", post(routes::auth::login))
        .nest("/api", protected)
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
