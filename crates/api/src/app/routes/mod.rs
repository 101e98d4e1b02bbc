use axum::{Router, routing::get};

pub mod auth;
pub mod kardex;
pub mod products;
pub mod purchases;
pub mod sales;
pub mod suppliers;
pub mod system;

/// Router for all authenticated endpoints (mounted under `/api`).
pub fn router() -> Router {
    Router::new()
        .route("/auth/me", get(auth::me))
        .route("/kardex", get(kardex::list_entries))
        .nest("/products", products::router())
        .nest("/suppliers", suppliers::router())
        .nest("/purchases", purchases::router())
        .nest("/sales", sales::router())
}
