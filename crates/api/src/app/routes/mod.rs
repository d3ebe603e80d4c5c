use axum::{Router, routing::get};

pub mod admin;
pub mod auth;
pub mod contact;
pub mod notifications;
pub mod orders;
pub mod payments;
pub mod products;
pub mod system;
pub mod wishlist;

/// Router for every endpoint. Access tiers are enforced by the gate, not here.
pub fn router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/whoami", get(system::whoami))
        .route("/moods", get(products::moods))
        .nest("/auth", auth::router())
        .nest("/products", products::router())
        .nest("/payments", payments::router())
        .nest("/orders", orders::router())
        .nest("/wishlist", wishlist::router())
        .nest("/notifications", notifications::router())
        .nest("/contact", contact::router())
        .nest("/admin", admin::router())
}
