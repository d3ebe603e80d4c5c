//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store adapters, services, background worker
//! - `routes/`: HTTP routes + handlers (one file per domain area)
//! - `dto.rs`: request DTOs
//! - `errors.rs`: consistent error responses
//! - `extract.rs`: JSON body extractor using those error responses

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;

use shopfront_infra::{AppConfig, WorkerHandle};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod extract;
pub mod routes;
pub mod services;

pub use services::StartupError;

/// A ready-to-serve router plus the background worker it depends on.
pub struct App {
    pub router: Router,
    pub notifications: WorkerHandle,
}

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
///
/// Every route sits behind the single access gate; the gate decides per
/// request which tier applies.
pub async fn build_app(config: &AppConfig) -> Result<App, StartupError> {
    let (services, notifications) = services::build_services(config).await?;

    let auth_state = middleware::AuthState {
        tokens: services.tokens.clone(),
        session: services.session,
    };

    let router = routes::router()
        .layer(Extension(Arc::new(services)))
        .layer(
            ServiceBuilder::new().layer(axum::middleware::from_fn_with_state(auth_state, middleware::auth_middleware)),
        );

    Ok(App { router, notifications })
}
