//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store and numbering service construction
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: query parameters and JSON mapping helpers
//! - `errors.rs`: the `{success, data | message}` envelope and error mapping

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs` and the black-box tests).
pub fn build_app(services: Arc<AppServices>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
