//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store, bus and pipeline wiring
//! - `routes/`: HTTP routes + handlers (one file per dashboard area)
//! - `dto.rs`: request/response DTOs
//! - `envelope.rs` / `errors.rs`: the `{ok, data | error}` response shape
//! - `extract.rs`: extractors that fail into the envelope

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use crate::config::ApiConfig;
use crate::middleware;

pub mod dto;
pub mod envelope;
pub mod errors;
pub mod extract;
pub mod routes;
pub mod services;

pub use services::ServicesError;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: &ApiConfig) -> Result<Router, ServicesError> {
    let jwt = Arc::new(neurocore_auth::Hs256JwtValidator::new(config.jwt_secret.clone().into_bytes()));
    let auth_state = middleware::AuthState { jwt };

    let services = Arc::new(services::build_services(config).await?);

    // Protected routes: require auth + tenant context.
    let protected = routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(auth_state, middleware::auth_middleware));

    Ok(Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
        .layer(ServiceBuilder::new()))
}
