//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: storage selection and authority bootstrap
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use rinha_infra::BalanceAuthority;
use rinha_infra::store::LedgerStore;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// The authority as shared by every handler, over whichever store was configured.
pub type SharedAuthority = Arc<BalanceAuthority<Arc<dyn LedgerStore>>>;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(authority: SharedAuthority) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(Extension(authority)),
        )
}
