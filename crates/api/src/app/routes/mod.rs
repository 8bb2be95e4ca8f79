use axum::Router;

pub mod clientes;
pub mod system;

/// Router for the ledger endpoints.
pub fn router() -> Router {
    Router::new().nest("/clientes", clientes::router())
}
