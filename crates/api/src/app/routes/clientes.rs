use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use rinha_core::AccountId;

use crate::app::{SharedAuthority, dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/:id/transacoes", post(create_movement))
        .route("/:id/extrato", get(get_statement))
}

/// Path ids that do not parse or are not provisioned are both "not found".
fn resolve_account(authority: &SharedAuthority, raw: &str) -> Option<AccountId> {
    raw.parse::<AccountId>()
        .ok()
        .filter(|id| authority.is_provisioned(*id))
}

pub async fn create_movement(
    Extension(authority): Extension<SharedAuthority>,
    Path(raw_id): Path<String>,
    body: Result<Json<dto::MovementRequestBody>, JsonRejection>,
) -> axum::response::Response {
    let Some(account_id) = resolve_account(&authority, &raw_id) else {
        return errors::not_found();
    };

    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::validation_error(rejection.body_text()),
    };

    let valor = match dto::parse_valor(&body.valor) {
        Ok(v) => v,
        Err(msg) => return errors::validation_error(msg),
    };
    let tipo = body.tipo.as_deref().unwrap_or_default();
    let descricao = body.descricao.as_deref().unwrap_or_default();

    match authority.apply_movement(account_id, valor, tipo, descricao).await {
        Ok(balance) => (StatusCode::OK, Json(dto::BalanceResponse::from(balance))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn get_statement(
    Extension(authority): Extension<SharedAuthority>,
    Path(raw_id): Path<String>,
) -> axum::response::Response {
    let Some(account_id) = resolve_account(&authority, &raw_id) else {
        return errors::not_found();
    };

    match authority.statement(account_id).await {
        Ok(statement) => (StatusCode::OK, Json(dto::StatementResponse::from(statement))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}
