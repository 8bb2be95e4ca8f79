use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use rinha_infra::LedgerError;

/// Map an authority outcome to its user-visible status.
///
/// Validation and limit failures are distinct 422s; anything that is not a
/// business outcome collapses to 500.
pub fn ledger_error_to_response(err: LedgerError) -> axum::response::Response {
    match err {
        LedgerError::Validation(msg) => validation_error(msg),
        LedgerError::NotFound => not_found(),
        LedgerError::LimitExceeded { limite, saldo } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            axum::Json(json!({
                "error": "limit_exceeded",
                "message": "transaction would exceed the account limit",
                "limite": limite,
                "saldo": saldo,
            })),
        )
            .into_response(),
        other => {
            tracing::error!(error = %other, "ledger operation failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", other.to_string())
        }
    }
}

pub fn validation_error(message: impl Into<String>) -> axum::response::Response {
    json_error(StatusCode::UNPROCESSABLE_ENTITY, "validation_error", message)
}

pub fn not_found() -> axum::response::Response {
    json_error(StatusCode::NOT_FOUND, "not_found", "account not found")
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn statuses_follow_the_error_kind() {
        let cases = [
            (LedgerError::Validation("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (LedgerError::NotFound, StatusCode::NOT_FOUND),
            (
                LedgerError::LimitExceeded { limite: 1, saldo: 0 },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (LedgerError::Conflict("40001".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (LedgerError::Unavailable("pool closed".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (LedgerError::Storage("io".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (
                LedgerError::Timeout(Duration::from_millis(1)),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (LedgerError::Overloaded, StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(ledger_error_to_response(err).status(), status);
        }
    }
}
