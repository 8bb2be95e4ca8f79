use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use rinha_ledger::{Balance, Movement, Statement};

// -------------------------
// Request DTOs
// -------------------------

/// Body of `POST /clientes/:id/transacoes`.
///
/// Fields stay loosely typed here so every shape problem surfaces as the same
/// validation error once the account id has been resolved.
#[derive(Debug, Deserialize)]
pub struct MovementRequestBody {
    #[serde(default)]
    pub valor: serde_json::Value,
    pub tipo: Option<String>,
    pub descricao: Option<String>,
}

/// Accept a JSON integer or a string of decimal digits.
///
/// Range checks (`valor > 0`) belong to the domain; this only rejects values
/// that are not whole numbers at all.
pub fn parse_valor(value: &serde_json::Value) -> Result<i64, String> {
    match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| format!("valor must be an integer, got {n}")),
        serde_json::Value::String(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => s
            .parse::<i64>()
            .map_err(|_| format!("valor out of range: {s}")),
        serde_json::Value::Null => Err("valor is required".to_string()),
        other => Err(format!("valor must be an integer, got {other}")),
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub limite: i64,
    pub saldo: i64,
}

impl From<Balance> for BalanceResponse {
    fn from(b: Balance) -> Self {
        Self {
            limite: b.limite,
            saldo: b.saldo,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatementResponse {
    pub saldo: StatementBalance,
    pub ultimas_transacoes: Vec<MovementResponse>,
}

#[derive(Debug, Serialize)]
pub struct StatementBalance {
    pub total: i64,
    pub data_extrato: String,
    pub limite: i64,
}

#[derive(Debug, Serialize)]
pub struct MovementResponse {
    pub valor: i64,
    pub tipo: &'static str,
    pub descricao: String,
    pub realizada_em: String,
}

impl From<Movement> for MovementResponse {
    fn from(m: Movement) -> Self {
        Self {
            valor: m.valor,
            tipo: m.tipo.code(),
            realizada_em: rfc3339_nanos(m.criado_em),
            descricao: m.descricao,
        }
    }
}

impl From<Statement> for StatementResponse {
    fn from(s: Statement) -> Self {
        Self {
            saldo: StatementBalance {
                total: s.balance.saldo,
                data_extrato: rfc3339_nanos(s.queried_at),
                limite: s.balance.limite,
            },
            ultimas_transacoes: s.last_movements.into_iter().map(Into::into).collect(),
        }
    }
}

pub fn rfc3339_nanos(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}
