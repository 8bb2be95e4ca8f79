//! Postgres-backed entry log (`transacoes` table).
//!
//! Both functions run on a caller-supplied connection, normally the
//! transaction of an open account unit, so appends commit or roll back
//! together with the balance update.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, Row};
use tracing::instrument;

use rinha_core::{AccountId, EntryId};
use rinha_ledger::{Movement, MovementKind, NewMovement};

use crate::error::StoreError;
use crate::store::postgres::map_sqlx_error;

/// Insert one movement and return its id.
///
/// `criado_em` is taken from the database clock, raised to the account's
/// newest entry if that clock is behind. Run inside a unit holding the
/// account row lock, this keeps the per-account timestamps non-decreasing
/// across instances whose clocks disagree. `entry.criado_em` is not stored.
#[instrument(
    skip(conn, entry),
    fields(account_id = %entry.account_id, tipo = %entry.tipo, valor = entry.valor.get()),
    err
)]
pub async fn append(conn: &mut PgConnection, entry: &NewMovement) -> Result<EntryId, StoreError> {
    let row = sqlx::query(
        r#"
        INSERT INTO transacoes (cliente_id, valor, tipo, descricao, criado_em)
        VALUES (
            $1, $2, $3, $4,
            GREATEST(
                clock_timestamp(),
                (SELECT MAX(criado_em) FROM transacoes WHERE cliente_id = $1)
            )
        )
        RETURNING id
        "#,
    )
    .bind(entry.account_id.get())
    .bind(entry.valor.get())
    .bind(entry.tipo.code())
    .bind(entry.descricao.as_str())
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("append_entry", e))?;

    let id: i64 = row
        .try_get("id")
        .map_err(|e| StoreError::Storage(format!("failed to read entry id: {e}")))?;
    Ok(EntryId::new(id))
}

/// At most `n` movements of `account_id`, newest first.
#[instrument(skip(conn), fields(account_id = %account_id), err)]
pub async fn last_n(
    conn: &mut PgConnection,
    account_id: AccountId,
    n: usize,
) -> Result<Vec<Movement>, StoreError> {
    let limit = i64::try_from(n).unwrap_or(i64::MAX);

    let rows = sqlx::query(
        r#"
        SELECT id, cliente_id, valor, tipo, descricao, criado_em
        FROM transacoes
        WHERE cliente_id = $1
        ORDER BY criado_em DESC, id DESC
        LIMIT $2
        "#,
    )
    .bind(account_id.get())
    .bind(limit)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("last_entries", e))?;

    rows.into_iter().map(movement_from_row).collect()
}

fn movement_from_row(row: sqlx::postgres::PgRow) -> Result<Movement, StoreError> {
    let read = |e: sqlx::Error| StoreError::Storage(format!("failed to read entry row: {e}"));

    let id: i64 = row.try_get("id").map_err(read)?;
    let account_id: i32 = row.try_get("cliente_id").map_err(read)?;
    let valor: i64 = row.try_get("valor").map_err(read)?;
    let tipo: String = row.try_get("tipo").map_err(read)?;
    let descricao: String = row.try_get("descricao").map_err(read)?;
    let criado_em: DateTime<Utc> = row.try_get("criado_em").map_err(read)?;

    let tipo = MovementKind::from_code(tipo.trim())
        .map_err(|e| StoreError::Storage(format!("entry {id}: {e}")))?;

    Ok(Movement {
        id: EntryId::new(id),
        account_id: AccountId::new(account_id),
        valor,
        tipo,
        descricao,
        criado_em,
    })
}
