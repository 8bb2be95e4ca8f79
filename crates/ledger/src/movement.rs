use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rinha_core::{AccountId, DomainError, DomainResult, Entity, EntryId, ValueObject};

/// Maximum length of a movement description, in Unicode code points.
pub const MAX_DESCRIPTION_CHARS: usize = 10;

/// Direction of a movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementKind {
    #[serde(rename = "c")]
    Credito,
    #[serde(rename = "d")]
    Debito,
}

impl MovementKind {
    /// Parse the wire code (`"c"` / `"d"`). Anything else is a validation failure.
    pub fn from_code(code: &str) -> DomainResult<Self> {
        match code {
            "c" => Ok(MovementKind::Credito),
            "d" => Ok(MovementKind::Debito),
            other => Err(DomainError::validation(format!(
                "tipo must be \"c\" or \"d\", got {other:?}"
            ))),
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            MovementKind::Credito => "c",
            MovementKind::Debito => "d",
        }
    }
}

impl core::fmt::Display for MovementKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

/// Strictly positive amount in centavos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    pub fn new(value: i64) -> DomainResult<Self> {
        if value <= 0 {
            return Err(DomainError::validation("valor must be a positive integer"));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl ValueObject for Amount {}

/// Movement description: 1 to 10 Unicode code points.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Description(String);

impl Description {
    pub fn new(value: impl Into<String>) -> DomainResult<Self> {
        let value = value.into();
        let chars = value.chars().count();
        if chars == 0 || chars > MAX_DESCRIPTION_CHARS {
            return Err(DomainError::validation(format!(
                "descricao must have between 1 and {MAX_DESCRIPTION_CHARS} characters, got {chars}"
            )));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl ValueObject for Description {}

/// A validated credit/debit request against one account.
///
/// Building one is the `Received -> Validated` step: it is pure and never
/// touches storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementRequest {
    pub account_id: AccountId,
    pub amount: Amount,
    pub kind: MovementKind,
    pub description: Description,
}

impl MovementRequest {
    pub fn new(
        account_id: AccountId,
        amount: Amount,
        kind: MovementKind,
        description: Description,
    ) -> Self {
        Self {
            account_id,
            amount,
            kind,
            description,
        }
    }

    /// Validate raw field values into a request.
    ///
    /// Fields are checked in wire order (`valor`, `tipo`, `descricao`); the first
    /// failure wins.
    pub fn parse(account_id: AccountId, valor: i64, tipo: &str, descricao: &str) -> DomainResult<Self> {
        let amount = Amount::new(valor)?;
        let kind = MovementKind::from_code(tipo)?;
        let description = Description::new(descricao)?;
        Ok(Self::new(account_id, amount, kind, description))
    }

    /// Movement to append once the request has been admitted.
    pub fn to_entry(&self, criado_em: DateTime<Utc>) -> NewMovement {
        NewMovement {
            account_id: self.account_id,
            valor: self.amount,
            tipo: self.kind,
            descricao: self.description.clone(),
            criado_em,
        }
    }
}

/// A movement ready to be appended (no entry id assigned yet).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMovement {
    pub account_id: AccountId,
    pub valor: Amount,
    pub tipo: MovementKind,
    pub descricao: Description,
    pub criado_em: DateTime<Utc>,
}

impl NewMovement {
    /// Attach the entry id assigned by the store.
    pub fn into_stored(self, id: EntryId) -> Movement {
        Movement {
            id,
            account_id: self.account_id,
            valor: self.valor.get(),
            tipo: self.tipo,
            descricao: self.descricao.into_inner(),
            criado_em: self.criado_em,
        }
    }
}

/// One immutable, committed ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub id: EntryId,
    pub account_id: AccountId,
    /// Positive amount in centavos.
    pub valor: i64,
    pub tipo: MovementKind,
    pub descricao: String,
    pub criado_em: DateTime<Utc>,
}

impl Movement {
    /// Effect of this movement on the balance (`+valor` / `-valor`).
    pub fn signed_value(&self) -> i64 {
        match self.tipo {
            MovementKind::Credito => self.valor,
            MovementKind::Debito => -self.valor,
        }
    }
}

impl Entity for Movement {
    type Id = EntryId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> AccountId {
        AccountId::new(1)
    }

    #[test]
    fn valor_boundaries() {
        assert!(matches!(Amount::new(0), Err(DomainError::Validation(_))));
        assert!(matches!(Amount::new(-5), Err(DomainError::Validation(_))));
        assert_eq!(Amount::new(1).unwrap().get(), 1);
    }

    #[test]
    fn descricao_boundaries_count_code_points() {
        assert!(Description::new("").is_err());
        assert!(Description::new("0123456789").is_ok());
        assert!(Description::new("0123456789a").is_err());
        // 10 multi-byte code points still fit.
        assert!(Description::new("çãéíóúâêôà").is_ok());
    }

    #[test]
    fn tipo_accepts_only_c_and_d() {
        assert_eq!(MovementKind::from_code("c").unwrap(), MovementKind::Credito);
        assert_eq!(MovementKind::from_code("d").unwrap(), MovementKind::Debito);
        for bad in ["", "C", "x", "cd"] {
            assert!(MovementKind::from_code(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn parse_reports_first_invalid_field() {
        let err = MovementRequest::parse(account(), 0, "x", "").unwrap_err();
        match err {
            DomainError::Validation(msg) => assert!(msg.contains("valor")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn kind_serializes_as_wire_code() {
        assert_eq!(serde_json::to_string(&MovementKind::Debito).unwrap(), "\"d\"");
    }

    #[test]
    fn stored_movement_keeps_request_fields() {
        let req = MovementRequest::parse(account(), 250, "d", "pix").unwrap();
        let now = Utc::now();
        let stored = req.to_entry(now).into_stored(EntryId::new(7));
        assert_eq!(stored.valor, 250);
        assert_eq!(stored.signed_value(), -250);
        assert_eq!(stored.descricao, "pix");
        assert_eq!(stored.criado_em, now);
    }
}
